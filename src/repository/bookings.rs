//! Seat bookings repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{BookingAllowance, NewBooking, SeatBooking},
        enums::BookingStatus,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<SeatBooking>>;

    async fn get_by_id(&self, id: i32) -> AppResult<SeatBooking>;

    /// Insert a confirmed booking.
    ///
    /// `Conflict` when a confirmed booking already holds the seat for an
    /// overlapping period; `BusinessRule` when the user already holds
    /// `allowance.max_upcoming` upcoming bookings. Both checks and the insert
    /// are atomic.
    async fn create(&self, booking: &NewBooking, allowance: BookingAllowance) -> AppResult<SeatBooking>;

    /// Move a booking from `from` to `to`. Returns `None` when the booking is
    /// no longer in `from`.
    async fn transition(&self, id: i32, from: BookingStatus, to: BookingStatus) -> AppResult<Option<SeatBooking>>;
}

pub(crate) fn allowance_reached(allowance: BookingAllowance) -> AppError {
    AppError::BusinessRule(format!(
        "Membership plan allows {} upcoming booking(s) at a time",
        allowance.max_upcoming
    ))
}

#[derive(Clone)]
pub struct PgBookingRepository {
    pool: Pool<Postgres>,
}

impl PgBookingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<SeatBooking>> {
        let rows = sqlx::query_as::<_, SeatBooking>(
            r#"
            SELECT * FROM seat_bookings
            WHERE ($1::INT IS NULL OR library_id = $1)
            ORDER BY booking_date DESC, start_time, seat_number
            "#,
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<SeatBooking> {
        sqlx::query_as::<_, SeatBooking>("SELECT * FROM seat_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    async fn create(&self, booking: &NewBooking, allowance: BookingAllowance) -> AppResult<SeatBooking> {
        let mut tx = self.pool.begin().await?;

        // Serialise writers for the same user, then for the same seat, until
        // commit. The single-key and two-key lock spaces are disjoint.
        sqlx::query("SELECT pg_advisory_xact_lock($1::BIGINT)")
            .bind(i64::from(booking.user_id))
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(booking.library_id)
            .bind(booking.seat_number)
            .execute(&mut *tx)
            .await?;

        let upcoming: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM seat_bookings WHERE user_id = $1 AND status = 'confirmed' AND booking_date >= $2",
        )
        .bind(booking.user_id)
        .bind(allowance.from)
        .fetch_one(&mut *tx)
        .await?;

        if upcoming >= allowance.max_upcoming {
            return Err(allowance_reached(allowance));
        }

        let overlapping: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM seat_bookings
                WHERE library_id = $1 AND seat_number = $2 AND booking_date = $3
                  AND status = 'confirmed'
                  AND start_time < $5 AND $4 < end_time
            )
            "#,
        )
        .bind(booking.library_id)
        .bind(booking.seat_number)
        .bind(booking.booking_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .fetch_one(&mut *tx)
        .await?;

        if overlapping {
            return Err(AppError::Conflict(format!(
                "Seat {} is already booked for that period",
                booking.seat_number
            )));
        }

        let row = sqlx::query_as::<_, SeatBooking>(
            r#"
            INSERT INTO seat_bookings (library_id, user_id, seat_number, booking_date, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(booking.library_id)
        .bind(booking.user_id)
        .bind(booking.seat_number)
        .bind(booking.booking_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(BookingStatus::Confirmed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn transition(&self, id: i32, from: BookingStatus, to: BookingStatus) -> AppResult<Option<SeatBooking>> {
        let row = sqlx::query_as::<_, SeatBooking>(
            r#"
            UPDATE seat_bookings SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
