//! Seat booking model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{enums::BookingStatus, search::PageParams};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SeatBooking {
    pub id: i32,
    pub library_id: i32,
    pub user_id: i32,
    pub seat_number: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeatBooking {
    /// Half-open interval overlap on the same seat and day
    pub fn overlaps(&self, seat_number: i32, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.seat_number == seat_number
            && self.booking_date == date
            && self.start_time < end
            && start < self.end_time
    }
}

/// Create booking request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBooking {
    /// Defaults to the caller; staff may book on behalf of a member
    pub user_id: Option<i32>,
    pub seat_number: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Insert payload built by the bookings service
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub library_id: i32,
    pub user_id: i32,
    pub seat_number: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Cap on a user's confirmed bookings dated on or after `from`, checked
/// together with the insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingAllowance {
    pub max_upcoming: i64,
    pub from: NaiveDate,
}

/// Booking list filter
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
    pub user_id: Option<i32>,
    pub seat_number: Option<i32>,
    pub library_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookingQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams { page: self.page, per_page: self.per_page }
    }

    pub fn matches(&self, booking: &SeatBooking) -> bool {
        self.status.map_or(true, |s| s == booking.status)
            && self.date.map_or(true, |d| d == booking.booking_date)
            && self.user_id.map_or(true, |u| u == booking.user_id)
            && self.seat_number.map_or(true, |n| n == booking.seat_number)
            && self.library_id.map_or(true, |l| l == booking.library_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn booking(seat: i32, start: NaiveTime, end: NaiveTime, status: BookingStatus) -> SeatBooking {
        SeatBooking {
            id: 1,
            library_id: 1,
            user_id: 5,
            seat_number: seat,
            booking_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            start_time: start,
            end_time: end,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn overlap_is_half_open() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let b = booking(4, t(9, 0), t(11, 0), BookingStatus::Confirmed);
        assert!(b.overlaps(4, day, t(10, 0), t(12, 0)));
        assert!(b.overlaps(4, day, t(8, 0), t(9, 30)));
        assert!(!b.overlaps(4, day, t(11, 0), t(12, 0)));
        assert!(!b.overlaps(5, day, t(10, 0), t(12, 0)));
        assert!(!b.overlaps(4, day.succ_opt().unwrap(), t(10, 0), t(12, 0)));
    }

    #[test]
    fn status_and_seat_filters() {
        let bookings = vec![
            booking(1, t(9, 0), t(10, 0), BookingStatus::Confirmed),
            booking(1, t(10, 0), t(11, 0), BookingStatus::Cancelled),
            booking(2, t(9, 0), t(10, 0), BookingStatus::Confirmed),
        ];
        let q = BookingQuery {
            status: Some(BookingStatus::Confirmed),
            seat_number: Some(1),
            ..Default::default()
        };
        assert_eq!(bookings.iter().filter(|b| q.matches(b)).count(), 1);
        assert_eq!(bookings.iter().filter(|b| BookingQuery::default().matches(b)).count(), 3);
    }
}
