//! Seat bookings service: reservation rules and the booking lifecycle

use chrono::Utc;

use super::ensure_visible;
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{BookingAllowance, BookingQuery, CreateBooking, NewBooking, SeatBooking},
        enums::{BookingStatus, Role},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
}

impl BookingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn visible_booking(&self, claims: &UserClaims, id: i32) -> AppResult<SeatBooking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        ensure_visible(claims, Some(booking.library_id), "Booking", id)?;
        if claims.role == Role::Member && booking.user_id != claims.user_id {
            return Err(AppError::Authorization(
                "Members can only manage their own bookings".to_string(),
            ));
        }
        Ok(booking)
    }

    /// Filtered, paginated bookings; members only ever see their own
    pub async fn search(&self, claims: &UserClaims, query: &BookingQuery) -> AppResult<(Vec<SeatBooking>, i64)> {
        let mut query = query.clone();
        query.library_id = claims.list_scope(query.library_id);
        if claims.role == Role::Member {
            query.user_id = Some(claims.user_id);
        }

        let bookings = self.repository.bookings.list(query.library_id).await?;
        let matching: Vec<SeatBooking> = bookings.into_iter().filter(|b| query.matches(b)).collect();
        Ok(query.page_params().apply(matching))
    }

    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<SeatBooking> {
        self.visible_booking(claims, id).await
    }

    /// Reserve a seat.
    ///
    /// Checks run cheapest first; the allowance and overlap checks happen in
    /// the store, atomically with the insert.
    pub async fn create(&self, claims: &UserClaims, data: CreateBooking) -> AppResult<SeatBooking> {
        let user_id = match (claims.role, data.user_id) {
            (Role::Member, Some(other)) if other != claims.user_id => {
                return Err(AppError::Authorization(
                    "Members can only book seats for themselves".to_string(),
                ))
            }
            (Role::Member, _) => claims.user_id,
            (_, Some(id)) => id,
            (_, None) => return Err(AppError::Validation("user_id is required".to_string())),
        };

        if data.end_time <= data.start_time {
            return Err(AppError::Validation("end_time must be after start_time".to_string()));
        }
        let today = Utc::now().date_naive();
        if data.booking_date < today {
            return Err(AppError::Validation("Cannot book a seat in the past".to_string()));
        }

        let user = self.repository.users.get_by_id(user_id).await?;
        ensure_visible(claims, user.library_id, "User with id", user_id)?;
        let library_id = user
            .library_id
            .ok_or_else(|| AppError::BusinessRule("Only library members can book seats".to_string()))?;

        let library = self.repository.libraries.get_by_id(library_id).await?;
        if data.seat_number < 1 || data.seat_number > library.total_seats {
            return Err(AppError::Validation(format!(
                "seat_number must be between 1 and {}",
                library.total_seats
            )));
        }

        let membership = user
            .membership
            .as_ref()
            .filter(|m| m.is_active_on(data.booking_date))
            .ok_or_else(|| {
                AppError::BusinessRule("No active membership covers the booking date".to_string())
            })?;
        let plan = self.repository.plans.get_by_id(membership.plan_id).await?;
        let allowance = BookingAllowance {
            max_upcoming: i64::from(plan.max_active_bookings),
            from: today,
        };

        let booking = self
            .repository
            .bookings
            .create(
                &NewBooking {
                    library_id,
                    user_id,
                    seat_number: data.seat_number,
                    booking_date: data.booking_date,
                    start_time: data.start_time,
                    end_time: data.end_time,
                },
                allowance,
            )
            .await?;
        tracing::info!(
            booking_id = booking.id,
            user_id,
            seat = booking.seat_number,
            date = %booking.booking_date,
            "Seat booked"
        );
        Ok(booking)
    }

    pub async fn cancel(&self, claims: &UserClaims, id: i32) -> AppResult<SeatBooking> {
        let booking = self.visible_booking(claims, id).await?;
        self.change_status(booking, BookingStatus::Cancelled).await
    }

    pub async fn complete(&self, claims: &UserClaims, id: i32) -> AppResult<SeatBooking> {
        claims.require_staff()?;
        let booking = self.visible_booking(claims, id).await?;
        self.change_status(booking, BookingStatus::Completed).await
    }

    async fn change_status(&self, booking: SeatBooking, next: BookingStatus) -> AppResult<SeatBooking> {
        let refused = || {
            AppError::BusinessRule(format!(
                "Booking {} is {} and cannot become {}",
                booking.id, booking.status, next
            ))
        };
        if !booking.status.can_transition_to(next) {
            return Err(refused());
        }

        // Compare-and-set: a concurrent change leaves the row untouched
        let updated = self
            .repository
            .bookings
            .transition(booking.id, booking.status, next)
            .await?
            .ok_or_else(refused)?;
        tracing::info!(booking_id = updated.id, status = %updated.status, "Booking status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        models::{library::Library, plan::MembershipPlan, user::Membership, user::User},
        repository::MockPorts,
    };

    fn claims(role: Role, user_id: i32) -> UserClaims {
        UserClaims {
            sub: "someone@example.org".into(),
            user_id,
            role,
            library_id: Some(1),
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
        }
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn tomorrow() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(1)
    }

    fn member(id: i32, membership: Option<Membership>) -> User {
        User {
            id,
            library_id: Some(1),
            name: "Member".into(),
            email: format!("m{id}@example.org"),
            password: String::new(),
            role: Role::Member,
            phone: None,
            membership,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn active_membership() -> Membership {
        let today = Utc::now().date_naive();
        Membership {
            plan_id: 3,
            start_date: today,
            end_date: today + Duration::days(29),
        }
    }

    fn booking(id: i32, user_id: i32, status: BookingStatus) -> SeatBooking {
        SeatBooking {
            id,
            library_id: 1,
            user_id,
            seat_number: 4,
            booking_date: tomorrow(),
            start_time: t(9),
            end_time: t(12),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request() -> CreateBooking {
        CreateBooking {
            user_id: None,
            seat_number: 4,
            booking_date: tomorrow(),
            start_time: t(9),
            end_time: t(12),
        }
    }

    fn ports_for_member() -> MockPorts {
        let mut mocks = MockPorts::default();
        mocks
            .users
            .expect_get_by_id()
            .returning(|id| Ok(member(id, Some(active_membership()))));
        mocks.libraries.expect_get_by_id().returning(|id| {
            Ok(Library {
                id,
                name: "Central".into(),
                address: None,
                total_seats: 10,
                is_active: true,
                created_at: Utc::now(),
            })
        });
        mocks.plans.expect_get_by_id().returning(|id| {
            Ok(MembershipPlan {
                id,
                library_id: 1,
                name: "Basic".into(),
                description: None,
                price: Decimal::new(10, 0),
                duration_days: 30,
                max_active_bookings: 2,
                is_active: true,
                created_at: Utc::now(),
            })
        });
        mocks
    }

    #[tokio::test]
    async fn member_books_for_self() {
        let mut mocks = ports_for_member();
        mocks
            .bookings
            .expect_create()
            .withf(|b: &NewBooking, allowance: &BookingAllowance| {
                b.user_id == 5
                    && b.library_id == 1
                    && allowance.max_upcoming == 2
                    && allowance.from == Utc::now().date_naive()
            })
            .returning(|_, _| Ok(booking(1, 5, BookingStatus::Confirmed)));

        let created = BookingsService::new(mocks.into())
            .create(&claims(Role::Member, 5), request())
            .await
            .unwrap();
        assert_eq!(created.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn allowance_exhausted_is_business_rule() {
        let mut mocks = ports_for_member();
        mocks
            .bookings
            .expect_create()
            .returning(|_, allowance| Err(crate::repository::bookings::allowance_reached(allowance)));

        let err = BookingsService::new(mocks.into())
            .create(&claims(Role::Member, 5), request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn seat_outside_library_is_rejected() {
        let mut mocks = ports_for_member();
        mocks.bookings.expect_create().never();

        let err = BookingsService::new(mocks.into())
            .create(&claims(Role::Member, 5), CreateBooking { seat_number: 11, ..request() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn inverted_times_and_foreign_user_are_rejected_early() {
        let service = BookingsService::new(MockPorts::default().into());
        let inverted = CreateBooking { start_time: t(12), end_time: t(9), ..request() };
        assert!(matches!(
            service.create(&claims(Role::Member, 5), inverted).await,
            Err(AppError::Validation(_))
        ));
        let for_other = CreateBooking { user_id: Some(6), ..request() };
        assert!(matches!(
            service.create(&claims(Role::Member, 5), for_other).await,
            Err(AppError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn user_without_membership_cannot_book() {
        let mut mocks = MockPorts::default();
        mocks.users.expect_get_by_id().returning(|id| Ok(member(id, None)));
        mocks.libraries.expect_get_by_id().returning(|id| {
            Ok(Library {
                id,
                name: "Central".into(),
                address: None,
                total_seats: 10,
                is_active: true,
                created_at: Utc::now(),
            })
        });

        let err = BookingsService::new(mocks.into())
            .create(&claims(Role::Member, 5), request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn finished_booking_cannot_be_cancelled() {
        let mut mocks = MockPorts::default();
        mocks
            .bookings
            .expect_get_by_id()
            .returning(|id| Ok(booking(id, 5, BookingStatus::Completed)));
        mocks.bookings.expect_transition().never();

        let err = BookingsService::new(mocks.into())
            .cancel(&claims(Role::Member, 5), 8)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn members_cannot_complete_or_touch_others() {
        let mut mocks = MockPorts::default();
        mocks
            .bookings
            .expect_get_by_id()
            .returning(|id| Ok(booking(id, 6, BookingStatus::Confirmed)));
        let service = BookingsService::new(mocks.into());

        assert!(matches!(
            service.complete(&claims(Role::Member, 6), 8).await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            service.cancel(&claims(Role::Member, 5), 8).await,
            Err(AppError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn lost_race_is_reported_as_refused_transition() {
        let mut mocks = MockPorts::default();
        mocks
            .bookings
            .expect_get_by_id()
            .returning(|id| Ok(booking(id, 5, BookingStatus::Confirmed)));
        mocks.bookings.expect_transition().returning(|_, _, _| Ok(None));

        let err = BookingsService::new(mocks.into())
            .complete(&claims(Role::Admin, 1), 8)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }
}
