//! Membership plan model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A named tier (e.g. Basic, Premium) governing a member's booking allowance
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MembershipPlan {
    pub id: i32,
    pub library_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_days: i32,
    /// Upcoming confirmed seat bookings a subscriber may hold at once
    pub max_active_bookings: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create plan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePlan {
    /// Required when a super-admin creates the plan
    pub library_id: Option<i32>,
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 1, max = 3660, message = "Duration must be between 1 and 3660 days"))]
    pub duration_days: i32,
    #[validate(range(min = 0, max = 1000, message = "Booking allowance must be between 0 and 1000"))]
    pub max_active_bookings: i32,
}

/// Update plan request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePlan {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 1, max = 3660, message = "Duration must be between 1 and 3660 days"))]
    pub duration_days: Option<i32>,
    #[validate(range(min = 0, max = 1000, message = "Booking allowance must be between 0 and 1000"))]
    pub max_active_bookings: Option<i32>,
    pub is_active: Option<bool>,
}

/// Membership state of a user, joined with its plan at read time
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MembershipDetails {
    pub user_id: i32,
    pub plan: Option<MembershipPlan>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// True when today falls inside [start_date, end_date]
    pub is_active: bool,
    /// Days left including today; 0 once expired
    pub days_remaining: i64,
}
