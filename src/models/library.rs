//! Library (tenant) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A physical library; every member, book and booking belongs to one
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Library {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    /// Number of reading-room seats; bookable seats are numbered from 1
    pub total_seats: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create library request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLibrary {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub address: Option<String>,
    #[validate(range(min = 0, max = 10000, message = "Seat count must be between 0 and 10000"))]
    pub total_seats: i32,
}

/// Update library request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLibrary {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = 0, max = 10000, message = "Seat count must be between 0 and 10000"))]
    pub total_seats: Option<i32>,
    pub is_active: Option<bool>,
}
