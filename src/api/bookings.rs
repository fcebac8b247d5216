//! Seat booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::booking::{BookingQuery, CreateBooking, SeatBooking},
    AppState,
};

use super::AuthenticatedUser;

#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct BookingResponse {
    pub success: bool,
    pub message: Option<String>,
    pub booking: SeatBooking,
}

impl BookingResponse {
    fn new(booking: SeatBooking, message: Option<&str>) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
            booking,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BookingsResponse {
    pub success: bool,
    pub bookings: Vec<SeatBooking>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List bookings (members only see their own)
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "confirmed, cancelled or completed"),
        ("date" = Option<String>, Query, description = "Booking date (YYYY-MM-DD)"),
        ("user_id" = Option<i32>, Query, description = "Booking owner"),
        ("seat_number" = Option<i32>, Query, description = "Seat"),
        ("library_id" = Option<i32>, Query, description = "Library (super-admins only)"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Bookings", body = BookingsResponse)
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<BookingsResponse>> {
    let (bookings, total) = state.services.bookings.search(&claims, &query).await?;
    let paging = query.page_params();
    Ok(Json(BookingsResponse {
        success: true,
        bookings,
        total,
        page: paging.page(),
        per_page: paging.per_page(),
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.services.bookings.get_by_id(&claims, id).await?;
    Ok(Json(BookingResponse::new(booking, None)))
}

/// Reserve a seat
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Seat booked", body = BookingResponse),
        (status = 400, description = "Invalid seat, date or times"),
        (status = 409, description = "Seat already booked for an overlapping period"),
        (status = 422, description = "No active membership or booking allowance exhausted")
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    let booking = state.services.bookings.create(&claims, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new(booking, Some("Seat booked successfully"))),
    ))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Booking is no longer confirmed")
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.services.bookings.cancel(&claims, id).await?;
    Ok(Json(BookingResponse::new(booking, Some("Booking cancelled"))))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/complete",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking completed", body = BookingResponse),
        (status = 403, description = "Staff only"),
        (status = 422, description = "Booking is no longer confirmed")
    )
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.services.bookings.complete(&claims, id).await?;
    Ok(Json(BookingResponse::new(booking, Some("Booking completed"))))
}
