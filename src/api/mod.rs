//! API handlers for the Bibliodesk REST endpoints

pub mod auth;
pub mod bookings;
pub mod books;
pub mod dashboard;
pub mod health;
pub mod libraries;
pub mod maintenance;
pub mod openapi;
pub mod payments;
pub mod plans;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    RequestPartsExt, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for the authenticated user: a valid JWT for an active account
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing or malformed bearer token".to_string()))?;

        let claims = state.services.auth.authenticate(bearer.token()).await?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Envelope for responses that carry only a message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/users/:id/membership",
            get(users::get_membership).put(users::assign_membership),
        )
        // Libraries
        .route("/libraries", get(libraries::list_libraries).post(libraries::create_library))
        .route(
            "/libraries/:id",
            get(libraries::get_library)
                .put(libraries::update_library)
                .delete(libraries::delete_library),
        )
        // Membership plans
        .route("/plans", get(plans::list_plans).post(plans::create_plan))
        .route(
            "/plans/:id",
            get(plans::get_plan).put(plans::update_plan).delete(plans::delete_plan),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Seat bookings
        .route("/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/bookings/:id/complete", post(bookings::complete_booking))
        // Maintenance
        .route("/maintenance", get(maintenance::list_tasks).post(maintenance::create_task))
        .route(
            "/maintenance/:id",
            get(maintenance::get_task)
                .put(maintenance::update_task)
                .delete(maintenance::delete_task),
        )
        // Payments
        .route("/payments", get(payments::list_payments).post(payments::create_payment))
        .route("/payments/summary", get(payments::payment_summary))
        .route("/payments/:id", get(payments::get_payment))
        .route("/payments/:id/status", put(payments::update_payment_status))
        // Stats
        .route("/stats/dashboard", get(dashboard::get_dashboard))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
