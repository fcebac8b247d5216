//! Payment endpoints

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
    models::payment::{CreatePayment, Payment, PaymentQuery, PaymentSummary, UpdatePaymentStatus},
    AppState,
};

use super::AuthenticatedUser;

#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct PaymentResponse {
    pub success: bool,
    pub message: Option<String>,
    pub payment: Payment,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentsResponse {
    pub success: bool,
    pub payments: Vec<Payment>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentSummaryResponse {
    pub success: bool,
    pub summary: PaymentSummary,
}

#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "pending, completed, failed or refunded"),
        ("method" = Option<String>, Query, description = "cash, card, upi or bank_transfer"),
        ("user_id" = Option<i32>, Query, description = "Payer"),
        ("from" = Option<String>, Query, description = "First day (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Last day (YYYY-MM-DD)"),
        ("library_id" = Option<i32>, Query, description = "Library (super-admins only)"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Payments", body = PaymentsResponse)
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<PaymentsResponse>> {
    let (payments, total) = state.services.payments.search(&claims, &query).await?;
    let paging = query.page_params();
    Ok(Json(PaymentsResponse {
        success: true,
        payments,
        total,
        page: paging.page(),
        per_page: paging.per_page(),
    }))
}

/// Aggregate the payments matching the same filters as the list
#[utoipa::path(
    get,
    path = "/payments/summary",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "pending, completed, failed or refunded"),
        ("method" = Option<String>, Query, description = "cash, card, upi or bank_transfer"),
        ("user_id" = Option<i32>, Query, description = "Payer"),
        ("from" = Option<String>, Query, description = "First day (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Last day (YYYY-MM-DD)"),
        ("library_id" = Option<i32>, Query, description = "Library (super-admins only)")
    ),
    responses(
        (status = 200, description = "Payment summary", body = PaymentSummaryResponse)
    )
)]
pub async fn payment_summary(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<PaymentSummaryResponse>> {
    let summary = state.services.payments.summary(&claims, &query).await?;
    Ok(Json(PaymentSummaryResponse { success: true, summary }))
}

#[utoipa::path(
    get,
    path = "/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = state.services.payments.get_by_id(&claims, id).await?;
    Ok(Json(PaymentResponse { success: true, message: None, payment }))
}

/// Record a payment (staff)
#[utoipa::path(
    post,
    path = "/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = CreatePayment,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid amount"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreatePayment>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    let payment = state.services.payments.create(&claims, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            success: true,
            message: Some("Payment recorded".to_string()),
            payment,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/payments/{id}/status",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Payment ID")),
    request_body = UpdatePaymentStatus,
    responses(
        (status = 200, description = "Status changed", body = PaymentResponse),
        (status = 404, description = "Payment not found"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdatePaymentStatus>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = state
        .services
        .payments
        .update_status(&claims, id, data.status)
        .await?;
    Ok(Json(PaymentResponse {
        success: true,
        message: Some(format!("Payment marked {}", payment.status)),
        payment,
    }))
}
