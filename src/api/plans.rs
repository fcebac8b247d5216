//! Membership plan endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::plan::{CreatePlan, MembershipPlan, UpdatePlan},
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

#[derive(Deserialize, ToSchema)]
pub struct PlanListQuery {
    /// Library to list (super-admins only)
    pub library_id: Option<i32>,
}

#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    pub success: bool,
    pub message: Option<String>,
    pub plan: MembershipPlan,
}

#[derive(Serialize, ToSchema)]
pub struct PlansResponse {
    pub success: bool,
    pub plans: Vec<MembershipPlan>,
}

#[utoipa::path(
    get,
    path = "/plans",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("library_id" = Option<i32>, Query, description = "Library (super-admins only)")),
    responses(
        (status = 200, description = "Membership plans", body = PlansResponse)
    )
)]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PlanListQuery>,
) -> AppResult<Json<PlansResponse>> {
    let plans = state.services.plans.list(&claims, query.library_id).await?;
    Ok(Json(PlansResponse { success: true, plans }))
}

#[utoipa::path(
    get,
    path = "/plans/{id}",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Membership plan", body = PlanResponse),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PlanResponse>> {
    let plan = state.services.plans.get_by_id(&claims, id).await?;
    Ok(Json(PlanResponse { success: true, message: None, plan }))
}

#[utoipa::path(
    post,
    path = "/plans",
    tag = "plans",
    security(("bearer_auth" = [])),
    request_body = CreatePlan,
    responses(
        (status = 201, description = "Plan created", body = PlanResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreatePlan>,
) -> AppResult<(StatusCode, Json<PlanResponse>)> {
    let plan = state.services.plans.create(&claims, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlanResponse {
            success: true,
            message: Some("Plan created successfully".to_string()),
            plan,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/plans/{id}",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    request_body = UpdatePlan,
    responses(
        (status = 200, description = "Plan updated", body = PlanResponse),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn update_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdatePlan>,
) -> AppResult<Json<PlanResponse>> {
    let plan = state.services.plans.update(&claims, id, data).await?;
    Ok(Json(PlanResponse {
        success: true,
        message: Some("Plan updated successfully".to_string()),
        plan,
    }))
}

#[utoipa::path(
    delete,
    path = "/plans/{id}",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan deleted", body = MessageResponse),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Plan has subscribers")
    )
)]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.plans.delete(&claims, id).await?;
    Ok(Json(MessageResponse::new("Plan deleted successfully")))
}
