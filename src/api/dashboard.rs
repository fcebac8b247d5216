//! Dashboard statistics endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::dashboard::DashboardStats, AppState};

use super::AuthenticatedUser;

#[derive(Deserialize, ToSchema)]
pub struct DashboardQuery {
    /// Library to report on; super-admins get every library when omitted
    pub library_id: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
}

#[utoipa::path(
    get,
    path = "/stats/dashboard",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(("library_id" = Option<i32>, Query, description = "Library (super-admins only)")),
    responses(
        (status = 200, description = "Dashboard widgets", body = DashboardResponse),
        (status = 403, description = "Staff only")
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardResponse>> {
    let stats = state.services.dashboard.stats(&claims, query.library_id).await?;
    Ok(Json(DashboardResponse { success: true, stats }))
}
