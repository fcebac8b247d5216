//! Maintenance task endpoints

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
    models::maintenance::{CreateTask, MaintenanceTask, TaskQuery, UpdateTask},
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct TaskResponse {
    pub success: bool,
    pub message: Option<String>,
    pub task: MaintenanceTask,
}

#[derive(Serialize, ToSchema)]
pub struct TasksResponse {
    pub success: bool,
    pub tasks: Vec<MaintenanceTask>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[utoipa::path(
    get,
    path = "/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(
        ("search" = Option<String>, Query, description = "Match title, description or assignee"),
        ("status" = Option<String>, Query, description = "pending, in_progress or completed"),
        ("priority" = Option<String>, Query, description = "low, medium, high or urgent"),
        ("library_id" = Option<i32>, Query, description = "Library (super-admins only)"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Maintenance tasks", body = TasksResponse),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<TasksResponse>> {
    let (tasks, total) = state.services.maintenance.search(&claims, &query).await?;
    let paging = query.page_params();
    Ok(Json(TasksResponse {
        success: true,
        tasks,
        total,
        page: paging.page(),
        per_page: paging.per_page(),
    }))
}

#[utoipa::path(
    get,
    path = "/maintenance/{id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Maintenance task", body = TaskResponse),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<TaskResponse>> {
    let task = state.services.maintenance.get_by_id(&claims, id).await?;
    Ok(Json(TaskResponse { success: true, message: None, task }))
}

#[utoipa::path(
    post,
    path = "/maintenance",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task filed", body = TaskResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    let task = state.services.maintenance.create(&claims, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            success: true,
            message: Some("Task created successfully".to_string()),
            task,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/maintenance/{id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateTask>,
) -> AppResult<Json<TaskResponse>> {
    let task = state.services.maintenance.update(&claims, id, data).await?;
    Ok(Json(TaskResponse {
        success: true,
        message: Some("Task updated successfully".to_string()),
        task,
    }))
}

#[utoipa::path(
    delete,
    path = "/maintenance/{id}",
    tag = "maintenance",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.maintenance.delete(&claims, id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
