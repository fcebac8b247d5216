//! Library (tenant) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::library::{CreateLibrary, Library, UpdateLibrary},
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct LibraryResponse {
    pub success: bool,
    pub message: Option<String>,
    pub library: Library,
}

#[derive(Serialize, ToSchema)]
pub struct LibrariesResponse {
    pub success: bool,
    pub libraries: Vec<Library>,
    pub total: i64,
}

/// List visible libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Libraries", body = LibrariesResponse)
    )
)]
pub async fn list_libraries(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LibrariesResponse>> {
    let libraries = state.services.libraries.list(&claims).await?;
    Ok(Json(LibrariesResponse {
        success: true,
        total: libraries.len() as i64,
        libraries,
    }))
}

#[utoipa::path(
    get,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library", body = LibraryResponse),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LibraryResponse>> {
    let library = state.services.libraries.get_by_id(&claims, id).await?;
    Ok(Json(LibraryResponse {
        success: true,
        message: None,
        library,
    }))
}

/// Open a new library (super-admin)
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = LibraryResponse),
        (status = 403, description = "Super-admin only")
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateLibrary>,
) -> AppResult<(StatusCode, Json<LibraryResponse>)> {
    let library = state.services.libraries.create(&claims, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(LibraryResponse {
            success: true,
            message: Some("Library created successfully".to_string()),
            library,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Library ID")),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = LibraryResponse),
        (status = 404, description = "Library not found")
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateLibrary>,
) -> AppResult<Json<LibraryResponse>> {
    let library = state.services.libraries.update(&claims, id, data).await?;
    Ok(Json(LibraryResponse {
        success: true,
        message: Some("Library updated successfully".to_string()),
        library,
    }))
}

#[utoipa::path(
    delete,
    path = "/libraries/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library deleted", body = MessageResponse),
        (status = 404, description = "Library not found"),
        (status = 409, description = "Library still has users")
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.libraries.delete(&claims, id).await?;
    Ok(Json(MessageResponse::new("Library deleted successfully")))
}
