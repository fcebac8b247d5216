//! User management endpoints

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
    models::{
        plan::MembershipDetails,
        user::{AssignMembership, CreateUser, UpdateUser, User, UserQuery, UserShort},
    },
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

/// Single user envelope
#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub message: Option<String>,
    pub user: User,
}

impl UserResponse {
    pub fn new(user: User, message: Option<&str>) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
            user,
        }
    }
}

/// Paginated user list envelope
#[derive(Serialize, ToSchema)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserShort>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Serialize, ToSchema)]
pub struct MembershipResponse {
    pub success: bool,
    pub membership: MembershipDetails,
}

/// List users with search and pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("search" = Option<String>, Query, description = "Match name or email"),
        ("role" = Option<String>, Query, description = "member, admin or super_admin"),
        ("library_id" = Option<i32>, Query, description = "Library (super-admins only)"),
        ("is_active" = Option<bool>, Query, description = "Account status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of users", body = UsersResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<UsersResponse>> {
    claims.require_staff()?;

    let (users, total) = state.services.users.search_users(&claims, &query).await?;
    let paging = query.page_params();

    Ok(Json(UsersResponse {
        success: true,
        users,
        total,
        page: paging.page(),
        per_page: paging.per_page(),
    }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get_by_id(&claims, id).await?;
    Ok(Json(UserResponse::new(user, None)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing fields, invalid input or email already registered"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    claims.require_staff()?;

    let created = state.services.users.create_user(&claims, user).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(created, Some("User created successfully"))),
    ))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input or email already registered"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(user): Json<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    let updated = state.services.users.update_user(&claims, id, user).await?;
    Ok(Json(UserResponse::new(updated, Some("User updated successfully"))))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found"),
        (status = 422, description = "Cannot delete own account")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_staff()?;

    state.services.users.delete_user(&claims, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Get a user's membership joined with its plan
#[utoipa::path(
    get,
    path = "/users/{id}/membership",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Membership details", body = MembershipResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_membership(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MembershipResponse>> {
    let membership = state.services.users.get_membership(&claims, id).await?;
    Ok(Json(MembershipResponse {
        success: true,
        membership,
    }))
}

/// Subscribe a user to a membership plan
#[utoipa::path(
    put,
    path = "/users/{id}/membership",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = AssignMembership,
    responses(
        (status = 200, description = "Membership assigned", body = MembershipResponse),
        (status = 404, description = "User or plan not found"),
        (status = 422, description = "Plan no longer offered")
    )
)]
pub async fn assign_membership(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AssignMembership>,
) -> AppResult<Json<MembershipResponse>> {
    claims.require_staff()?;

    let membership = state.services.users.assign_membership(&claims, id, request).await?;
    Ok(Json(MembershipResponse {
        success: true,
        membership,
    }))
}
