//! Book catalog endpoints

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
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    AppState,
};

use super::{AuthenticatedUser, MessageResponse};

#[skip_serializing_none]
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub success: bool,
    pub message: Option<String>,
    pub book: Book,
}

#[derive(Serialize, ToSchema)]
pub struct BooksResponse {
    pub success: bool,
    pub books: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Search the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("search" = Option<String>, Query, description = "Match title, author or ISBN"),
        ("category" = Option<String>, Query, description = "Category"),
        ("available" = Option<bool>, Query, description = "Only books with (true) or without (false) copies on the shelf"),
        ("library_id" = Option<i32>, Query, description = "Library (super-admins only)"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Books", body = BooksResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BooksResponse>> {
    let (books, total) = state.services.books.search(&claims, &query).await?;
    let paging = query.page_params();
    Ok(Json(BooksResponse {
        success: true,
        books,
        total,
        page: paging.page(),
        per_page: paging.per_page(),
    }))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.get_by_id(&claims, id).await?;
    Ok(Json(BookResponse { success: true, message: None, book }))
}

#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let book = state.services.books.create(&claims, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            success: true,
            message: Some("Book added successfully".to_string()),
            book,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid copy counts"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.update(&claims, id, data).await?;
    Ok(Json(BookResponse {
        success: true,
        message: Some("Book updated successfully".to_string()),
        book,
    }))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete(&claims, id).await?;
    Ok(Json(MessageResponse::new("Book deleted successfully")))
}
