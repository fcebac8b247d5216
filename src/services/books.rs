//! Book catalog service

use validator::Validate;

use super::{ensure_visible, target_library};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

fn check_copies(total: i32, available: i32) -> AppResult<()> {
    if available < 0 || available > total {
        return Err(AppError::Validation(format!(
            "available_copies must be between 0 and {}",
            total
        )));
    }
    Ok(())
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn visible_book(&self, claims: &UserClaims, id: i32) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;
        ensure_visible(claims, Some(book.library_id), "Book", id)?;
        Ok(book)
    }

    /// Filtered, paginated catalog
    pub async fn search(&self, claims: &UserClaims, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let mut query = query.clone();
        query.library_id = claims.list_scope(query.library_id);

        let books = self.repository.books.list(query.library_id).await?;
        let matching: Vec<Book> = books.into_iter().filter(|b| query.matches(b)).collect();
        Ok(query.page_params().apply(matching))
    }

    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<Book> {
        self.visible_book(claims, id).await
    }

    pub async fn create(&self, claims: &UserClaims, data: CreateBook) -> AppResult<Book> {
        claims.require_staff()?;
        data.validate()?;
        check_copies(data.total(), data.available())?;
        let library_id = target_library(&self.repository, claims, data.library_id).await?;

        let book = self.repository.books.create(library_id, &data).await?;
        tracing::info!(book_id = book.id, library_id, title = %book.title, "Book added");
        Ok(book)
    }

    pub async fn update(&self, claims: &UserClaims, id: i32, data: UpdateBook) -> AppResult<Book> {
        claims.require_staff()?;
        data.validate()?;
        let existing = self.visible_book(claims, id).await?;

        let total = data.total_copies.unwrap_or(existing.total_copies);
        let available = data
            .available_copies
            .unwrap_or_else(|| existing.available_copies.min(total));
        check_copies(total, available)?;

        let data = UpdateBook {
            available_copies: Some(available),
            ..data
        };
        let book = self.repository.books.update(id, &data).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(book)
    }

    pub async fn delete(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require_staff()?;
        self.visible_book(claims, id).await?;
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
