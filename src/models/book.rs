//! Book (catalog) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::search::{fold, matches_text, PageParams};

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub library_id: i32,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    /// Required when a super-admin adds the book
    pub library_id: Option<i32>,
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10-17 characters"))]
    pub isbn: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub available_copies: Option<i32>,
}

impl CreateBook {
    /// Copies owned; one when unspecified
    pub fn total(&self) -> i32 {
        self.total_copies.unwrap_or(1)
    }

    /// Copies on the shelf; all of them when unspecified
    pub fn available(&self) -> i32 {
        self.available_copies.unwrap_or_else(|| self.total())
    }
}

/// Update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: Option<String>,
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10-17 characters"))]
    pub isbn: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub total_copies: Option<i32>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub available_copies: Option<i32>,
}

/// Book list filter
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookQuery {
    /// Matches title, author or ISBN
    pub search: Option<String>,
    /// Exact category, case and accent insensitive
    pub category: Option<String>,
    /// true: at least one copy on the shelf; false: none left
    pub available: Option<bool>,
    pub library_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams { page: self.page, per_page: self.per_page }
    }

    pub fn matches(&self, book: &Book) -> bool {
        matches_text(
            self.search.as_deref(),
            [Some(book.title.as_str()), book.author.as_deref(), book.isbn.as_deref()],
        ) && self.category.as_deref().map_or(true, |wanted| {
            book.category.as_deref().map_or(false, |c| fold(c) == fold(wanted))
        }) && self.available.map_or(true, |a| a == book.is_available())
            && self.library_id.map_or(true, |l| l == book.library_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, category: &str, available: i32) -> Book {
        Book {
            id: 1,
            library_id: 1,
            title: title.into(),
            author: Some(author.into()),
            isbn: Some("9782070360024".into()),
            category: Some(category.into()),
            total_copies: 3,
            available_copies: available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filters_are_anded() {
        let books = vec![
            book("L'Étranger", "Albert Camus", "Roman", 2),
            book("La Peste", "Albert Camus", "Roman", 0),
            book("Le Mythe de Sisyphe", "Albert Camus", "Essai", 1),
            book("Germinal", "Émile Zola", "Roman", 1),
        ];

        let q = BookQuery {
            search: Some("camus".into()),
            category: Some("roman".into()),
            available: Some(true),
            ..Default::default()
        };
        let hits: Vec<_> = books.iter().filter(|b| q.matches(b)).map(|b| b.title.as_str()).collect();
        assert_eq!(hits, vec!["L'Étranger"]);

        let q = BookQuery { search: Some("etranger".into()), ..Default::default() };
        assert_eq!(books.iter().filter(|b| q.matches(b)).count(), 1);

        let q = BookQuery { available: Some(false), ..Default::default() };
        assert_eq!(books.iter().filter(|b| q.matches(b)).count(), 1);

        assert_eq!(books.iter().filter(|b| BookQuery::default().matches(b)).count(), 4);
    }

    #[test]
    fn isbn_search() {
        let b = book("Germinal", "Émile Zola", "Roman", 1);
        assert!(BookQuery { search: Some("978207".into()), ..Default::default() }.matches(&b));
    }
}
