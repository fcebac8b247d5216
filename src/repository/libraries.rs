//! Libraries repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::library::{CreateLibrary, Library, UpdateLibrary},
};

/// Storage port for libraries (tenants)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Library>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Library>;
    async fn create(&self, data: &CreateLibrary) -> AppResult<Library>;
    async fn update(&self, id: i32, data: &UpdateLibrary) -> AppResult<Library>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgLibraryRepository {
    pool: Pool<Postgres>,
}

impl PgLibraryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryRepository for PgLibraryRepository {
    async fn list(&self) -> AppResult<Vec<Library>> {
        let rows = sqlx::query_as::<_, Library>("SELECT * FROM libraries ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library {} not found", id)))
    }

    async fn create(&self, data: &CreateLibrary) -> AppResult<Library> {
        let row = sqlx::query_as::<_, Library>(
            r#"
            INSERT INTO libraries (name, address, total_seats)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.address)
        .bind(data.total_seats)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, data: &UpdateLibrary) -> AppResult<Library> {
        sqlx::query_as::<_, Library>(
            r#"
            UPDATE libraries SET
                name = COALESCE($1, name),
                address = COALESCE($2, address),
                total_seats = COALESCE($3, total_seats),
                is_active = COALESCE($4, is_active)
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.address)
        .bind(data.total_seats)
        .bind(data.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Library {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Library {} not found", id)));
        }
        Ok(())
    }
}
