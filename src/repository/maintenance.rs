//! Maintenance tasks repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{TaskPriority, TaskStatus},
        maintenance::{CreateTask, MaintenanceTask, UpdateTask},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<MaintenanceTask>>;
    async fn get_by_id(&self, id: i32) -> AppResult<MaintenanceTask>;
    async fn create(&self, library_id: i32, data: &CreateTask) -> AppResult<MaintenanceTask>;
    async fn update(&self, id: i32, data: &UpdateTask) -> AppResult<MaintenanceTask>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgMaintenanceRepository {
    pool: Pool<Postgres>,
}

impl PgMaintenanceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaintenanceRepository for PgMaintenanceRepository {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<MaintenanceTask>> {
        let rows = sqlx::query_as::<_, MaintenanceTask>(
            r#"
            SELECT * FROM maintenance_tasks
            WHERE ($1::INT IS NULL OR library_id = $1)
            ORDER BY due_date NULLS LAST, id
            "#,
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<MaintenanceTask> {
        sqlx::query_as::<_, MaintenanceTask>("SELECT * FROM maintenance_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Maintenance task {} not found", id)))
    }

    async fn create(&self, library_id: i32, data: &CreateTask) -> AppResult<MaintenanceTask> {
        let row = sqlx::query_as::<_, MaintenanceTask>(
            r#"
            INSERT INTO maintenance_tasks (library_id, title, description, priority, status, assigned_to, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(library_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority.unwrap_or(TaskPriority::Medium))
        .bind(TaskStatus::Pending)
        .bind(&data.assigned_to)
        .bind(data.due_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, data: &UpdateTask) -> AppResult<MaintenanceTask> {
        sqlx::query_as::<_, MaintenanceTask>(
            r#"
            UPDATE maintenance_tasks SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                priority = COALESCE($3, priority),
                status = COALESCE($4, status),
                assigned_to = COALESCE($5, assigned_to),
                due_date = COALESCE($6, due_date),
                updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority)
        .bind(data.status)
        .bind(&data.assigned_to)
        .bind(data.due_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance task {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM maintenance_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Maintenance task {} not found", id)));
        }
        Ok(())
    }
}
