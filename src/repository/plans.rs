//! Membership plans repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::plan::{CreatePlan, MembershipPlan, UpdatePlan},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<MembershipPlan>>;
    async fn get_by_id(&self, id: i32) -> AppResult<MembershipPlan>;
    async fn create(&self, library_id: i32, data: &CreatePlan) -> AppResult<MembershipPlan>;
    async fn update(&self, id: i32, data: &UpdatePlan) -> AppResult<MembershipPlan>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgPlanRepository {
    pool: Pool<Postgres>,
}

impl PgPlanRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<MembershipPlan>> {
        let rows = sqlx::query_as::<_, MembershipPlan>(
            "SELECT * FROM membership_plans WHERE ($1::INT IS NULL OR library_id = $1) ORDER BY price, name",
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<MembershipPlan> {
        sqlx::query_as::<_, MembershipPlan>("SELECT * FROM membership_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Membership plan {} not found", id)))
    }

    async fn create(&self, library_id: i32, data: &CreatePlan) -> AppResult<MembershipPlan> {
        let row = sqlx::query_as::<_, MembershipPlan>(
            r#"
            INSERT INTO membership_plans
                (library_id, name, description, price, duration_days, max_active_bookings)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(library_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.duration_days)
        .bind(data.max_active_bookings)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, data: &UpdatePlan) -> AppResult<MembershipPlan> {
        sqlx::query_as::<_, MembershipPlan>(
            r#"
            UPDATE membership_plans SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                duration_days = COALESCE($4, duration_days),
                max_active_bookings = COALESCE($5, max_active_bookings),
                is_active = COALESCE($6, is_active)
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.duration_days)
        .bind(data.max_active_bookings)
        .bind(data.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Membership plan {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM membership_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Membership plan {} not found", id)));
        }
        Ok(())
    }
}
