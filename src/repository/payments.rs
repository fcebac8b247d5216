//! Payments repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PaymentStatus,
        payment::{NewPayment, Payment},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<Payment>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Payment>;
    async fn create(&self, payment: &NewPayment) -> AppResult<Payment>;
    async fn update_status(
        &self,
        id: i32,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> AppResult<Payment>;
}

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: Pool<Postgres>,
}

impl PgPaymentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE ($1::INT IS NULL OR library_id = $1) ORDER BY created_at DESC, id DESC",
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }

    async fn create(&self, payment: &NewPayment) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (library_id, user_id, plan_id, amount, method, status, reference, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payment.library_id)
        .bind(payment.user_id)
        .bind(payment.plan_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.reference)
        .bind(payment.paid_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_status(
        &self,
        id: i32,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $1, paid_at = COALESCE($2, paid_at) WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(paid_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }
}
