//! Payments service: recording, status changes and aggregation

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ensure_visible;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{PaymentStatus, Role},
        payment::{CreatePayment, NewPayment, Payment, PaymentQuery, PaymentSummary},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
}

impl PaymentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Payments matching `query` within the caller's scope, unpaginated
    async fn filtered(&self, claims: &UserClaims, query: &PaymentQuery) -> AppResult<Vec<Payment>> {
        let mut query = query.clone();
        query.library_id = claims.list_scope(query.library_id);
        if claims.role == Role::Member {
            query.user_id = Some(claims.user_id);
        }

        let payments = self.repository.payments.list(query.library_id).await?;
        Ok(payments.into_iter().filter(|p| query.matches(p)).collect())
    }

    pub async fn search(&self, claims: &UserClaims, query: &PaymentQuery) -> AppResult<(Vec<Payment>, i64)> {
        let payments = self.filtered(claims, query).await?;
        Ok(query.page_params().apply(payments))
    }

    /// Totals over the whole filtered set, ignoring pagination
    pub async fn summary(&self, claims: &UserClaims, query: &PaymentQuery) -> AppResult<PaymentSummary> {
        let payments = self.filtered(claims, query).await?;
        Ok(PaymentSummary::from_payments(&payments))
    }

    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<Payment> {
        let payment = self.repository.payments.get_by_id(id).await?;
        ensure_visible(claims, Some(payment.library_id), "Payment", id)?;
        if claims.role == Role::Member && payment.user_id != claims.user_id {
            return Err(AppError::NotFound(format!("Payment {} not found", id)));
        }
        Ok(payment)
    }

    pub async fn create(&self, claims: &UserClaims, data: CreatePayment) -> AppResult<Payment> {
        claims.require_staff()?;
        if data.amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be greater than zero".to_string()));
        }

        let user = self.repository.users.get_by_id(data.user_id).await?;
        ensure_visible(claims, user.library_id, "User with id", data.user_id)?;
        let library_id = user
            .library_id
            .ok_or_else(|| AppError::BusinessRule("Payments are recorded for library members only".to_string()))?;

        if let Some(plan_id) = data.plan_id {
            let plan = self.repository.plans.get_by_id(plan_id).await?;
            if plan.library_id != library_id {
                return Err(AppError::NotFound(format!("Membership plan {} not found", plan_id)));
            }
        }

        let status = data.status.unwrap_or(PaymentStatus::Completed);
        let paid_at = (status == PaymentStatus::Completed).then(Utc::now);

        let payment = self
            .repository
            .payments
            .create(&NewPayment {
                library_id,
                user_id: data.user_id,
                plan_id: data.plan_id,
                amount: data.amount,
                method: data.method,
                status,
                reference: Uuid::new_v4(),
                paid_at,
            })
            .await?;
        tracing::info!(
            payment_id = payment.id,
            user_id = payment.user_id,
            amount = %payment.amount,
            status = %payment.status,
            "Payment recorded"
        );
        Ok(payment)
    }

    pub async fn update_status(&self, claims: &UserClaims, id: i32, status: PaymentStatus) -> AppResult<Payment> {
        claims.require_staff()?;
        let payment = self.get_by_id(claims, id).await?;

        if !payment.status.can_transition_to(status) {
            return Err(AppError::BusinessRule(format!(
                "Payment {} is {} and cannot become {}",
                id, payment.status, status
            )));
        }

        let paid_at = (status == PaymentStatus::Completed).then(Utc::now);
        let updated = self.repository.payments.update_status(id, status, paid_at).await?;
        tracing::info!(payment_id = id, from = %payment.status, to = %status, "Payment status changed");
        Ok(updated)
    }
}
