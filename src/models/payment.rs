//! Payment model and the summary reducer used by the dashboards

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    enums::{PaymentMethod, PaymentStatus},
    search::PageParams,
};

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i32,
    pub library_id: i32,
    pub user_id: i32,
    pub plan_id: Option<i32>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Receipt reference handed to the member
    pub reference: Uuid,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Record payment request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePayment {
    pub user_id: i32,
    pub plan_id: Option<i32>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Defaults to completed
    pub status: Option<PaymentStatus>,
}

/// Insert payload built by the payments service
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub library_id: i32,
    pub user_id: i32,
    pub plan_id: Option<i32>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Uuid,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePaymentStatus {
    pub status: PaymentStatus,
}

/// Payment list filter
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub user_id: Option<i32>,
    /// Inclusive lower bound on the creation day
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the creation day
    pub to: Option<NaiveDate>,
    pub library_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PaymentQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams { page: self.page, per_page: self.per_page }
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        let day = payment.created_at.date_naive();
        self.status.map_or(true, |s| s == payment.status)
            && self.method.map_or(true, |m| m == payment.method)
            && self.user_id.map_or(true, |u| u == payment.user_id)
            && self.from.map_or(true, |f| day >= f)
            && self.to.map_or(true, |t| day <= t)
            && self.library_id.map_or(true, |l| l == payment.library_id)
    }
}

/// Aggregate over a set of payments
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PaymentSummary {
    pub count: i64,
    /// Sum of completed payments
    pub total_collected: Decimal,
    pub total_pending: Decimal,
    pub total_refunded: Decimal,
    /// Number of payments per status, in first-seen order
    #[schema(value_type = Object)]
    pub by_status: IndexMap<PaymentStatus, i64>,
    /// Collected amount per method, in first-seen order
    #[schema(value_type = Object)]
    pub collected_by_method: IndexMap<PaymentMethod, Decimal>,
}

impl PaymentSummary {
    pub fn from_payments<'a, I>(payments: I) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        payments.into_iter().fold(Self::default(), |mut acc, p| {
            acc.count += 1;
            *acc.by_status.entry(p.status).or_insert(0) += 1;
            match p.status {
                PaymentStatus::Completed => {
                    acc.total_collected += p.amount;
                    *acc.collected_by_method.entry(p.method).or_insert(Decimal::ZERO) += p.amount;
                }
                PaymentStatus::Pending => acc.total_pending += p.amount,
                PaymentStatus::Refunded => acc.total_refunded += p.amount,
                PaymentStatus::Failed => {}
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(amount: i64, method: PaymentMethod, status: PaymentStatus) -> Payment {
        Payment {
            id: 1,
            library_id: 1,
            user_id: 1,
            plan_id: None,
            amount: Decimal::new(amount, 2),
            method,
            status,
            reference: Uuid::new_v4(),
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_reduces_by_status_and_method() {
        let payments = vec![
            payment(50000, PaymentMethod::Upi, PaymentStatus::Completed),
            payment(25050, PaymentMethod::Cash, PaymentStatus::Completed),
            payment(10000, PaymentMethod::Upi, PaymentStatus::Completed),
            payment(9900, PaymentMethod::Card, PaymentStatus::Pending),
            payment(5000, PaymentMethod::Card, PaymentStatus::Refunded),
            payment(7000, PaymentMethod::Card, PaymentStatus::Failed),
        ];
        let summary = PaymentSummary::from_payments(&payments);

        assert_eq!(summary.count, 6);
        assert_eq!(summary.total_collected, Decimal::new(85050, 2));
        assert_eq!(summary.total_pending, Decimal::new(9900, 2));
        assert_eq!(summary.total_refunded, Decimal::new(5000, 2));
        assert_eq!(summary.by_status[&PaymentStatus::Completed], 3);
        assert_eq!(summary.by_status[&PaymentStatus::Failed], 1);

        let methods: Vec<_> = summary.collected_by_method.keys().copied().collect();
        assert_eq!(methods, vec![PaymentMethod::Upi, PaymentMethod::Cash]);
        assert_eq!(summary.collected_by_method[&PaymentMethod::Upi], Decimal::new(60000, 2));
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = PaymentSummary::from_payments(std::iter::empty());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_collected, Decimal::ZERO);
        assert!(summary.by_status.is_empty());
    }

    #[test]
    fn date_range_filter() {
        let p = payment(100, PaymentMethod::Cash, PaymentStatus::Completed);
        let today = p.created_at.date_naive();
        assert!(PaymentQuery { from: Some(today), to: Some(today), ..Default::default() }.matches(&p));
        assert!(!PaymentQuery { from: today.succ_opt(), ..Default::default() }.matches(&p));
    }
}
