//! Dashboard statistics service

use chrono::Utc;

use crate::{
    error::AppResult,
    models::{
        dashboard::{DashboardInputs, DashboardStats},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Widgets for one library, or every library when a super-admin asks
    /// without naming one
    pub async fn stats(&self, claims: &UserClaims, library_id: Option<i32>) -> AppResult<DashboardStats> {
        claims.require_staff()?;
        let scope = claims.list_scope(library_id);
        let repo = &self.repository;

        let libraries = match scope {
            Some(id) => vec![repo.libraries.get_by_id(id).await?],
            None => repo.libraries.list().await?,
        };
        let users = repo.users.list(scope).await?;
        let plans = repo.plans.list(scope).await?;
        let books = repo.books.list(scope).await?;
        let bookings = repo.bookings.list(scope).await?;
        let tasks = repo.maintenance.list(scope).await?;
        let payments = repo.payments.list(scope).await?;

        let stats = DashboardStats::compute(
            &DashboardInputs {
                library_id: scope,
                libraries: &libraries,
                users: &users,
                plans: &plans,
                books: &books,
                bookings: &bookings,
                tasks: &tasks,
                payments: &payments,
            },
            Utc::now().date_naive(),
        );
        tracing::debug!(library_id = ?scope, users = users.len(), books = books.len(), "Dashboard computed");
        Ok(stats)
    }
}
