//! Business logic services

pub mod auth;
pub mod bookings;
pub mod books;
pub mod dashboard;
pub mod libraries;
pub mod maintenance;
pub mod payments;
pub mod plans;
pub mod users;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::UserClaims,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub libraries: libraries::LibrariesService,
    pub plans: plans::PlansService,
    pub books: books::BooksService,
    pub bookings: bookings::BookingsService,
    pub maintenance: maintenance::MaintenanceService,
    pub payments: payments::PaymentsService,
    pub dashboard: dashboard::DashboardService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            users: users::UsersService::new(repository.clone()),
            libraries: libraries::LibrariesService::new(repository.clone()),
            plans: plans::PlansService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone()),
            maintenance: maintenance::MaintenanceService::new(repository.clone()),
            payments: payments::PaymentsService::new(repository.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            repository,
        }
    }
}

/// Library a new record should belong to.
///
/// Super-admins must name an existing library; everyone else writes into
/// their own and may not name another one.
pub(crate) async fn target_library(
    repository: &Repository,
    claims: &UserClaims,
    requested: Option<i32>,
) -> AppResult<i32> {
    match claims.scope() {
        Some(own) => match requested {
            Some(other) if other != own => Err(AppError::Authorization(
                "Records can only be created in your own library".to_string(),
            )),
            _ => Ok(own),
        },
        None if claims.is_super_admin() => {
            let id = requested
                .ok_or_else(|| AppError::Validation("library_id is required".to_string()))?;
            repository.libraries.get_by_id(id).await?;
            Ok(id)
        }
        None => Err(AppError::Authorization("Account is not attached to a library".to_string())),
    }
}

/// Turn a record of another library into a plain not-found
pub(crate) fn ensure_visible(claims: &UserClaims, library_id: Option<i32>, what: &str, id: i32) -> AppResult<()> {
    if claims.can_see(library_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} {} not found", what, id)))
    }
}
