//! Repository layer: storage ports and their adapters

pub mod bookings;
pub mod books;
pub mod libraries;
pub mod maintenance;
pub mod memory;
pub mod payments;
pub mod plans;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use bookings::BookingRepository;
pub use books::BookRepository;
pub use libraries::LibraryRepository;
pub use maintenance::MaintenanceRepository;
pub use payments::PaymentRepository;
pub use plans::PlanRepository;
pub use users::UserRepository;

use crate::error::AppResult;

/// Main repository struct holding one handle per storage port
#[derive(Clone)]
pub struct Repository {
    /// Present for the PostgreSQL backend, used by readiness checks
    pub pool: Option<Pool<Postgres>>,
    pub users: Arc<dyn UserRepository>,
    pub libraries: Arc<dyn LibraryRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub books: Arc<dyn BookRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::PgUserRepository::new(pool.clone())),
            libraries: Arc::new(libraries::PgLibraryRepository::new(pool.clone())),
            plans: Arc::new(plans::PgPlanRepository::new(pool.clone())),
            books: Arc::new(books::PgBookRepository::new(pool.clone())),
            bookings: Arc::new(bookings::PgBookingRepository::new(pool.clone())),
            maintenance: Arc::new(maintenance::PgMaintenanceRepository::new(pool.clone())),
            payments: Arc::new(payments::PgPaymentRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository over a fresh in-memory store
    pub fn memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            pool: None,
            users: store.clone(),
            libraries: store.clone(),
            plans: store.clone(),
            books: store.clone(),
            bookings: store.clone(),
            maintenance: store.clone(),
            payments: store,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Mocked ports for service unit tests; set expectations, then convert
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockPorts {
    pub users: users::MockUserRepository,
    pub libraries: libraries::MockLibraryRepository,
    pub plans: plans::MockPlanRepository,
    pub books: books::MockBookRepository,
    pub bookings: bookings::MockBookingRepository,
    pub maintenance: maintenance::MockMaintenanceRepository,
    pub payments: payments::MockPaymentRepository,
}

#[cfg(test)]
impl From<MockPorts> for Repository {
    fn from(mocks: MockPorts) -> Self {
        Self {
            pool: None,
            users: Arc::new(mocks.users),
            libraries: Arc::new(mocks.libraries),
            plans: Arc::new(mocks.plans),
            books: Arc::new(mocks.books),
            bookings: Arc::new(mocks.bookings),
            maintenance: Arc::new(mocks.maintenance),
            payments: Arc::new(mocks.payments),
        }
    }
}
