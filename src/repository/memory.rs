//! In-process storage adapter
//!
//! Implements every repository port over ordered maps guarded by a single
//! `RwLock`. Data lives as long as the process. Used by the `memory` storage
//! backend and by the test suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    bookings::allowance_reached, BookRepository, BookingRepository, LibraryRepository, MaintenanceRepository, PaymentRepository,
    PlanRepository, UserRepository,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook},
        booking::{BookingAllowance, NewBooking, SeatBooking},
        enums::{BookingStatus, PaymentStatus, TaskPriority, TaskStatus},
        library::{CreateLibrary, Library, UpdateLibrary},
        maintenance::{CreateTask, MaintenanceTask, UpdateTask},
        payment::{NewPayment, Payment},
        plan::{CreatePlan, MembershipPlan, UpdatePlan},
        user::{Membership, NewUser, UpdateUser, User},
    },
};

/// One table: rows keyed by id plus the next id to hand out
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self { rows: BTreeMap::new(), next_id: 1 }
    }

    fn next_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn get(&self, id: i32, what: &str) -> AppResult<T> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
    }

    fn get_mut(&mut self, id: i32, what: &str) -> AppResult<&mut T> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
    }

    fn remove(&mut self, id: i32, what: &str) -> AppResult<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
    }

    fn filtered<F: Fn(&T) -> bool>(&self, keep: F) -> Vec<T> {
        self.rows.values().filter(|r| keep(r)).cloned().collect()
    }
}

struct Tables {
    libraries: Table<Library>,
    users: Table<User>,
    plans: Table<MembershipPlan>,
    books: Table<Book>,
    bookings: Table<SeatBooking>,
    tasks: Table<MaintenanceTask>,
    payments: Table<Payment>,
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                libraries: Table::new(),
                users: Table::new(),
                plans: Table::new(),
                books: Table::new(),
                bookings: Table::new(),
                tasks: Table::new(),
                payments: Table::new(),
            }),
        }
    }
}

/// Unicode case-insensitive comparison, matching `LOWER(a) = LOWER(b)`
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn in_library(library_id: Option<i32>, row_library: i32) -> bool {
    library_id.map_or(true, |l| l == row_library)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.tables.read().await.users.get(id, "User with id")
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| same_email(&u.email, email))
            .cloned())
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .any(|u| same_email(&u.email, email) && Some(u.id) != exclude_id))
    }

    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .filtered(|u| library_id.map_or(true, |l| u.library_id == Some(l))))
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.rows.values().any(|u| same_email(&u.email, &user.email)) {
            return Err(AppError::Validation("Email is already registered".to_string()));
        }
        let now = Utc::now();
        let id = tables.users.next_id();
        let created = User {
            id,
            library_id: user.library_id,
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            role: user.role,
            phone: user.phone.clone(),
            membership: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: &UpdateUser, password_hash: Option<String>) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(id, "User with id")?;
        if let Some(ref name) = changes.name {
            user.name = name.clone();
        }
        if let Some(ref email) = changes.email {
            user.email = email.clone();
        }
        if let Some(hash) = password_hash {
            user.password = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(ref phone) = changes.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_membership(&self, id: i32, membership: Option<Membership>) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(id, "User with id")?;
        user.membership = membership;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.users.remove(id, "User with id")?;
        // Mirror the ON DELETE CASCADE of the SQL schema
        tables.bookings.rows.retain(|_, b| b.user_id != id);
        tables.payments.rows.retain(|_, p| p.user_id != id);
        Ok(())
    }

    async fn count_by_plan(&self, plan_id: i32) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .filter(|u| u.membership.as_ref().map_or(false, |m| m.plan_id == plan_id))
            .count() as i64)
    }

    async fn count_by_library(&self, library_id: i32) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .filter(|u| u.library_id == Some(library_id))
            .count() as i64)
    }
}

#[async_trait]
impl LibraryRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Library>> {
        let mut libraries = self.tables.read().await.libraries.filtered(|_| true);
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(libraries)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Library> {
        self.tables.read().await.libraries.get(id, "Library")
    }

    async fn create(&self, data: &CreateLibrary) -> AppResult<Library> {
        let mut tables = self.tables.write().await;
        let id = tables.libraries.next_id();
        let library = Library {
            id,
            name: data.name.clone(),
            address: data.address.clone(),
            total_seats: data.total_seats,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.libraries.rows.insert(id, library.clone());
        Ok(library)
    }

    async fn update(&self, id: i32, data: &UpdateLibrary) -> AppResult<Library> {
        let mut tables = self.tables.write().await;
        let library = tables.libraries.get_mut(id, "Library")?;
        if let Some(ref name) = data.name {
            library.name = name.clone();
        }
        if let Some(ref address) = data.address {
            library.address = Some(address.clone());
        }
        if let Some(total_seats) = data.total_seats {
            library.total_seats = total_seats;
        }
        if let Some(is_active) = data.is_active {
            library.is_active = is_active;
        }
        Ok(library.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.libraries.remove(id, "Library")?;
        tables.plans.rows.retain(|_, p| p.library_id != id);
        tables.books.rows.retain(|_, b| b.library_id != id);
        tables.bookings.rows.retain(|_, b| b.library_id != id);
        tables.tasks.rows.retain(|_, t| t.library_id != id);
        tables.payments.rows.retain(|_, p| p.library_id != id);
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for MemoryStore {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<MembershipPlan>> {
        let mut plans = self
            .tables
            .read()
            .await
            .plans
            .filtered(|p| in_library(library_id, p.library_id));
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<MembershipPlan> {
        self.tables.read().await.plans.get(id, "Membership plan")
    }

    async fn create(&self, library_id: i32, data: &CreatePlan) -> AppResult<MembershipPlan> {
        let mut tables = self.tables.write().await;
        let id = tables.plans.next_id();
        let plan = MembershipPlan {
            id,
            library_id,
            name: data.name.clone(),
            description: data.description.clone(),
            price: data.price,
            duration_days: data.duration_days,
            max_active_bookings: data.max_active_bookings,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.plans.rows.insert(id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, id: i32, data: &UpdatePlan) -> AppResult<MembershipPlan> {
        let mut tables = self.tables.write().await;
        let plan = tables.plans.get_mut(id, "Membership plan")?;
        if let Some(ref name) = data.name {
            plan.name = name.clone();
        }
        if let Some(ref description) = data.description {
            plan.description = Some(description.clone());
        }
        if let Some(price) = data.price {
            plan.price = price;
        }
        if let Some(duration_days) = data.duration_days {
            plan.duration_days = duration_days;
        }
        if let Some(max) = data.max_active_bookings {
            plan.max_active_bookings = max;
        }
        if let Some(is_active) = data.is_active {
            plan.is_active = is_active;
        }
        Ok(plan.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.plans.remove(id, "Membership plan")?;
        // ON DELETE SET NULL
        for payment in tables.payments.rows.values_mut().filter(|p| p.plan_id == Some(id)) {
            payment.plan_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<Book>> {
        let mut books = self
            .tables
            .read()
            .await
            .books
            .filtered(|b| in_library(library_id, b.library_id));
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.tables.read().await.books.get(id, "Book")
    }

    async fn create(&self, library_id: i32, data: &CreateBook) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let id = tables.books.next_id();
        let book = Book {
            id,
            library_id,
            title: data.title.clone(),
            author: data.author.clone(),
            isbn: data.isbn.clone(),
            category: data.category.clone(),
            total_copies: data.total(),
            available_copies: data.available(),
            created_at: Utc::now(),
        };
        tables.books.rows.insert(id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let book = tables.books.get_mut(id, "Book")?;
        if let Some(ref title) = data.title {
            book.title = title.clone();
        }
        if let Some(ref author) = data.author {
            book.author = Some(author.clone());
        }
        if let Some(ref isbn) = data.isbn {
            book.isbn = Some(isbn.clone());
        }
        if let Some(ref category) = data.category {
            book.category = Some(category.clone());
        }
        if let Some(total) = data.total_copies {
            book.total_copies = total;
        }
        if let Some(available) = data.available_copies {
            book.available_copies = available;
        }
        Ok(book.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.tables.write().await.books.remove(id, "Book")
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<SeatBooking>> {
        let mut bookings = self
            .tables
            .read()
            .await
            .bookings
            .filtered(|b| in_library(library_id, b.library_id));
        bookings.sort_by(|a, b| {
            b.booking_date
                .cmp(&a.booking_date)
                .then(a.start_time.cmp(&b.start_time))
                .then(a.seat_number.cmp(&b.seat_number))
        });
        Ok(bookings)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<SeatBooking> {
        self.tables.read().await.bookings.get(id, "Booking")
    }

    async fn create(&self, booking: &NewBooking, allowance: BookingAllowance) -> AppResult<SeatBooking> {
        // Check and insert under the same write lock
        let mut tables = self.tables.write().await;
        let upcoming = tables
            .bookings
            .rows
            .values()
            .filter(|b| {
                b.user_id == booking.user_id && b.status == BookingStatus::Confirmed && b.booking_date >= allowance.from
            })
            .count() as i64;
        if upcoming >= allowance.max_upcoming {
            return Err(allowance_reached(allowance));
        }

        let taken = tables.bookings.rows.values().any(|b| {
            b.library_id == booking.library_id
                && b.status == BookingStatus::Confirmed
                && b.overlaps(booking.seat_number, booking.booking_date, booking.start_time, booking.end_time)
        });
        if taken {
            return Err(AppError::Conflict(format!(
                "Seat {} is already booked for that period",
                booking.seat_number
            )));
        }

        let now = Utc::now();
        let id = tables.bookings.next_id();
        let created = SeatBooking {
            id,
            library_id: booking.library_id,
            user_id: booking.user_id,
            seat_number: booking.seat_number,
            booking_date: booking.booking_date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn transition(&self, id: i32, from: BookingStatus, to: BookingStatus) -> AppResult<Option<SeatBooking>> {
        let mut tables = self.tables.write().await;
        match tables.bookings.rows.get_mut(&id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                booking.updated_at = Utc::now();
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl MaintenanceRepository for MemoryStore {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<MaintenanceTask>> {
        let mut tasks = self
            .tables
            .read()
            .await
            .tasks
            .filtered(|t| in_library(library_id, t.library_id));
        // Undated tasks last
        tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(tasks)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<MaintenanceTask> {
        self.tables.read().await.tasks.get(id, "Maintenance task")
    }

    async fn create(&self, library_id: i32, data: &CreateTask) -> AppResult<MaintenanceTask> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let id = tables.tasks.next_id();
        let task = MaintenanceTask {
            id,
            library_id,
            title: data.title.clone(),
            description: data.description.clone(),
            priority: data.priority.unwrap_or(TaskPriority::Medium),
            status: TaskStatus::Pending,
            assigned_to: data.assigned_to.clone(),
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.rows.insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: i32, data: &UpdateTask) -> AppResult<MaintenanceTask> {
        let mut tables = self.tables.write().await;
        let task = tables.tasks.get_mut(id, "Maintenance task")?;
        if let Some(ref title) = data.title {
            task.title = title.clone();
        }
        if let Some(ref description) = data.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(status) = data.status {
            task.status = status;
        }
        if let Some(ref assigned_to) = data.assigned_to {
            task.assigned_to = Some(assigned_to.clone());
        }
        if let Some(due_date) = data.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.tables.write().await.tasks.remove(id, "Maintenance task")
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<Payment>> {
        let mut payments = self
            .tables
            .read()
            .await
            .payments
            .filtered(|p| in_library(library_id, p.library_id));
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(payments)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Payment> {
        self.tables.read().await.payments.get(id, "Payment")
    }

    async fn create(&self, payment: &NewPayment) -> AppResult<Payment> {
        let mut tables = self.tables.write().await;
        let id = tables.payments.next_id();
        let created = Payment {
            id,
            library_id: payment.library_id,
            user_id: payment.user_id,
            plan_id: payment.plan_id,
            amount: payment.amount,
            method: payment.method,
            status: payment.status,
            reference: payment.reference,
            paid_at: payment.paid_at,
            created_at: Utc::now(),
        };
        tables.payments.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn update_status(
        &self,
        id: i32,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> AppResult<Payment> {
        let mut tables = self.tables.write().await;
        let payment = tables.payments.get_mut(id, "Payment")?;
        payment.status = status;
        if paid_at.is_some() {
            payment.paid_at = paid_at;
        }
        Ok(payment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{PaymentMethod, Role};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            library_id: Some(1),
            name: "Noor".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::Member,
            phone: None,
        }
    }

    fn new_booking(seat: i32, start: u32, end: u32) -> NewBooking {
        NewBooking {
            library_id: 1,
            user_id: 1,
            seat_number: seat,
            booking_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        }
    }

    fn roomy() -> BookingAllowance {
        BookingAllowance {
            max_upcoming: 100,
            from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn email_uniqueness_is_case_insensitive() {
        let store = MemoryStore::new();
        UserRepository::create(&store, &new_user("noor@example.org")).await.unwrap();

        assert!(store.email_exists("NOOR@example.org", None).await.unwrap());
        let err = UserRepository::create(&store, &new_user("Noor@Example.org")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(UserRepository::list(&store, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleted_user_is_gone() {
        let store = MemoryStore::new();
        let user = UserRepository::create(&store, &new_user("a@example.org")).await.unwrap();
        UserRepository::delete(&store, user.id).await.unwrap();

        let err = UserRepository::get_by_id(&store, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = UserRepository::delete(&store, user.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn overlapping_booking_conflicts_until_cancelled() {
        let store = MemoryStore::new();
        let first = BookingRepository::create(&store, &new_booking(3, 9, 12), roomy()).await.unwrap();

        let err = BookingRepository::create(&store, &new_booking(3, 11, 13), roomy()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Adjacent slot and another seat are fine
        BookingRepository::create(&store, &new_booking(3, 12, 14), roomy()).await.unwrap();
        BookingRepository::create(&store, &new_booking(4, 9, 12), roomy()).await.unwrap();

        let cancelled = store
            .transition(first.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.unwrap().status, BookingStatus::Cancelled);
        BookingRepository::create(&store, &new_booking(3, 10, 11), roomy()).await.unwrap();
    }

    #[tokio::test]
    async fn transition_requires_expected_state() {
        let store = MemoryStore::new();
        let booking = BookingRepository::create(&store, &new_booking(1, 9, 10), roomy()).await.unwrap();
        store
            .transition(booking.id, BookingStatus::Confirmed, BookingStatus::Completed)
            .await
            .unwrap();

        let again = store
            .transition(booking.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert!(again.is_none());
        assert!(store.transition(99, BookingStatus::Confirmed, BookingStatus::Cancelled).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn email_matching_folds_non_ascii_case() {
        let store = MemoryStore::new();
        UserRepository::create(&store, &new_user("élodie@example.org")).await.unwrap();

        assert!(store.email_exists("ÉLODIE@example.org", None).await.unwrap());
        assert!(store.get_by_email("Élodie@Example.org").await.unwrap().is_some());
        let err = UserRepository::create(&store, &new_user("ÉLODIE@EXAMPLE.ORG")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn allowance_is_checked_with_the_insert() {
        let store = MemoryStore::new();
        let one = BookingAllowance { max_upcoming: 1, ..roomy() };
        let first = BookingRepository::create(&store, &new_booking(1, 9, 10), one).await.unwrap();

        let err = BookingRepository::create(&store, &new_booking(2, 14, 15), one).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        // Bookings dated before `from` no longer count
        let later = BookingAllowance {
            from: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
            ..one
        };
        let second = BookingRepository::create(&store, &new_booking(2, 14, 15), later).await.unwrap();

        // Cancelled bookings free the allowance
        for id in [first.id, second.id] {
            store
                .transition(id, BookingStatus::Confirmed, BookingStatus::Cancelled)
                .await
                .unwrap();
        }
        BookingRepository::create(&store, &new_booking(3, 9, 10), one).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_a_plan_detaches_its_payments() {
        let store = MemoryStore::new();
        let plan = PlanRepository::create(
            &store,
            1,
            &CreatePlan {
                library_id: None,
                name: "Monthly".into(),
                description: None,
                price: Decimal::new(499, 2),
                duration_days: 30,
                max_active_bookings: 2,
            },
        )
        .await
        .unwrap();
        let payment = PaymentRepository::create(
            &store,
            &NewPayment {
                library_id: 1,
                user_id: 1,
                plan_id: Some(plan.id),
                amount: Decimal::new(499, 2),
                method: PaymentMethod::Cash,
                status: PaymentStatus::Completed,
                reference: Uuid::new_v4(),
                paid_at: Some(Utc::now()),
            },
        )
        .await
        .unwrap();

        PlanRepository::delete(&store, plan.id).await.unwrap();
        let payment = PaymentRepository::get_by_id(&store, payment.id).await.unwrap();
        assert_eq!(payment.plan_id, None);
    }
}
