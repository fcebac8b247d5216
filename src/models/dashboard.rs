//! Dashboard widgets: counts and percentages derived from a library's records

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::{
    book::Book,
    booking::SeatBooking,
    enums::{BookingStatus, Role, TaskPriority},
    library::Library,
    maintenance::MaintenanceTask,
    payment::{Payment, PaymentSummary},
    plan::MembershipPlan,
    search::percentage,
    user::User,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserStats {
    pub total: i64,
    pub members: i64,
    pub admins: i64,
    /// Members whose membership covers today
    pub active_members: i64,
    pub active_member_percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookStats {
    pub titles: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub availability_percentage: f64,
    #[schema(value_type = Object)]
    pub titles_by_category: IndexMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeatStats {
    pub total_seats: i64,
    /// Distinct seats holding a confirmed booking today
    pub booked_today: i64,
    pub occupancy_percentage: f64,
    /// Confirmed bookings dated after today
    pub upcoming_bookings: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaintenanceStats {
    pub open: i64,
    pub overdue: i64,
    #[schema(value_type = Object)]
    pub open_by_priority: IndexMap<TaskPriority, i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanShare {
    pub plan_id: i32,
    pub plan_name: String,
    pub subscribers: i64,
    /// Share of members subscribed to this plan
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Library the figures cover; absent when aggregated over all libraries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_id: Option<i32>,
    pub generated_at: DateTime<Utc>,
    pub users: UserStats,
    pub books: BookStats,
    pub seats: SeatStats,
    pub maintenance: MaintenanceStats,
    pub memberships: Vec<PlanShare>,
    pub payments: PaymentSummary,
}

/// Records the dashboard is computed from, already scoped to the caller
pub struct DashboardInputs<'a> {
    pub library_id: Option<i32>,
    pub libraries: &'a [Library],
    pub users: &'a [User],
    pub plans: &'a [MembershipPlan],
    pub books: &'a [Book],
    pub bookings: &'a [SeatBooking],
    pub tasks: &'a [MaintenanceTask],
    pub payments: &'a [Payment],
}

impl DashboardStats {
    pub fn compute(inputs: &DashboardInputs<'_>, today: NaiveDate) -> Self {
        DashboardStats {
            library_id: inputs.library_id,
            generated_at: Utc::now(),
            users: user_stats(inputs.users, today),
            books: book_stats(inputs.books),
            seats: seat_stats(inputs.libraries, inputs.bookings, today),
            maintenance: maintenance_stats(inputs.tasks, today),
            memberships: plan_shares(inputs.plans, inputs.users),
            payments: PaymentSummary::from_payments(inputs.payments),
        }
    }
}

fn user_stats(users: &[User], today: NaiveDate) -> UserStats {
    let members: Vec<&User> = users.iter().filter(|u| u.role == Role::Member).collect();
    let active_members = members
        .iter()
        .filter(|u| u.is_active && u.membership.as_ref().map_or(false, |m| m.is_active_on(today)))
        .count() as i64;
    let member_count = members.len() as i64;

    UserStats {
        total: users.len() as i64,
        members: member_count,
        admins: users.iter().filter(|u| u.role == Role::Admin).count() as i64,
        active_members,
        active_member_percentage: percentage(active_members, member_count),
    }
}

fn book_stats(books: &[Book]) -> BookStats {
    let total_copies: i64 = books.iter().map(|b| i64::from(b.total_copies)).sum();
    let available_copies: i64 = books.iter().map(|b| i64::from(b.available_copies)).sum();

    let mut titles_by_category: IndexMap<String, i64> = IndexMap::new();
    for book in books {
        let category = book.category.clone().unwrap_or_else(|| "uncategorized".to_string());
        *titles_by_category.entry(category).or_insert(0) += 1;
    }
    titles_by_category.sort_by(|ka, va, kb, vb| vb.cmp(va).then_with(|| ka.cmp(kb)));

    BookStats {
        titles: books.len() as i64,
        total_copies,
        available_copies,
        availability_percentage: percentage(available_copies, total_copies),
        titles_by_category,
    }
}

fn seat_stats(libraries: &[Library], bookings: &[SeatBooking], today: NaiveDate) -> SeatStats {
    let total_seats: i64 = libraries
        .iter()
        .filter(|l| l.is_active)
        .map(|l| i64::from(l.total_seats))
        .sum();

    let confirmed = bookings.iter().filter(|b| b.status == BookingStatus::Confirmed);
    let booked_today = confirmed
        .clone()
        .filter(|b| b.booking_date == today)
        .map(|b| (b.library_id, b.seat_number))
        .collect::<BTreeSet<_>>()
        .len() as i64;
    let upcoming_bookings = confirmed.filter(|b| b.booking_date > today).count() as i64;

    SeatStats {
        total_seats,
        booked_today,
        occupancy_percentage: percentage(booked_today, total_seats),
        upcoming_bookings,
    }
}

fn maintenance_stats(tasks: &[MaintenanceTask], today: NaiveDate) -> MaintenanceStats {
    let mut open_by_priority: IndexMap<TaskPriority, i64> = TaskPriority::ALL
        .iter()
        .rev()
        .map(|p| (*p, 0))
        .collect();
    for task in tasks.iter().filter(|t| t.is_open()) {
        *open_by_priority.entry(task.priority).or_insert(0) += 1;
    }

    MaintenanceStats {
        open: tasks.iter().filter(|t| t.is_open()).count() as i64,
        overdue: tasks.iter().filter(|t| t.is_overdue(today)).count() as i64,
        open_by_priority,
    }
}

fn plan_shares(plans: &[MembershipPlan], users: &[User]) -> Vec<PlanShare> {
    let members: Vec<&User> = users.iter().filter(|u| u.role == Role::Member).collect();
    let mut subscribers: HashMap<i32, i64> = HashMap::new();
    for member in &members {
        if let Some(m) = &member.membership {
            *subscribers.entry(m.plan_id).or_insert(0) += 1;
        }
    }

    let mut shares: Vec<PlanShare> = plans
        .iter()
        .map(|plan| {
            let count = subscribers.get(&plan.id).copied().unwrap_or(0);
            PlanShare {
                plan_id: plan.id,
                plan_name: plan.name.clone(),
                subscribers: count,
                percentage: percentage(count, members.len() as i64),
            }
        })
        .collect();
    shares.sort_by(|a, b| b.subscribers.cmp(&a.subscribers).then_with(|| a.plan_id.cmp(&b.plan_id)));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{enums::TaskStatus, user::Membership};
    use chrono::NaiveTime;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn library(seats: i32) -> Library {
        Library {
            id: 1,
            name: "Central".into(),
            address: None,
            total_seats: seats,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn member(id: i32, plan_id: Option<i32>, end: NaiveDate) -> User {
        User {
            id,
            library_id: Some(1),
            name: format!("member {id}"),
            email: format!("m{id}@example.org"),
            password: String::new(),
            role: Role::Member,
            phone: None,
            membership: plan_id.map(|plan_id| Membership {
                plan_id,
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: end,
            }),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn plan(id: i32, name: &str) -> MembershipPlan {
        MembershipPlan {
            id,
            library_id: 1,
            name: name.into(),
            description: None,
            price: Decimal::new(49900, 2),
            duration_days: 30,
            max_active_bookings: 3,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn booking(seat: i32, date: NaiveDate, status: BookingStatus) -> SeatBooking {
        SeatBooking {
            id: seat,
            library_id: 1,
            user_id: 1,
            seat_number: seat,
            booking_date: date,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn widgets_compute_percentages() {
        let libraries = vec![library(8)];
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let users = vec![member(1, Some(1), far), member(2, Some(2), far), member(3, Some(1), past)];
        let plans = vec![plan(1, "Basic"), plan(2, "Premium")];
        let tomorrow = today().succ_opt().unwrap();
        let bookings = vec![
            booking(1, today(), BookingStatus::Confirmed),
            booking(2, today(), BookingStatus::Cancelled),
            booking(3, tomorrow, BookingStatus::Confirmed),
        ];
        let tasks = vec![MaintenanceTask {
            id: 1,
            library_id: 1,
            title: "Leaking roof".into(),
            description: None,
            priority: TaskPriority::Urgent,
            status: TaskStatus::Pending,
            assigned_to: None,
            due_date: NaiveDate::from_ymd_opt(2026, 10, 1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];

        let stats = DashboardStats::compute(
            &DashboardInputs {
                library_id: Some(1),
                libraries: &libraries,
                users: &users,
                plans: &plans,
                books: &[],
                bookings: &bookings,
                tasks: &tasks,
                payments: &[],
            },
            today(),
        );

        assert_eq!(stats.users.members, 3);
        assert_eq!(stats.users.active_members, 2);
        assert_eq!(stats.users.active_member_percentage, 66.7);
        assert_eq!(stats.seats.booked_today, 1);
        assert_eq!(stats.seats.occupancy_percentage, 12.5);
        assert_eq!(stats.seats.upcoming_bookings, 1);
        assert_eq!(stats.books.availability_percentage, 0.0);
        assert_eq!(stats.maintenance.open, 1);
        assert_eq!(stats.maintenance.overdue, 1);
        assert_eq!(stats.maintenance.open_by_priority[&TaskPriority::Urgent], 1);
        assert_eq!(stats.memberships[0].plan_name, "Basic");
        assert_eq!(stats.memberships[0].subscribers, 2);
        assert_eq!(stats.memberships[0].percentage, 66.7);
        assert_eq!(stats.memberships[1].percentage, 33.3);
    }
}
