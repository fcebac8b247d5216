//! Data models for Bibliodesk

pub mod book;
pub mod booking;
pub mod dashboard;
pub mod enums;
pub mod library;
pub mod maintenance;
pub mod payment;
pub mod plan;
pub mod search;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use booking::SeatBooking;
pub use enums::{BookingStatus, PaymentMethod, PaymentStatus, Role, TaskPriority, TaskStatus};
pub use library::Library;
pub use maintenance::MaintenanceTask;
pub use payment::{Payment, PaymentSummary};
pub use plan::{MembershipDetails, MembershipPlan};
pub use user::{User, UserClaims, UserShort};
