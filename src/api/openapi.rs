//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, bookings, books, dashboard, health, libraries, maintenance, payments, plans, users, MessageResponse,
};

/// Registers the JWT bearer scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bibliodesk API",
        version = "0.1.0",
        description = "Multi-library membership, seat booking and catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::get_membership,
        users::assign_membership,
        // Libraries
        libraries::list_libraries,
        libraries::get_library,
        libraries::create_library,
        libraries::update_library,
        libraries::delete_library,
        // Plans
        plans::list_plans,
        plans::get_plan,
        plans::create_plan,
        plans::update_plan,
        plans::delete_plan,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Bookings
        bookings::list_bookings,
        bookings::get_booking,
        bookings::create_booking,
        bookings::cancel_booking,
        bookings::complete_booking,
        // Maintenance
        maintenance::list_tasks,
        maintenance::get_task,
        maintenance::create_task,
        maintenance::update_task,
        maintenance::delete_task,
        // Payments
        payments::list_payments,
        payments::payment_summary,
        payments::get_payment,
        payments::create_payment,
        payments::update_payment_status,
        // Stats
        dashboard::get_dashboard,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::Role,
            crate::models::enums::BookingStatus,
            crate::models::enums::TaskPriority,
            crate::models::enums::TaskStatus,
            crate::models::enums::PaymentMethod,
            crate::models::enums::PaymentStatus,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::Membership,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::AssignMembership,
            crate::models::plan::MembershipDetails,
            users::UserResponse,
            users::UsersResponse,
            users::MembershipResponse,
            // Libraries
            crate::models::library::Library,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            libraries::LibraryResponse,
            libraries::LibrariesResponse,
            // Plans
            crate::models::plan::MembershipPlan,
            crate::models::plan::CreatePlan,
            crate::models::plan::UpdatePlan,
            plans::PlanResponse,
            plans::PlansResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::BookResponse,
            books::BooksResponse,
            // Bookings
            crate::models::booking::SeatBooking,
            crate::models::booking::CreateBooking,
            bookings::BookingResponse,
            bookings::BookingsResponse,
            // Maintenance
            crate::models::maintenance::MaintenanceTask,
            crate::models::maintenance::CreateTask,
            crate::models::maintenance::UpdateTask,
            maintenance::TaskResponse,
            maintenance::TasksResponse,
            // Payments
            crate::models::payment::Payment,
            crate::models::payment::CreatePayment,
            crate::models::payment::UpdatePaymentStatus,
            crate::models::payment::PaymentSummary,
            payments::PaymentResponse,
            payments::PaymentsResponse,
            payments::PaymentSummaryResponse,
            // Stats
            crate::models::dashboard::DashboardStats,
            crate::models::dashboard::UserStats,
            crate::models::dashboard::BookStats,
            crate::models::dashboard::SeatStats,
            crate::models::dashboard::MaintenanceStats,
            crate::models::dashboard::PlanShare,
            dashboard::DashboardResponse,
            // Health
            health::HealthResponse,
            // Common
            MessageResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "libraries", description = "Library (tenant) management"),
        (name = "plans", description = "Membership plans"),
        (name = "books", description = "Book catalog"),
        (name = "bookings", description = "Reading-room seat bookings"),
        (name = "maintenance", description = "Maintenance tasks"),
        (name = "payments", description = "Membership payments"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in ["/users/{id}/membership", "/bookings/{id}/cancel", "/payments/summary", "/stats/dashboard"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
