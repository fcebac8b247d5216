//! User management service

use std::collections::HashMap;

use chrono::{Duration, Utc};
use validator::Validate;

use super::{auth::hash_password, ensure_visible, target_library};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        plan::MembershipDetails,
        user::{AssignMembership, CreateUser, Membership, NewUser, UpdateUser, User, UserClaims, UserQuery, UserShort},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Fetch a user the caller is allowed to see.
    ///
    /// Members only see themselves; staff see their library; super-admins
    /// see everyone.
    async fn visible_user(&self, claims: &UserClaims, id: i32) -> AppResult<User> {
        if claims.role == Role::Member && claims.user_id != id {
            return Err(AppError::Authorization("Members can only access their own account".to_string()));
        }
        let user = self.repository.users.get_by_id(id).await?;
        if claims.user_id != id {
            ensure_visible(claims, user.library_id, "User with id", id)?;
        }
        Ok(user)
    }

    /// Get the authenticated user's own record
    pub async fn me(&self, claims: &UserClaims) -> AppResult<User> {
        self.repository.users.get_by_id(claims.user_id).await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<User> {
        self.visible_user(claims, id).await
    }

    /// Search users within the caller's scope, ordered by name.
    ///
    /// Text matching is accent- and case-insensitive on name and email.
    pub async fn search_users(&self, claims: &UserClaims, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        let mut query = query.clone();
        query.library_id = claims.list_scope(query.library_id);

        let mut users: Vec<User> = self
            .repository
            .users
            .list(query.library_id)
            .await?
            .into_iter()
            .filter(|u| query.matches(u))
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let (page, total) = query.page_params().apply(users);

        let plan_names: HashMap<i32, String> = if page.iter().any(|u| u.membership.is_some()) {
            self.repository
                .plans
                .list(query.library_id)
                .await?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect()
        } else {
            HashMap::new()
        };

        let shorts = page
            .iter()
            .map(|u| {
                let plan_name = u.membership.as_ref().and_then(|m| plan_names.get(&m.plan_id).cloned());
                UserShort::from_user(u, plan_name)
            })
            .collect();
        Ok((shorts, total))
    }

    /// Create a new user
    pub async fn create_user(&self, claims: &UserClaims, user: CreateUser) -> AppResult<User> {
        let (name, email, password) = match (&user.name, &user.email, &user.password) {
            (Some(n), Some(e), Some(p)) if !n.trim().is_empty() && !e.trim().is_empty() && !p.is_empty() => {
                (n.trim().to_string(), e.trim().to_string(), p.clone())
            }
            _ => {
                return Err(AppError::Validation(
                    "Name, email and password are required".to_string(),
                ))
            }
        };
        user.validate()?;

        let role = user.role.unwrap_or(Role::Member);
        if role == Role::SuperAdmin && !claims.is_super_admin() {
            return Err(AppError::Authorization(
                "Only super-admins can create super-admin accounts".to_string(),
            ));
        }

        let library_id = if role == Role::SuperAdmin {
            None
        } else {
            Some(target_library(&self.repository, claims, user.library_id).await?)
        };

        if self.repository.users.email_exists(&email, None).await? {
            return Err(AppError::Validation("Email is already registered".to_string()));
        }

        let new_user = NewUser {
            library_id,
            name,
            email,
            password_hash: hash_password(&password)?,
            role,
            phone: user.phone,
        };

        let created = self.repository.users.create(&new_user).await?;
        tracing::info!(user_id = created.id, role = %created.role, library_id = ?created.library_id, "User created");
        Ok(created)
    }

    /// Update an existing user
    pub async fn update_user(&self, claims: &UserClaims, id: i32, user: UpdateUser) -> AppResult<User> {
        user.validate()?;
        let existing = self.visible_user(claims, id).await?;

        if claims.role == Role::Member && (user.role.is_some() || user.is_active.is_some()) {
            return Err(AppError::Authorization(
                "Members cannot change their role or account status".to_string(),
            ));
        }
        if !claims.is_super_admin() {
            if user.role == Some(Role::SuperAdmin) {
                return Err(AppError::Authorization(
                    "Only super-admins can grant the super-admin role".to_string(),
                ));
            }
            if existing.role == Role::SuperAdmin {
                return Err(AppError::NotFound(format!("User with id {} not found", id)));
            }
        }
        if let Some(role) = user.role {
            if (role == Role::SuperAdmin) != (existing.role == Role::SuperAdmin) {
                return Err(AppError::BusinessRule(
                    "Accounts cannot move between library and super-admin roles".to_string(),
                ));
            }
        }

        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email.trim(), Some(id)).await? {
                return Err(AppError::Validation("Email is already registered".to_string()));
            }
        }

        let password = match user.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        let updated = self.repository.users.update(id, &user, password).await?;
        tracing::info!(user_id = id, "User updated");
        Ok(updated)
    }

    /// Delete a user
    pub async fn delete_user(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        if claims.user_id == id {
            return Err(AppError::BusinessRule("You cannot delete your own account".to_string()));
        }
        let existing = self.visible_user(claims, id).await?;
        if existing.role == Role::SuperAdmin && !claims.is_super_admin() {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        self.repository.users.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Membership of a user, joined with its plan
    pub async fn get_membership(&self, claims: &UserClaims, id: i32) -> AppResult<MembershipDetails> {
        let user = self.visible_user(claims, id).await?;
        let today = Utc::now().date_naive();

        let membership = match user.membership {
            Some(m) => m,
            None => {
                return Ok(MembershipDetails {
                    user_id: user.id,
                    plan: None,
                    start_date: None,
                    end_date: None,
                    is_active: false,
                    days_remaining: 0,
                })
            }
        };

        let plan = match self.repository.plans.get_by_id(membership.plan_id).await {
            Ok(plan) => Some(plan),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let is_active = membership.is_active_on(today);
        let days_remaining = if membership.end_date >= today {
            (membership.end_date - today.max(membership.start_date)).num_days() + 1
        } else {
            0
        };

        Ok(MembershipDetails {
            user_id: user.id,
            plan,
            start_date: Some(membership.start_date),
            end_date: Some(membership.end_date),
            is_active,
            days_remaining,
        })
    }

    /// Subscribe a user to a plan of their library
    pub async fn assign_membership(
        &self,
        claims: &UserClaims,
        id: i32,
        request: AssignMembership,
    ) -> AppResult<MembershipDetails> {
        let user = self.visible_user(claims, id).await?;
        let plan = self.repository.plans.get_by_id(request.plan_id).await?;

        if user.library_id != Some(plan.library_id) {
            return Err(AppError::NotFound(format!("Membership plan {} not found", request.plan_id)));
        }
        if !plan.is_active {
            return Err(AppError::BusinessRule(format!("Plan '{}' is no longer offered", plan.name)));
        }

        let start_date = request.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let end_date = start_date
            .checked_add_signed(Duration::days(i64::from(plan.duration_days) - 1))
            .ok_or_else(|| AppError::Validation(format!("Start date {} is out of range", start_date)))?;

        self.repository
            .users
            .set_membership(
                id,
                Some(Membership {
                    plan_id: plan.id,
                    start_date,
                    end_date,
                }),
            )
            .await?;
        tracing::info!(user_id = id, plan_id = plan.id, %start_date, %end_date, "Membership assigned");

        self.get_membership(claims, id).await
    }

    /// Create the configured super-admin unless that email is already taken
    pub async fn ensure_super_admin(&self, name: &str, email: &str, password: &str) -> AppResult<Option<User>> {
        if self.repository.users.email_exists(email, None).await? {
            return Ok(None);
        }
        let created = self
            .repository
            .users
            .create(&NewUser {
                library_id: None,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                role: Role::SuperAdmin,
                phone: None,
            })
            .await?;
        tracing::info!(user_id = created.id, "Bootstrap super-admin created");
        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{users::MockUserRepository, MockPorts};

    fn repository(users: MockUserRepository) -> Repository {
        MockPorts { users, ..Default::default() }.into()
    }

    fn admin() -> UserClaims {
        UserClaims {
            sub: "admin@example.org".into(),
            user_id: 1,
            role: Role::Admin,
            library_id: Some(10),
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
        }
    }

    fn stored_user(id: i32, library_id: Option<i32>, role: Role) -> User {
        User {
            id,
            library_id,
            name: "Stored".into(),
            email: format!("u{id}@example.org"),
            password: "hash".into(),
            role,
            phone: None,
            membership: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_request() -> CreateUser {
        CreateUser {
            name: Some("Lina".into()),
            email: Some("lina@example.org".into()),
            password: Some("hunter22".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_insert() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().returning(|_, _| Ok(true));
        users.expect_create().never();

        let service = UsersService::new(repository(users));
        let err = service.create_user(&admin(), create_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("already registered")));
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_storage() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().never();
        users.expect_create().never();
        let service = UsersService::new(repository(users));

        for request in [
            CreateUser { name: None, ..create_request() },
            CreateUser { email: None, ..create_request() },
            CreateUser { password: None, ..create_request() },
            CreateUser { name: Some("  ".into()), ..create_request() },
        ] {
            let err = service.create_user(&admin(), request).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn admin_creates_members_in_own_library_with_hashed_password() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().returning(|_, _| Ok(false));
        users
            .expect_create()
            .withf(|u: &NewUser| {
                u.library_id == Some(10)
                    && u.role == Role::Member
                    && u.password_hash.starts_with("$argon2")
                    && u.password_hash != "hunter22"
            })
            .returning(|u| {
                let mut user = stored_user(5, u.library_id, u.role);
                user.password = u.password_hash.clone();
                Ok(user)
            });

        let service = UsersService::new(repository(users));
        let created = service.create_user(&admin(), create_request()).await.unwrap();
        assert_eq!(created.library_id, Some(10));
    }

    #[tokio::test]
    async fn admin_cannot_create_super_admin() {
        let service = UsersService::new(repository(MockUserRepository::new()));
        let request = CreateUser { role: Some(Role::SuperAdmin), ..create_request() };
        let err = service.create_user(&admin(), request).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn update_rehashes_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_by_id()
            .returning(|id| Ok(stored_user(id, Some(10), Role::Member)));
        users
            .expect_update()
            .withf(|_, _, hash: &Option<String>| {
                hash.as_deref().map_or(false, |h| h.starts_with("$argon2") && h != "new-secret")
            })
            .returning(|id, _, _| Ok(stored_user(id, Some(10), Role::Member)));

        let service = UsersService::new(repository(users));
        let update = UpdateUser { password: Some("new-secret".into()), ..Default::default() };
        service.update_user(&admin(), 5, update).await.unwrap();
    }

    #[tokio::test]
    async fn other_library_reads_as_not_found() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_by_id()
            .returning(|id| Ok(stored_user(id, Some(99), Role::Member)));
        users.expect_delete().never();

        let service = UsersService::new(repository(users));
        assert!(matches!(service.get_by_id(&admin(), 5).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete_user(&admin(), 5).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_user_is_not_found_for_membership() {
        let mut users = MockUserRepository::new();
        users
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("User with id {} not found", id))));

        let service = UsersService::new(repository(users));
        assert!(matches!(service.get_membership(&admin(), 42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn member_cannot_read_someone_else() {
        let service = UsersService::new(repository(MockUserRepository::new()));
        let member = UserClaims { role: Role::Member, user_id: 3, ..admin() };
        assert!(matches!(service.get_by_id(&member, 4).await, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn membership_end_past_calendar_limit_is_rejected() {
        use crate::models::plan::MembershipPlan;
        use chrono::NaiveDate;

        let mut mocks = MockPorts::default();
        mocks
            .users
            .expect_get_by_id()
            .returning(|id| Ok(stored_user(id, Some(10), Role::Member)));
        mocks.users.expect_set_membership().never();
        mocks.plans.expect_get_by_id().returning(|id| {
            Ok(MembershipPlan {
                id,
                library_id: 10,
                name: "Yearly".into(),
                description: None,
                price: rust_decimal::Decimal::new(100, 0),
                duration_days: 365,
                max_active_bookings: 3,
                is_active: true,
                created_at: Utc::now(),
            })
        });

        let request = AssignMembership {
            plan_id: 1,
            start_date: Some(NaiveDate::MAX),
        };
        let err = UsersService::new(mocks.into())
            .assign_membership(&admin(), 5, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn search_folds_accents_and_pages_by_name() {
        let mut users = MockUserRepository::new();
        users.expect_list().withf(|l| *l == Some(10)).returning(|_| {
            let mut emilie = stored_user(2, Some(10), Role::Member);
            emilie.name = "Émilie Durand".into();
            let mut bruno = stored_user(3, Some(10), Role::Member);
            bruno.name = "Bruno".into();
            let mut amelie = stored_user(4, Some(10), Role::Member);
            amelie.name = "Amélie Durand".into();
            Ok(vec![emilie, bruno, amelie])
        });

        let service = UsersService::new(repository(users));
        let query = UserQuery { search: Some("DURAND".into()), ..Default::default() };
        let (page, total) = service.search_users(&admin(), &query).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.iter().map(|u| u.id).collect::<Vec<_>>(), vec![4, 2]);

        let query = UserQuery { search: Some("%".into()), ..Default::default() };
        let (_, total) = service.search_users(&admin(), &query).await.unwrap();
        assert_eq!(total, 0);
    }
}
