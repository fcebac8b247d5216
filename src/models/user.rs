//! User model and related types

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    enums::Role,
    search::{matches_text, PageParams},
};
use crate::error::AppError;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").unwrap());

/// A user's subscription to a membership plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Membership {
    pub plan_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Membership {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: i32,
    library_id: Option<i32>,
    name: String,
    email: String,
    password: String,
    role: Role,
    phone: Option<String>,
    plan_id: Option<i32>,
    membership_start: Option<NaiveDate>,
    membership_end: Option<NaiveDate>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let membership = match (row.plan_id, row.membership_start, row.membership_end) {
            (Some(plan_id), Some(start_date), Some(end_date)) => Some(Membership {
                plan_id,
                start_date,
                end_date,
            }),
            _ => None,
        };
        User {
            id: row.id,
            library_id: row.library_id,
            name: row.name,
            email: row.email,
            password: row.password,
            role: row.role,
            phone: row.phone,
            membership,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Full user model
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    /// Owning library; absent only for super-admins
    pub library_id: Option<i32>,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub membership: Option<Membership>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List projection; carries no password column at all
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub library_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub plan_id: Option<i32>,
    pub plan_name: Option<String>,
    pub membership_end: Option<NaiveDate>,
    pub is_active: bool,
}

impl UserShort {
    pub fn from_user(user: &User, plan_name: Option<String>) -> Self {
        UserShort {
            id: user.id,
            library_id: user.library_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone(),
            plan_id: user.membership.as_ref().map(|m| m.plan_id),
            plan_name,
            membership_end: user.membership.as_ref().map(|m| m.end_date),
            is_active: user.is_active,
        }
    }
}

/// User query parameters
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserQuery {
    /// Matches name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    /// Only honoured for super-admins; others are pinned to their library
    pub library_id: Option<i32>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl UserQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams { page: self.page, per_page: self.per_page }
    }

    pub fn matches(&self, user: &User) -> bool {
        matches_text(self.search.as_deref(), [Some(user.name.as_str()), Some(user.email.as_str())])
            && self.role.map_or(true, |r| r == user.role)
            && self.library_id.map_or(true, |l| user.library_id == Some(l))
            && self.is_active.map_or(true, |a| a == user.is_active)
    }
}

/// Create user request
///
/// `name`, `email` and `password` are optional at the serde level so that a
/// missing field is reported as a validation error rather than a body
/// rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    /// Defaults to member
    pub role: Option<Role>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    /// Required when a super-admin creates a library account
    pub library_id: Option<i32>,
}

/// Insert payload built by the users service once the request is checked
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub library_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
}

/// Update user request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Re-hashed before storage
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Assign a membership plan to a user
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignMembership {
    pub plan_id: i32,
    /// Defaults to today
    pub start_date: Option<NaiveDate>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub library_id: Option<i32>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::SuperAdmin)
    }

    /// Reject callers whose role is not listed
    pub fn require_roles(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Role '{}' may not perform this action",
                self.role
            )))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_roles(&[Role::Admin, Role::SuperAdmin])
    }

    pub fn require_super_admin(&self) -> Result<(), AppError> {
        self.require_roles(&[Role::SuperAdmin])
    }

    /// Library the caller is confined to; `None` means every library.
    pub fn scope(&self) -> Option<i32> {
        if self.is_super_admin() {
            None
        } else {
            self.library_id
        }
    }

    /// Library to list from: super-admins may narrow with `requested`,
    /// everyone else is pinned to their own library.
    pub fn list_scope(&self, requested: Option<i32>) -> Option<i32> {
        match self.scope() {
            None => requested,
            pinned => pinned,
        }
    }

    /// Whether a record owned by `library_id` is visible to the caller
    pub fn can_see(&self, library_id: Option<i32>) -> bool {
        self.is_super_admin() || (library_id.is_some() && library_id == self.library_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, library_id: Option<i32>) -> UserClaims {
        UserClaims {
            sub: "someone@example.org".into(),
            user_id: 7,
            role,
            library_id,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        }
    }

    fn user() -> User {
        User {
            id: 1,
            library_id: Some(3),
            name: "Émilie Durand".into(),
            email: "emilie@example.org".into(),
            password: "$argon2id$secret".into(),
            role: Role::Member,
            phone: None,
            membership: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "emilie@example.org");
    }

    #[test]
    fn token_roundtrip_and_wrong_secret() {
        let c = claims(Role::Admin, Some(3));
        let token = c.create_token("s3cret").unwrap();
        let parsed = UserClaims::from_token(&token, "s3cret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.role, Role::Admin);
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn role_guard() {
        let member = claims(Role::Member, Some(3));
        assert!(member.require_staff().is_err());
        assert!(claims(Role::Admin, Some(3)).require_staff().is_ok());
        assert!(claims(Role::Admin, Some(3)).require_super_admin().is_err());
    }

    #[test]
    fn tenancy_scope() {
        let admin = claims(Role::Admin, Some(3));
        assert_eq!(admin.list_scope(Some(9)), Some(3));
        assert!(admin.can_see(Some(3)));
        assert!(!admin.can_see(Some(4)));
        assert!(!admin.can_see(None));

        let root = claims(Role::SuperAdmin, None);
        assert_eq!(root.list_scope(Some(9)), Some(9));
        assert_eq!(root.list_scope(None), None);
        assert!(root.can_see(Some(4)));
    }

    #[test]
    fn query_filters_combine_with_and() {
        let u = user();
        assert!(UserQuery::default().matches(&u));
        assert!(UserQuery { search: Some("emilie".into()), ..Default::default() }.matches(&u));
        assert!(UserQuery {
            search: Some("durand".into()),
            role: Some(Role::Member),
            is_active: Some(true),
            ..Default::default()
        }
        .matches(&u));
        assert!(!UserQuery {
            search: Some("durand".into()),
            role: Some(Role::Admin),
            ..Default::default()
        }
        .matches(&u));
    }

    #[test]
    fn create_user_validation() {
        let bad = CreateUser {
            name: Some("A".into()),
            email: Some("not-an-email".into()),
            password: Some("123".into()),
            phone: Some("call me".into()),
            ..Default::default()
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("phone"));

        let good = CreateUser {
            name: Some("Ada".into()),
            email: Some("ada@example.org".into()),
            password: Some("correct horse".into()),
            phone: Some("+33 6 12 34 56 78".into()),
            ..Default::default()
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn membership_window() {
        let m = Membership {
            plan_id: 1,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        };
        assert!(m.is_active_on(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()));
        assert!(!m.is_active_on(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
    }
}
