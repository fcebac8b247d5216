//! Users repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Membership, NewUser, UpdateUser, User, UserRow},
};

/// Storage port for user accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get user by ID, `NotFound` when absent
    async fn get_by_id(&self, id: i32) -> AppResult<User>;

    /// Case-insensitive email lookup
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Whether another account already uses `email`
    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool>;

    /// Every user of a library, or of all libraries when `None`
    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<User>>;

    async fn create(&self, user: &NewUser) -> AppResult<User>;

    /// Apply the set fields of `changes`; `password_hash` replaces the stored hash
    async fn update(&self, id: i32, changes: &UpdateUser, password_hash: Option<String>) -> AppResult<User>;

    async fn set_membership(&self, id: i32, membership: Option<Membership>) -> AppResult<User>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count_by_plan(&self, plan_id: i32) -> AppResult<i64>;

    async fn count_by_library(&self, library_id: i32) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::INT IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list(&self, library_id: Option<i32>) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE ($1::INT IS NULL OR library_id = $1) ORDER BY id",
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (library_id, name, email, password, role, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user.library_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("Email is already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;
        Ok(row.into())
    }

    async fn update(&self, id: i32, changes: &UpdateUser, password_hash: Option<String>) -> AppResult<User> {
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(changes.name, "name");
        add_field!(changes.email, "email");
        add_field!(password_hash, "password");
        add_field!(changes.role, "role");
        add_field!(changes.phone, "phone");
        add_field!(changes.is_active, "is_active");

        let query = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, UserRow>(&query).bind(Utc::now());

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.name);
        bind_field!(changes.email);
        bind_field!(password_hash);
        bind_field!(changes.role);
        bind_field!(changes.phone);
        bind_field!(changes.is_active);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn set_membership(&self, id: i32, membership: Option<Membership>) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET plan_id = $1, membership_start = $2, membership_end = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(membership.as_ref().map(|m| m.plan_id))
        .bind(membership.as_ref().map(|m| m.start_date))
        .bind(membership.as_ref().map(|m| m.end_date))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from)
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    async fn count_by_plan(&self, plan_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE plan_id = $1")
            .bind(plan_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_library(&self, library_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE library_id = $1")
            .bind(library_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
