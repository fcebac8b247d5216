//! Authentication service: password hashing and token issuance

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::Repository,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and password, returning a JWT and the user
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let user = match self.repository.users.get_by_email(email.trim()).await? {
            Some(user) => user,
            None => {
                tracing::warn!(email = %email, "Login attempt for unknown email");
                return Err(invalid());
            }
        };

        if !verify_password(&user.password, password)? {
            tracing::warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = user.id, role = %user.role, "User logged in");
        Ok((token, user))
    }

    /// Create JWT token for a user
    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            library_id: user.library_id,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// Decode and validate a bearer token
    pub fn decode_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Resolve a bearer token against the stored account.
    ///
    /// Role and library come from the account, not the token, so demotions
    /// and deactivations apply to tokens already issued.
    pub async fn authenticate(&self, token: &str) -> AppResult<UserClaims> {
        let mut claims = self.decode_token(token)?;

        let user = match self.repository.users.get_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };
        if !user.is_active {
            tracing::warn!(user_id = user.id, "Token presented for a disabled account");
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        claims.role = user.role;
        claims.library_id = user.library_id;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::enums::Role,
        repository::{users::MockUserRepository, MockPorts},
    };

    fn service(users: MockUserRepository) -> AuthService {
        AuthService::new(
            MockPorts { users, ..Default::default() }.into(),
            AuthConfig {
                jwt_secret: "test-secret".into(),
                jwt_expiration_hours: 1,
            },
        )
    }

    fn account(role: Role, is_active: bool) -> User {
        User {
            id: 7,
            library_id: Some(2),
            name: "Ines".into(),
            email: "ines@example.org".into(),
            password: String::new(),
            role,
            phone: None,
            membership: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn authenticate_uses_the_stored_role() {
        let mut users = MockUserRepository::new();
        users.expect_get_by_id().returning(|_| Ok(account(Role::Member, true)));
        let auth = service(users);

        let token = auth.create_token_for_user(&account(Role::Admin, true)).unwrap();
        let claims = auth.authenticate(&token).await.unwrap();
        assert_eq!(claims.role, Role::Member);
        assert_eq!(claims.library_id, Some(2));
    }

    #[tokio::test]
    async fn authenticate_rejects_disabled_and_deleted_accounts() {
        let mut users = MockUserRepository::new();
        users.expect_get_by_id().returning(|_| Ok(account(Role::Member, false)));
        let auth = service(users);
        let token = auth.create_token_for_user(&account(Role::Member, true)).unwrap();
        assert!(matches!(auth.authenticate(&token).await, Err(AppError::Authentication(_))));

        let mut users = MockUserRepository::new();
        users
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("User with id {} not found", id))));
        let auth = service(users);
        assert!(matches!(auth.authenticate(&token).await, Err(AppError::Authentication(_))));
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("open sesame").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "open sesame").unwrap());
        assert!(!verify_password(&hash, "open says me").unwrap());
    }

    #[test]
    fn garbage_hash_is_internal_error() {
        assert!(matches!(verify_password("plaintext", "plaintext"), Err(AppError::Internal(_))));
    }
}
