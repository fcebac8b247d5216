//! Libraries (tenants) service

use validator::Validate;

use super::ensure_visible;
use crate::{
    error::{AppError, AppResult},
    models::{
        library::{CreateLibrary, Library, UpdateLibrary},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LibrariesService {
    repository: Repository,
}

impl LibrariesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All libraries for super-admins, the caller's own library otherwise
    pub async fn list(&self, claims: &UserClaims) -> AppResult<Vec<Library>> {
        let libraries = self.repository.libraries.list().await?;
        Ok(libraries.into_iter().filter(|l| claims.can_see(Some(l.id))).collect())
    }

    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<Library> {
        ensure_visible(claims, Some(id), "Library", id)?;
        self.repository.libraries.get_by_id(id).await
    }

    pub async fn create(&self, claims: &UserClaims, data: CreateLibrary) -> AppResult<Library> {
        claims.require_super_admin()?;
        data.validate()?;
        let library = self.repository.libraries.create(&data).await?;
        tracing::info!(library_id = library.id, name = %library.name, "Library created");
        Ok(library)
    }

    pub async fn update(&self, claims: &UserClaims, id: i32, data: UpdateLibrary) -> AppResult<Library> {
        claims.require_super_admin()?;
        data.validate()?;
        let library = self.repository.libraries.update(id, &data).await?;
        tracing::info!(library_id = id, "Library updated");
        Ok(library)
    }

    /// Delete an empty library
    pub async fn delete(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require_super_admin()?;
        self.repository.libraries.get_by_id(id).await?;

        let users = self.repository.users.count_by_library(id).await?;
        if users > 0 {
            return Err(AppError::Conflict(format!(
                "Library {} still has {} user(s)",
                id, users
            )));
        }

        self.repository.libraries.delete(id).await?;
        tracing::info!(library_id = id, "Library deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        models::enums::Role,
        repository::{libraries::MockLibraryRepository, users::MockUserRepository, MockPorts},
    };

    fn claims(role: Role, library_id: Option<i32>) -> UserClaims {
        UserClaims {
            sub: "x@example.org".into(),
            user_id: 1,
            role,
            library_id,
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
        }
    }

    fn library(id: i32) -> Library {
        Library {
            id,
            name: format!("Library {id}"),
            address: None,
            total_seats: 40,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn service(users: MockUserRepository, libraries: MockLibraryRepository) -> LibrariesService {
        LibrariesService::new(MockPorts { users, libraries, ..Default::default() }.into())
    }

    #[tokio::test]
    async fn admin_only_lists_own_library() {
        let mut libraries = MockLibraryRepository::new();
        libraries
            .expect_list()
            .returning(|| Ok(vec![library(1), library(2), library(3)]));
        let service = service(MockUserRepository::new(), libraries);

        let seen = service.list(&claims(Role::Admin, Some(2))).await.unwrap();
        assert_eq!(seen.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2]);

        let all = service.list(&claims(Role::SuperAdmin, None)).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn library_with_users_cannot_be_deleted() {
        let mut libraries = MockLibraryRepository::new();
        libraries.expect_get_by_id().returning(|id| Ok(library(id)));
        libraries.expect_delete().never();
        let mut users = MockUserRepository::new();
        users.expect_count_by_library().returning(|_| Ok(3));

        let err = service(users, libraries)
            .delete(&claims(Role::SuperAdmin, None), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn admins_cannot_create_libraries() {
        let mut libraries = MockLibraryRepository::new();
        libraries.expect_create().never();
        let request = CreateLibrary {
            name: "Annex".into(),
            address: None,
            total_seats: 10,
        };
        let err = service(MockUserRepository::new(), libraries)
            .create(&claims(Role::Admin, Some(1)), request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }
}
