//! Maintenance tasks service (staff only)

use validator::Validate;

use super::{ensure_visible, target_library};
use crate::{
    error::AppResult,
    models::{
        maintenance::{CreateTask, MaintenanceTask, TaskQuery, UpdateTask},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct MaintenanceService {
    repository: Repository,
}

impl MaintenanceService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn visible_task(&self, claims: &UserClaims, id: i32) -> AppResult<MaintenanceTask> {
        claims.require_staff()?;
        let task = self.repository.maintenance.get_by_id(id).await?;
        ensure_visible(claims, Some(task.library_id), "Maintenance task", id)?;
        Ok(task)
    }

    pub async fn search(&self, claims: &UserClaims, query: &TaskQuery) -> AppResult<(Vec<MaintenanceTask>, i64)> {
        claims.require_staff()?;
        let mut query = query.clone();
        query.library_id = claims.list_scope(query.library_id);

        let tasks = self.repository.maintenance.list(query.library_id).await?;
        let matching: Vec<MaintenanceTask> = tasks.into_iter().filter(|t| query.matches(t)).collect();
        Ok(query.page_params().apply(matching))
    }

    pub async fn get_by_id(&self, claims: &UserClaims, id: i32) -> AppResult<MaintenanceTask> {
        self.visible_task(claims, id).await
    }

    pub async fn create(&self, claims: &UserClaims, data: CreateTask) -> AppResult<MaintenanceTask> {
        claims.require_staff()?;
        data.validate()?;
        let library_id = target_library(&self.repository, claims, data.library_id).await?;

        let task = self.repository.maintenance.create(library_id, &data).await?;
        tracing::info!(task_id = task.id, library_id, priority = %task.priority, "Maintenance task filed");
        Ok(task)
    }

    pub async fn update(&self, claims: &UserClaims, id: i32, data: UpdateTask) -> AppResult<MaintenanceTask> {
        data.validate()?;
        self.visible_task(claims, id).await?;

        let task = self.repository.maintenance.update(id, &data).await?;
        tracing::info!(task_id = id, status = %task.status, "Maintenance task updated");
        Ok(task)
    }

    pub async fn delete(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        self.visible_task(claims, id).await?;
        self.repository.maintenance.delete(id).await?;
        tracing::info!(task_id = id, "Maintenance task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        error::AppError,
        models::enums::{Role, TaskPriority, TaskStatus},
        repository::MockPorts,
    };

    fn claims(role: Role) -> UserClaims {
        UserClaims {
            sub: "staff@example.org".into(),
            user_id: 1,
            role,
            library_id: Some(1),
            exp: Utc::now().timestamp() + 600,
            iat: Utc::now().timestamp(),
        }
    }

    fn task(id: i32, library_id: i32, priority: TaskPriority) -> MaintenanceTask {
        MaintenanceTask {
            id,
            library_id,
            title: format!("Task {id}"),
            description: None,
            priority,
            status: TaskStatus::Pending,
            assigned_to: None,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn members_are_refused() {
        let mut mocks = MockPorts::default();
        mocks.maintenance.expect_list().never();
        let err = MaintenanceService::new(mocks.into())
            .search(&claims(Role::Member), &TaskQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn filter_by_priority() {
        let mut mocks = MockPorts::default();
        mocks.maintenance.expect_list().returning(|_| {
            Ok(vec![
                task(1, 1, TaskPriority::Low),
                task(2, 1, TaskPriority::Urgent),
                task(3, 1, TaskPriority::Urgent),
            ])
        });
        let query = TaskQuery { priority: Some(TaskPriority::Urgent), ..Default::default() };
        let (tasks, total) = MaintenanceService::new(mocks.into())
            .search(&claims(Role::Admin), &query)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(tasks.iter().all(|t| t.priority == TaskPriority::Urgent));
    }

    #[tokio::test]
    async fn foreign_task_cannot_be_deleted() {
        let mut mocks = MockPorts::default();
        mocks
            .maintenance
            .expect_get_by_id()
            .returning(|id| Ok(task(id, 2, TaskPriority::High)));
        mocks.maintenance.expect_delete().never();

        let err = MaintenanceService::new(mocks.into())
            .delete(&claims(Role::Admin), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
