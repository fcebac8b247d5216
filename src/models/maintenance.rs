//! Maintenance task model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    enums::{TaskPriority, TaskStatus},
    search::{matches_text, PageParams},
};

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceTask {
    pub id: i32,
    pub library_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceTask {
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Completed
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date.map_or(false, |d| d < today)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTask {
    /// Required when a super-admin files the task
    pub library_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Maintenance list filter
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaskQuery {
    /// Matches title, description or assignee
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub library_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl TaskQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams { page: self.page, per_page: self.per_page }
    }

    pub fn matches(&self, task: &MaintenanceTask) -> bool {
        matches_text(
            self.search.as_deref(),
            [Some(task.title.as_str()), task.description.as_deref(), task.assigned_to.as_deref()],
        ) && self.status.map_or(true, |s| s == task.status)
            && self.priority.map_or(true, |p| p == task.priority)
            && self.library_id.map_or(true, |l| l == task.library_id)
    }
}
