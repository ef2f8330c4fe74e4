use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::WorkStatus;
use crate::risk::TaskRisk;

/// Task entity. A non-null `parent_task_id` marks the row as a subtask.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    /// Null for personal/standalone tasks
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub parent_task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }
}

/// Task as returned to clients: the row, its derived risk and the subtasks the
/// requester is allowed to see.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub risk: TaskRisk,
    pub subtasks: Vec<Task>,
}

/// Lighter projection returned for `?summary=true`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub status: WorkStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        TaskSummary {
            id: task.id,
            title: task.title.clone(),
            status: task.status,
            due_date: task.due_date,
            project_id: task.project_id,
            assignee_id: task.assignee_id,
        }
    }
}

/// Fields of a task about to be inserted
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub project_id: Option<Uuid>,
    pub assignee_id: Uuid,
    pub creator_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub parent_task_id: Option<Uuid>,
}

/// Partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.assignee_id.is_none()
    }

    /// Whether anything besides status is being changed
    pub fn touches_content(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.due_date.is_some()
    }
}
