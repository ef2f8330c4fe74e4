use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Status shared by projects and tasks. Any value may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "work_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Todo => "TODO",
            WorkStatus::InProgress => "IN_PROGRESS",
            WorkStatus::Done => "DONE",
            WorkStatus::Blocked => "BLOCKED",
        }
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODO" => Ok(WorkStatus::Todo),
            "IN_PROGRESS" => Ok(WorkStatus::InProgress),
            "DONE" => Ok(WorkStatus::Done),
            "BLOCKED" => Ok(WorkStatus::Blocked),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Project entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: WorkStatus,
    /// Creator
    pub owner_id: Uuid,
    /// User responsible for execution
    pub assigned_to_id: Option<Uuid>,
    /// Null for INDIVIDUAL-owned and TEAM_LEAD-internal projects
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a project about to be inserted
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub assigned_to_id: Uuid,
    pub organization_id: Option<Uuid>,
}
