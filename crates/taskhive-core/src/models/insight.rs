use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::WorkStatus;

/// Stored project summary
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: Uuid,
    pub project_id: Uuid,
    pub summary: String,
    pub generated_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Task counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub blocked: i64,
    pub todo: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: WorkStatus, count: i64) {
        self.total += count;
        match status {
            WorkStatus::Done => self.completed += count,
            WorkStatus::InProgress => self.in_progress += count,
            WorkStatus::Blocked => self.blocked += count,
            WorkStatus::Todo => self.todo += count,
        }
    }

    /// Build from `(status, count)` rows of a `GROUP BY status` query
    pub fn from_grouped<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (WorkStatus, i64)>,
    {
        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status, count);
        }
        counts
    }

    pub fn tally<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a WorkStatus>,
    {
        Self::from_grouped(statuses.into_iter().map(|status| (*status, 1)))
    }

    /// Share of completed tasks as a whole percentage (0 when there are none)
    pub fn completion_percentage(&self) -> i64 {
        percentage(self.completed, self.total)
    }
}

/// `part / whole` as a rounded percentage, 0 for an empty whole
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as i64
}

/// One task line fed to the summarizer
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct TaskDigest {
    pub title: String,
    pub status: WorkStatus,
    pub project: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub subtask_count: i64,
}

/// One project line fed to the summarizer
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ProjectDigest {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub task_count: i64,
}

/// Statistics behind the dashboard summary
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: i64,
    pub total_tasks: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub blocked: i64,
    pub todo: i64,
}

impl DashboardStats {
    pub fn new(total_projects: i64, tasks: StatusCounts) -> Self {
        DashboardStats {
            total_projects,
            total_tasks: tasks.total,
            completed: tasks.completed,
            in_progress: tasks.in_progress,
            blocked: tasks.blocked,
            todo: tasks.todo,
        }
    }

    pub fn completion_rate(&self) -> i64 {
        percentage(self.completed, self.total_tasks)
    }
}

/// Overall load carried by the user a project is assigned to
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeadWorkload {
    pub total_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub in_progress_tasks: i64,
}

impl TeamLeadWorkload {
    pub fn completion_rate(&self) -> i64 {
        percentage(self.completed_tasks, self.total_tasks)
    }
}

/// Statistics behind a project summary
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_tasks: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub blocked: i64,
    pub todo: i64,
    pub completion_percentage: i64,
    pub team_lead_workload: Option<TeamLeadWorkload>,
}

impl ProjectStats {
    pub fn new(counts: StatusCounts, team_lead_workload: Option<TeamLeadWorkload>) -> Self {
        ProjectStats {
            total_tasks: counts.total,
            completed: counts.completed,
            in_progress: counts.in_progress,
            blocked: counts.blocked,
            todo: counts.todo,
            completion_percentage: counts.completion_percentage(),
            team_lead_workload,
        }
    }
}

/// Completion of a single project, used in team-lead reviews
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompletion {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub assigned_to_id: Option<Uuid>,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

impl ProjectCompletion {
    pub fn completion_percentage(&self) -> i64 {
        percentage(self.completed_tasks, self.total_tasks)
    }
}

/// Statistics behind a team-lead review
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeadStats {
    pub total_projects: i64,
    pub manager_assigned_projects: i64,
    pub own_projects: i64,
    pub total_tasks: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub blocked: i64,
    pub todo: i64,
    pub overall_completion: i64,
}

impl TeamLeadStats {
    /// `projects` are those the lead owns or runs; `tasks` counts what they created or hold.
    pub fn new(lead_id: Uuid, projects: &[ProjectCompletion], tasks: StatusCounts) -> Self {
        let own = projects.iter().filter(|p| p.owner_id == lead_id).count() as i64;
        let manager_assigned = projects
            .iter()
            .filter(|p| p.assigned_to_id == Some(lead_id) && p.owner_id != lead_id)
            .count() as i64;
        TeamLeadStats {
            total_projects: projects.len() as i64,
            manager_assigned_projects: manager_assigned,
            own_projects: own,
            total_tasks: tasks.total,
            completed: tasks.completed,
            in_progress: tasks.in_progress,
            blocked: tasks.blocked,
            todo: tasks.todo,
            overall_completion: tasks.completion_percentage(),
        }
    }
}
