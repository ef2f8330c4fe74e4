//! Task risk scoring
//!
//! A task's risk is derived from its status and how close (or far past) its due
//! date is. Scores live in `[0, 1]` and are rounded to two decimals.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Task, WorkStatus};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Score at or above which a task counts as high risk in summaries
pub const HIGH_RISK_THRESHOLD: f64 = 0.8;

/// Tasks due within this many days count as "due soon"
pub const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskSeverity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            RiskSeverity::Critical
        } else if score >= 0.65 {
            RiskSeverity::High
        } else if score >= 0.4 {
            RiskSeverity::Medium
        } else if score > 0.0 {
            RiskSeverity::Low
        } else {
            RiskSeverity::None
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRisk {
    pub score: f64,
    pub severity: RiskSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_in_days: Option<i64>,
}

impl TaskRisk {
    pub fn is_overdue(&self) -> bool {
        self.overdue_days.is_some()
    }
}

/// Aggregate counters over a list of tasks
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub overdue: usize,
    pub due_soon: usize,
    pub high_risk: usize,
}

pub fn assess(status: WorkStatus, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TaskRisk {
    let diff_days = due_date.map(|due| (due - now).num_seconds() as f64 / SECONDS_PER_DAY);

    if status == WorkStatus::Done {
        return TaskRisk {
            score: 0.0,
            severity: RiskSeverity::None,
            overdue_days: None,
            due_in_days: diff_days.map(|d| d.ceil().max(0.0) as i64),
        };
    }

    let mut risk: f64 = match status {
        WorkStatus::Blocked => 0.7,
        WorkStatus::InProgress => 0.35,
        WorkStatus::Todo => 0.2,
        WorkStatus::Done => 0.0,
    };
    let mut overdue_days = None;
    let mut due_in_days = None;

    match diff_days {
        Some(diff) if diff < 0.0 => {
            overdue_days = Some(diff.abs().ceil() as i64);
            risk = 1.0;
        }
        Some(diff) => {
            due_in_days = Some(diff.ceil() as i64);
            let floor = if diff <= 1.0 {
                0.9
            } else if diff <= 3.0 {
                0.7
            } else if diff <= 7.0 {
                0.5
            } else if diff <= 14.0 {
                0.3
            } else {
                0.0
            };
            risk = risk.max(floor);
        }
        None if status == WorkStatus::Blocked => risk = risk.max(0.65),
        None => risk = risk.max(0.25),
    }

    let score = (risk.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    TaskRisk {
        score,
        severity: RiskSeverity::from_score(score),
        overdue_days,
        due_in_days,
    }
}

pub fn assess_task(task: &Task, now: DateTime<Utc>) -> TaskRisk {
    assess(task.status, task.due_date, now)
}

pub fn summarize<'a, I>(tasks: I, now: DateTime<Utc>) -> RiskSummary
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .map(|task| assess_task(task, now))
        .fold(RiskSummary::default(), |mut summary, risk| {
            if risk.is_overdue() {
                summary.overdue += 1;
            } else if risk.due_in_days.is_some_and(|d| d <= DUE_SOON_DAYS) {
                summary.due_soon += 1;
            }
            if risk.score >= HIGH_RISK_THRESHOLD {
                summary.high_risk += 1;
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(now: DateTime<Utc>, hours: i64) -> Option<DateTime<Utc>> {
        Some(now + Duration::hours(hours))
    }

    #[test]
    fn done_tasks_carry_no_risk() {
        let now = Utc::now();
        let risk = assess(WorkStatus::Done, at(now, -48), now);
        assert_eq!(risk.score, 0.0);
        assert_eq!(risk.severity, RiskSeverity::None);
        assert_eq!(risk.overdue_days, None);
        assert_eq!(risk.due_in_days, Some(0));
    }

    #[test]
    fn overdue_tasks_are_critical() {
        let now = Utc::now();
        let risk = assess(WorkStatus::Todo, at(now, -30), now);
        assert_eq!(risk.score, 1.0);
        assert_eq!(risk.severity, RiskSeverity::Critical);
        assert_eq!(risk.overdue_days, Some(2));
        assert!(risk.due_in_days.is_none());
    }

    #[test]
    fn approaching_deadlines_raise_the_floor() {
        let now = Utc::now();
        assert_eq!(assess(WorkStatus::Todo, at(now, 12), now).score, 0.9);
        assert_eq!(assess(WorkStatus::Todo, at(now, 48), now).score, 0.7);
        assert_eq!(assess(WorkStatus::Todo, at(now, 24 * 5), now).score, 0.5);
        assert_eq!(assess(WorkStatus::Todo, at(now, 24 * 10), now).score, 0.3);
        assert_eq!(assess(WorkStatus::Todo, at(now, 24 * 30), now).score, 0.2);
        // Status base wins over a distant deadline.
        assert_eq!(assess(WorkStatus::Blocked, at(now, 24 * 30), now).score, 0.7);
    }

    #[test]
    fn missing_due_date_keeps_a_baseline() {
        let now = Utc::now();
        let blocked = assess(WorkStatus::Blocked, None, now);
        assert_eq!(blocked.score, 0.7);
        assert_eq!(blocked.severity, RiskSeverity::High);
        let pending = assess(WorkStatus::InProgress, None, now);
        assert_eq!(pending.score, 0.35);
        assert_eq!(pending.severity, RiskSeverity::Low);
        assert_eq!(assess(WorkStatus::Todo, None, now).score, 0.25);
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(RiskSeverity::from_score(0.85), RiskSeverity::Critical);
        assert_eq!(RiskSeverity::from_score(0.65), RiskSeverity::High);
        assert_eq!(RiskSeverity::from_score(0.4), RiskSeverity::Medium);
        assert_eq!(RiskSeverity::from_score(0.01), RiskSeverity::Low);
        assert_eq!(RiskSeverity::from_score(0.0), RiskSeverity::None);
    }

    #[test]
    fn summary_counts_overdue_due_soon_and_high_risk() {
        let now = Utc::now();
        let task = |status, due| Task {
            id: uuid::Uuid::new_v4(),
            title: "t".into(),
            description: None,
            status,
            project_id: None,
            assignee_id: None,
            creator_id: uuid::Uuid::new_v4(),
            due_date: due,
            parent_task_id: None,
            created_at: now,
            updated_at: now,
        };
        let tasks = vec![
            task(WorkStatus::Todo, at(now, -5)),
            task(WorkStatus::Todo, at(now, 20)),
            task(WorkStatus::InProgress, at(now, 60)),
            task(WorkStatus::Done, at(now, 10)),
            task(WorkStatus::Todo, None),
        ];
        let summary = summarize(&tasks, now);
        assert_eq!(summary.overdue, 1);
        // The finished task is due tomorrow and still counts as due soon.
        assert_eq!(summary.due_soon, 3);
        assert_eq!(summary.high_risk, 2);
    }
}
