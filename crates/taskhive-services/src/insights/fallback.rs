//! Deterministic summaries built only from statistics.
//!
//! Used whenever the insight provider is missing, slow, failing or returns nothing,
//! so every insight endpoint always has text to show.

use taskhive_core::models::{percentage, Role, StatusCounts, TaskDigest, WorkStatus};

use super::{DashboardInput, ProjectInput, ProjectSummaryInput, TeamLeadInput};

fn plural<'a>(n: i64, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn role_recommendations(role: Role) -> [&'static str; 3] {
    match role {
        Role::Manager => [
            "Review blocked tasks and allocate resources to unblock them",
            "Monitor team progress and provide support where needed",
            "Consider workload distribution across team leads",
        ],
        Role::TeamLead => [
            "Check in with team members on in-progress tasks",
            "Address any blockers preventing task completion",
            "Plan task assignments for optimal team productivity",
        ],
        Role::TeamMember => [
            "Break down complex tasks into sub-tasks for better tracking",
            "Update task status regularly to keep team informed",
            "Reach out to team lead if any tasks are blocked",
        ],
        Role::Individual => [
            "Prioritize tasks based on deadlines and importance",
            "Start working on TODO tasks to maintain momentum",
            "Review completed tasks for lessons learned",
        ],
    }
}

pub fn dashboard(input: &DashboardInput<'_>) -> String {
    let s = input.stats;
    let mut lines = vec![
        "**Dashboard Overview:**".to_string(),
        format!(
            "• You have {} active {} with {} total {}",
            s.total_projects,
            plural(s.total_projects, "project", "projects"),
            s.total_tasks,
            plural(s.total_tasks, "task", "tasks")
        ),
        format!(
            "• Current completion rate: {}% ({}/{} tasks done)",
            s.completion_rate(),
            s.completed,
            s.total_tasks
        ),
        format!(
            "• {} {} currently in progress",
            s.in_progress,
            plural(s.in_progress, "task is", "tasks are")
        ),
        String::new(),
        "**What's Going Well:**".to_string(),
    ];

    if s.completed > 0 {
        lines.push(format!(
            "• {} {} successfully completed",
            s.completed,
            plural(s.completed, "task", "tasks")
        ));
    } else {
        lines.push("• No completed tasks yet - great opportunity to start!".to_string());
    }
    if s.blocked == 0 {
        lines.push("• No blocked tasks - workflow is smooth".to_string());
    } else {
        lines.push(format!(
            "• {} {} attention",
            s.blocked,
            plural(s.blocked, "task needs", "tasks need")
        ));
    }

    lines.push(String::new());
    lines.push("**Areas Needing Attention:**".to_string());
    if s.blocked > 0 {
        lines.push(format!(
            "• {} blocked {} immediate resolution",
            s.blocked,
            plural(s.blocked, "task requires", "tasks require")
        ));
    } else {
        lines.push("• All systems running smoothly".to_string());
    }
    if s.todo > 0 {
        lines.push(format!(
            "• {} {} waiting to be started",
            s.todo,
            plural(s.todo, "task is", "tasks are")
        ));
    } else {
        lines.push("• No pending tasks in queue".to_string());
    }

    lines.push(String::new());
    lines.push("**Recommendations:**".to_string());
    lines.extend(
        role_recommendations(input.role)
            .iter()
            .map(|r| format!("• {}", r)),
    );
    lines.push(format!(
        "• Focus on moving {} to completion",
        if s.in_progress > 0 {
            "in-progress tasks"
        } else {
            "TODO tasks"
        }
    ));

    lines.join("\n")
}

pub fn project(input: &ProjectInput<'_>) -> String {
    let s = input.stats;
    let unassigned = input.tasks.iter().filter(|t| t.assignee.is_none()).count() as i64;
    let blocked: Vec<&TaskDigest> = input
        .tasks
        .iter()
        .filter(|t| t.status == WorkStatus::Blocked)
        .collect();

    let mut lines = vec![
        "**Project Completion Status:**".to_string(),
        format!(
            "• Project \"{}\" is {}% complete ({}/{} tasks done)",
            input.title, s.completion_percentage, s.completed, s.total_tasks
        ),
        format!(
            "• {} {} currently being worked on",
            s.in_progress,
            plural(s.in_progress, "task is", "tasks are")
        ),
        format!(
            "• {} {} to be started",
            s.todo,
            plural(s.todo, "task remains", "tasks remain")
        ),
        String::new(),
        "**Team Lead Performance:**".to_string(),
    ];

    match input.assigned_to {
        Some(name) => {
            let workload = s.team_lead_workload.unwrap_or_default();
            lines.push(format!(
                "• Assigned to {} who is managing {} total projects",
                name, workload.total_projects
            ));
            lines.push(format!(
                "• This Team Lead has {} total tasks across all projects",
                workload.total_tasks
            ));
            lines.push(format!(
                "• Their completion rate is {}%",
                workload.completion_rate()
            ));
        }
        None => {
            lines.push("• Project is not yet assigned to a Team Lead".to_string());
            lines.push("• Immediate assignment recommended to begin progress".to_string());
        }
    }

    lines.push(String::new());
    lines.push("**Task Analysis:**".to_string());
    lines.push(format!(
        "• Completed: {} tasks finished successfully",
        s.completed
    ));
    lines.push(format!(
        "• In Progress: {} tasks actively being worked on",
        s.in_progress
    ));
    let blocked_names = match blocked.as_slice() {
        [] => String::new(),
        [only] => format!(" ({})", only.title),
        [first, ..] => format!(" ({} and others)", first.title),
    };
    lines.push(format!(
        "• Blocked: {} {} blocked{}",
        s.blocked,
        plural(s.blocked, "task is", "tasks are"),
        blocked_names
    ));
    lines.push(format!(
        "• Unassigned: {} {} assignment",
        unassigned,
        plural(unassigned, "task needs", "tasks need")
    ));

    lines.push(String::new());
    lines.push("**Recommendations:**".to_string());
    if s.blocked > 0 {
        lines.push(format!(
            "• Urgently address {} blocked {} to unblock progress",
            s.blocked,
            plural(s.blocked, "task", "tasks")
        ));
    } else {
        lines.push("• No blockers - workflow is running smoothly".to_string());
    }
    if unassigned > 0 {
        lines.push(format!(
            "• Assign {} unassigned {} to team members",
            unassigned,
            plural(unassigned, "task", "tasks")
        ));
    } else {
        lines.push("• All tasks are properly assigned".to_string());
    }
    match s.completion_percentage {
        p if p < 50 => lines.push(
            "• Project is less than 50% complete - may need additional resources or priority"
                .to_string(),
        ),
        p if p < 100 => {
            lines.push("• Project is making good progress - maintain momentum".to_string())
        }
        _ => lines.push("• Project is complete - ready for review and closure".to_string()),
    }
    if let Some(workload) = s.team_lead_workload.filter(|w| w.total_projects > 3) {
        lines.push(format!(
            "• Team Lead is managing {} projects - consider workload redistribution",
            workload.total_projects
        ));
    }

    lines.join("\n")
}

pub fn team_lead(input: &TeamLeadInput<'_>) -> String {
    let s = input.stats;
    let standing = if s.overall_completion >= 70 {
        "Strong"
    } else if s.overall_completion >= 50 {
        "Moderate"
    } else {
        "Needs improvement in"
    };

    let lines = [
        "**Performance Overview:**".to_string(),
        format!(
            "• {} is managing {} projects with {} total tasks",
            input.lead_name, s.total_projects, s.total_tasks
        ),
        format!("• Overall completion rate: {}%", s.overall_completion),
        format!(
            "• Currently has {} tasks in progress and {} blocked tasks",
            s.in_progress, s.blocked
        ),
        String::new(),
        "**Project Management:**".to_string(),
        format!(
            "• Managing {} manager-assigned projects",
            s.manager_assigned_projects
        ),
        format!("• Created {} personal projects", s.own_projects),
        format!("• {} project completion rate", standing),
        String::new(),
        "**Task Analysis:**".to_string(),
        format!("• Completed: {} tasks", s.completed),
        format!("• In Progress: {} tasks", s.in_progress),
        format!("• Blocked: {} tasks requiring attention", s.blocked),
        format!("• To Do: {} tasks pending", s.todo),
        String::new(),
        "**Recommendations:**".to_string(),
        if s.blocked > 0 {
            format!("• Address {} blocked tasks to unblock progress", s.blocked)
        } else {
            "• No blocked tasks - good workflow management".to_string()
        },
        if s.overall_completion < 50 {
            "• Consider providing additional support or resources".to_string()
        } else {
            "• Continue current pace".to_string()
        },
        if s.total_projects > 5 {
            "• Heavy workload - consider redistributing some projects".to_string()
        } else {
            "• Workload appears manageable".to_string()
        },
        "• Regular check-ins recommended to maintain progress".to_string(),
    ];

    lines.join("\n")
}

pub fn project_summary(input: &ProjectSummaryInput<'_>) -> String {
    let counts = StatusCounts::tally(input.tasks.iter().map(|t| &t.status));
    let unassigned = input.tasks.iter().filter(|t| t.assignee.is_none()).count() as i64;
    let blocked: Vec<&str> = input
        .tasks
        .iter()
        .filter(|t| t.status == WorkStatus::Blocked)
        .map(|t| t.title.as_str())
        .collect();

    let mut lines = vec!["**Progress Summary:**".to_string()];
    if counts.total == 0 {
        lines.push(format!(
            "• Project \"{}\" has no tasks yet",
            input.title
        ));
    } else {
        lines.push(format!(
            "• Project \"{}\" is {}% complete ({}/{} tasks done)",
            input.title,
            percentage(counts.completed, counts.total),
            counts.completed,
            counts.total
        ));
        lines.push(format!(
            "• {} in progress, {} to do",
            counts.in_progress, counts.todo
        ));
    }

    lines.push(String::new());
    lines.push("**Key Highlights:**".to_string());
    if counts.completed > 0 {
        lines.push(format!(
            "• {} {} completed",
            counts.completed,
            plural(counts.completed, "task", "tasks")
        ));
    } else {
        lines.push("• No tasks completed yet".to_string());
    }
    if counts.in_progress > 0 {
        lines.push(format!(
            "• {} {} actively being worked on",
            counts.in_progress,
            plural(counts.in_progress, "task is", "tasks are")
        ));
    }

    lines.push(String::new());
    lines.push("**Risks or Blockers:**".to_string());
    if blocked.is_empty() {
        lines.push("• No blocked tasks".to_string());
    } else {
        lines.push(format!(
            "• {} blocked: {}",
            plural(blocked.len() as i64, "1 task", "Tasks"),
            blocked.join(", ")
        ));
    }
    if unassigned > 0 {
        lines.push(format!(
            "• {} {} without an assignee",
            unassigned,
            plural(unassigned, "task", "tasks")
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhive_core::models::{
        DashboardStats, ProjectCompletion, ProjectStats, TeamLeadStats, TeamLeadWorkload,
    };
    use uuid::Uuid;

    fn digest(title: &str, status: WorkStatus, assignee: Option<&str>) -> TaskDigest {
        TaskDigest {
            title: title.to_string(),
            status,
            project: None,
            assignee: assignee.map(str::to_string),
            due_date: None,
            subtask_count: 0,
        }
    }

    fn counts(completed: i64, in_progress: i64, blocked: i64, todo: i64) -> StatusCounts {
        StatusCounts {
            total: completed + in_progress + blocked + todo,
            completed,
            in_progress,
            blocked,
            todo,
        }
    }

    #[test]
    fn dashboard_fallback_has_all_sections() {
        let stats = DashboardStats::new(3, counts(2, 1, 0, 1));
        let text = dashboard(&DashboardInput {
            user_name: "Ana",
            role: Role::Individual,
            stats: &stats,
            projects: &[],
            tasks: &[],
        });
        for heading in [
            "**Dashboard Overview:**",
            "**What's Going Well:**",
            "**Areas Needing Attention:**",
            "**Recommendations:**",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("You have 3 active projects with 4 total tasks"));
        assert!(text.contains("Current completion rate: 50% (2/4 tasks done)"));
        assert!(text.contains("1 task is currently in progress"));
        assert!(text.contains("No blocked tasks - workflow is smooth"));
        assert!(text.contains("Prioritize tasks based on deadlines and importance"));
        assert!(text.contains("Focus on moving in-progress tasks to completion"));
    }

    #[test]
    fn dashboard_fallback_for_empty_workspace() {
        let stats = DashboardStats::new(0, StatusCounts::default());
        let text = dashboard(&DashboardInput {
            user_name: "Ana",
            role: Role::Manager,
            stats: &stats,
            projects: &[],
            tasks: &[],
        });
        assert!(text.contains("Current completion rate: 0% (0/0 tasks done)"));
        assert!(text.contains("No completed tasks yet - great opportunity to start!"));
        assert!(text.contains("No pending tasks in queue"));
        assert!(text.contains("Consider workload distribution across team leads"));
        assert!(text.contains("Focus on moving TODO tasks to completion"));
    }

    #[test]
    fn project_fallback_names_first_blocked_task() {
        let tasks = vec![
            digest("Migrate DB", WorkStatus::Blocked, Some("Kim")),
            digest("Fix auth", WorkStatus::Blocked, None),
            digest("Ship", WorkStatus::Done, Some("Kim")),
        ];
        let stats = ProjectStats::new(
            counts(1, 0, 2, 0),
            Some(TeamLeadWorkload {
                total_projects: 4,
                total_tasks: 10,
                completed_tasks: 5,
                in_progress_tasks: 2,
            }),
        );
        let text = project(&ProjectInput {
            title: "Apollo",
            assigned_to: Some("Kim"),
            assigned_to_role: Some(Role::TeamLead),
            viewer_role: Role::Manager,
            stats: &stats,
            tasks: &tasks,
        });
        assert!(text.contains("Project \"Apollo\" is 33% complete (1/3 tasks done)"));
        assert!(text.contains("Blocked: 2 tasks are blocked (Migrate DB and others)"));
        assert!(text.contains("Unassigned: 1 task needs assignment"));
        assert!(text.contains("Assigned to Kim who is managing 4 total projects"));
        assert!(text.contains("Their completion rate is 50%"));
        assert!(text.contains("less than 50% complete"));
        assert!(text.contains("consider workload redistribution"));
    }

    #[test]
    fn project_fallback_unassigned_and_complete() {
        let tasks = vec![digest("Ship", WorkStatus::Done, Some("Kim"))];
        let stats = ProjectStats::new(counts(1, 0, 0, 0), None);
        let text = project(&ProjectInput {
            title: "Apollo",
            assigned_to: None,
            assigned_to_role: None,
            viewer_role: Role::TeamLead,
            stats: &stats,
            tasks: &tasks,
        });
        assert!(text.contains("Project is not yet assigned to a Team Lead"));
        assert!(text.contains("No blockers - workflow is running smoothly"));
        assert!(text.contains("All tasks are properly assigned"));
        assert!(text.contains("ready for review and closure"));
    }

    #[test]
    fn team_lead_fallback_grades_completion() {
        let lead = Uuid::new_v4();
        let projects = vec![ProjectCompletion {
            id: Uuid::new_v4(),
            title: "Apollo".to_string(),
            owner_id: lead,
            assigned_to_id: None,
            total_tasks: 4,
            completed_tasks: 3,
        }];
        let stats = TeamLeadStats::new(lead, &projects, counts(3, 1, 0, 0));
        let text = team_lead(&TeamLeadInput {
            lead_name: "Kim",
            stats: &stats,
            projects: &projects,
        });
        assert!(text.contains("Kim is managing 1 projects with 4 total tasks"));
        assert!(text.contains("Created 1 personal projects"));
        assert!(text.contains("Strong project completion rate"));
        assert!(text.contains("Workload appears manageable"));
        assert!(text.ends_with("Regular check-ins recommended to maintain progress"));
    }

    #[test]
    fn team_lead_fallback_flags_struggling_lead() {
        let lead = Uuid::new_v4();
        let stats = TeamLeadStats::new(lead, &[], counts(1, 1, 2, 2));
        let text = team_lead(&TeamLeadInput {
            lead_name: "Kim",
            stats: &stats,
            projects: &[],
        });
        assert!(text.contains("Needs improvement in project completion rate"));
        assert!(text.contains("Address 2 blocked tasks to unblock progress"));
        assert!(text.contains("Consider providing additional support or resources"));
    }

    #[test]
    fn project_summary_fallback_has_required_headings() {
        let tasks = vec![
            digest("Design", WorkStatus::Done, Some("Kim")),
            digest("Build", WorkStatus::Blocked, None),
        ];
        let text = project_summary(&ProjectSummaryInput {
            title: "Apollo",
            description: None,
            tasks: &tasks,
        });
        assert!(text.contains("**Progress Summary:**"));
        assert!(text.contains("**Key Highlights:**"));
        assert!(text.contains("**Risks or Blockers:**"));
        assert!(text.contains("is 50% complete (1/2 tasks done)"));
        assert!(text.contains("1 task blocked: Build"));
        assert!(text.contains("1 task without an assignee"));
    }

    #[test]
    fn project_summary_fallback_without_tasks_is_not_empty() {
        let text = project_summary(&ProjectSummaryInput {
            title: "Empty",
            description: Some("Nothing yet"),
            tasks: &[],
        });
        assert!(text.contains("Project \"Empty\" has no tasks yet"));
        assert!(text.contains("No blocked tasks"));
    }
}
