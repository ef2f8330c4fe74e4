//! Prompt construction for the insight provider.

use taskhive_core::models::{ProjectDigest, Role, TaskDigest};

use super::{DashboardInput, InsightRequest, ProjectInput, ProjectSummaryInput, TeamLeadInput};

const DASHBOARD_PROJECT_LINES: usize = 5;
const DASHBOARD_TASK_LINES: usize = 10;

const PLAIN_TEXT_RULES: &str = "Keep each bullet point concise (1-2 lines). Be specific and actionable.\n\
                                Do not use any emojis, icons, or special characters in your response.";

/// One-line framing of what a role cares about.
pub fn role_context(role: Role) -> &'static str {
    match role {
        Role::Manager => "As a Manager, you oversee the entire organization. Focus on overall progress, team performance, resource allocation, and strategic recommendations.",
        Role::TeamLead => "As a Team Lead, you manage your team members and coordinate with management. Focus on team task completion, member workload, and bottlenecks.",
        Role::TeamMember => "As a Team Member, you execute assigned tasks. Focus on your task progress, upcoming deadlines, and subtask organization.",
        Role::Individual => "As an Individual user, you manage your own projects. Focus on personal productivity, task prioritization, and time management.",
    }
}

pub fn dashboard(input: &DashboardInput<'_>) -> InsightRequest {
    let stats = input.stats;
    let mut prompt = Prompt::default();
    prompt.line("You are an AI assistant for a project tracking system. Analyze the user's dashboard and provide actionable insights.\n");
    prompt.line(format!("User: {}", input.user_name));
    prompt.line(format!("Role: {}", input.role));
    prompt.line(format!("Context: {}\n", role_context(input.role)));
    prompt.line("Dashboard Statistics:");
    prompt.line(format!("- Total Projects: {}", stats.total_projects));
    prompt.line(format!("- Total Tasks: {}", stats.total_tasks));
    prompt.line(format!("- Completed: {}", stats.completed));
    prompt.line(format!("- In Progress: {}", stats.in_progress));
    prompt.line(format!("- Blocked: {}", stats.blocked));
    prompt.line(format!("- To Do: {}\n", stats.todo));

    prompt.line(format!("Projects ({}):", input.projects.len()));
    if input.projects.is_empty() {
        prompt.line("No projects");
    }
    for project in input.projects.iter().take(DASHBOARD_PROJECT_LINES) {
        prompt.line(project_line(project));
    }

    prompt.line(format!("\nTasks ({}):", input.tasks.len()));
    if input.tasks.is_empty() {
        prompt.line("No tasks");
    }
    for task in input.tasks.iter().take(DASHBOARD_TASK_LINES) {
        prompt.line(task_line(task));
    }

    prompt.line(
        "\nProvide insights in EXACTLY this format with bullet points:\n\n\
         **Dashboard Overview:**\n\
         - [Key observation about overall status]\n\
         - [Completion rate insight]\n\
         - [Workload assessment]\n\n\
         **What's Going Well:**\n\
         - [Positive highlight 1]\n\
         - [Positive highlight 2]\n\n\
         **Areas Needing Attention:**\n\
         - [Issue or blocker 1]\n\
         - [Issue or blocker 2]\n\n\
         **Recommendations:**\n\
         - [Actionable recommendation 1]\n\
         - [Actionable recommendation 2]\n\
         - [Actionable recommendation 3]\n",
    );
    prompt.push(PLAIN_TEXT_RULES);

    InsightRequest {
        system: "You are a project management AI assistant. Always provide structured insights with clear sections and bullet points. Be concise, specific, and actionable.".to_string(),
        prompt: prompt.into_string(),
    }
}

pub fn project(input: &ProjectInput<'_>) -> InsightRequest {
    let stats = input.stats;
    let mut prompt = Prompt::default();
    prompt.line("You are an AI assistant for a project tracking system. Analyze this specific project and provide detailed insights.\n");
    prompt.line(format!("Project: {}", input.title));
    match (input.assigned_to, input.assigned_to_role) {
        (Some(name), Some(role)) => prompt.line(format!("Assigned To: {} ({})", name, role)),
        (Some(name), None) => prompt.line(format!("Assigned To: {}", name)),
        _ => prompt.line("Not assigned"),
    }
    prompt.line(format!("Viewed By: {}\n", input.viewer_role));

    prompt.line("Project Statistics:");
    prompt.line(format!("- Total Tasks: {}", stats.total_tasks));
    prompt.line(format!(
        "- Completed: {} ({}%)",
        stats.completed, stats.completion_percentage
    ));
    prompt.line(format!("- In Progress: {}", stats.in_progress));
    prompt.line(format!("- Blocked: {}", stats.blocked));
    prompt.line(format!("- To Do: {}\n", stats.todo));

    prompt.line("Tasks Breakdown:");
    if input.tasks.is_empty() {
        prompt.line("No tasks");
    }
    for task in input.tasks {
        let assignee = task
            .assignee
            .as_deref()
            .map(|a| format!(" (Assigned to: {})", a))
            .unwrap_or_else(|| " (Unassigned)".to_string());
        let subtasks = if task.subtask_count > 0 {
            format!(" [{} subtasks]", task.subtask_count)
        } else {
            String::new()
        };
        prompt.line(format!("- {} - {}{}{}", task.title, task.status, assignee, subtasks));
    }

    if let Some(workload) = &stats.team_lead_workload {
        prompt.line("\nTeam Lead Overall Workload:");
        prompt.line(format!("- Total Projects: {}", workload.total_projects));
        prompt.line(format!(
            "- Total Tasks Across All Projects: {}",
            workload.total_tasks
        ));
        prompt.line(format!("- Completed: {}", workload.completed_tasks));
        prompt.line(format!("- In Progress: {}", workload.in_progress_tasks));
    }

    let lead_section = if input.assigned_to.is_some() {
        "- How the assigned Team Lead is managing this project\n\
         - Their overall workload impact on this project\n\
         - Task distribution and delegation effectiveness"
    } else {
        "- Project is not yet assigned to a Team Lead\n\
         - Recommendation to assign for progress"
    };
    prompt.line(format!(
        "\nProvide insights in EXACTLY this format:\n\n\
         **Project Completion Status:**\n\
         - Current completion percentage and analysis\n\
         - Progress assessment based on task status\n\
         - Timeline evaluation\n\n\
         **Team Lead Performance:**\n\
         {lead_section}\n\n\
         **Task Analysis:**\n\
         - Breakdown of task statuses\n\
         - Identification of bottlenecks or blockers\n\
         - Unassigned tasks requiring attention\n\n\
         **Recommendations:**\n\
         - Immediate actions needed\n\
         - Resource allocation suggestions\n\
         - Timeline or priority adjustments\n\
         - Follow-up items for manager\n"
    ));
    prompt.push(PLAIN_TEXT_RULES);

    InsightRequest {
        system: "You are a project management AI assistant specializing in project analysis. Provide structured, data-driven insights without emojis. Be specific and actionable.".to_string(),
        prompt: prompt.into_string(),
    }
}

pub fn team_lead(input: &TeamLeadInput<'_>) -> InsightRequest {
    let stats = input.stats;
    let mut prompt = Prompt::default();
    prompt.line("You are an AI project management analyst. Analyze this Team Lead's performance and provide insights.\n");
    prompt.line(format!("Team Lead: {}\n", input.lead_name));
    prompt.line("Overall Statistics:");
    prompt.line(format!(
        "- Total Projects: {} ({} assigned by manager, {} self-created)",
        stats.total_projects, stats.manager_assigned_projects, stats.own_projects
    ));
    prompt.line(format!("- Total Tasks: {}", stats.total_tasks));
    prompt.line(format!("- Completed Tasks: {}", stats.completed));
    prompt.line(format!("- In Progress: {}", stats.in_progress));
    prompt.line(format!("- Blocked: {}", stats.blocked));
    prompt.line(format!("- To Do: {}", stats.todo));
    prompt.line(format!(
        "- Overall Completion Rate: {}%\n",
        stats.overall_completion
    ));

    prompt.line("Project-wise Breakdown:");
    for project in input.projects {
        prompt.line(format!(
            "- {}: {}% ({}/{} tasks)",
            project.title,
            project.completion_percentage(),
            project.completed_tasks,
            project.total_tasks
        ));
    }

    prompt.line(
        "\nProvide structured insights in the following format:\n\n\
         **Performance Overview:**\n\
         - Overall assessment of the Team Lead's performance\n\
         - Completion rate analysis\n\
         - Workload evaluation\n\n\
         **Project Management:**\n\
         - How they're handling manager-assigned projects\n\
         - Performance on self-created projects\n\
         - Project completion trends\n\n\
         **Task Analysis:**\n\
         - Task completion efficiency\n\
         - Identification of bottlenecks (blocked tasks)\n\
         - In-progress task management\n\n\
         **Recommendations:**\n\
         - Immediate actions for improvement\n\
         - Workload management suggestions\n\
         - Support or resources needed\n\
         - Recognition for good performance\n",
    );
    prompt.push(PLAIN_TEXT_RULES);

    InsightRequest {
        system: "You are a project management AI that provides clear, actionable insights without using emojis or icons.".to_string(),
        prompt: prompt.into_string(),
    }
}

pub fn project_summary(input: &ProjectSummaryInput<'_>) -> InsightRequest {
    let mut prompt = Prompt::default();
    prompt.line(
        "You are an AI assistant for an internal project tracking system.\n\
         Analyze the given project information and summarize progress, key highlights, and potential blockers.\n",
    );
    prompt.line(format!("Project: {}", input.title));
    prompt.line(format!(
        "Description: {}\n",
        input.description.filter(|d| !d.trim().is_empty()).unwrap_or("N/A")
    ));
    prompt.line("Tasks:");
    if input.tasks.is_empty() {
        prompt.line("No tasks available");
    }
    for task in input.tasks {
        match task.assignee.as_deref() {
            Some(assignee) => prompt.line(format!(
                "- {} - Status: {} (Assigned to {})",
                task.title, task.status, assignee
            )),
            None => prompt.line(format!("- {} - Status: {}", task.title, task.status)),
        }
    }

    InsightRequest {
        system: "You are a concise and insightful AI summarizer. Always return clear and structured summaries with headings: 'Progress Summary', 'Key Highlights', and 'Risks or Blockers'.".to_string(),
        prompt: prompt.into_string(),
    }
}

/// Prompt text built line by line
#[derive(Default)]
struct Prompt(String);

impl Prompt {
    fn line(&mut self, text: impl AsRef<str>) {
        self.0.push_str(text.as_ref());
        self.0.push('\n');
    }

    fn push(&mut self, text: &str) {
        self.0.push_str(text);
    }

    fn into_string(self) -> String {
        self.0
    }
}

fn project_line(project: &ProjectDigest) -> String {
    let assigned = project
        .assigned_to
        .as_deref()
        .map(|a| format!(" (Assigned to: {})", a))
        .unwrap_or_default();
    format!("- {}{} - {} tasks", project.title, assigned, project.task_count)
}

fn task_line(task: &TaskDigest) -> String {
    let project = task
        .project
        .as_deref()
        .map(|p| format!(" [{}]", p))
        .unwrap_or_default();
    let assignee = task
        .assignee
        .as_deref()
        .map(|a| format!(" ({})", a))
        .unwrap_or_default();
    format!("- {} - {}{}{}", task.title, task.status, project, assignee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhive_core::models::{DashboardStats, ProjectStats, StatusCounts, WorkStatus};

    fn digest(title: &str, status: WorkStatus, assignee: Option<&str>) -> TaskDigest {
        TaskDigest {
            title: title.to_string(),
            status,
            project: Some("Apollo".to_string()),
            assignee: assignee.map(str::to_string),
            due_date: None,
            subtask_count: 0,
        }
    }

    #[test]
    fn dashboard_prompt_is_role_tailored_and_capped() {
        let stats = DashboardStats::new(1, StatusCounts::default());
        let tasks: Vec<TaskDigest> = (0..12)
            .map(|i| digest(&format!("task-{i}"), WorkStatus::Todo, None))
            .collect();
        let request = dashboard(&DashboardInput {
            user_name: "Lee",
            role: Role::TeamLead,
            stats: &stats,
            projects: &[],
            tasks: &tasks,
        });
        assert!(request.prompt.contains("Role: TEAM_LEAD"));
        assert!(request.prompt.contains("As a Team Lead"));
        assert!(request.prompt.contains("Tasks (12):"));
        assert!(request.prompt.contains("task-9"));
        assert!(!request.prompt.contains("task-10"));
        assert!(request.prompt.contains("No projects"));
    }

    #[test]
    fn project_prompt_marks_unassigned_tasks() {
        let stats = ProjectStats::new(
            StatusCounts::tally(&[WorkStatus::Done, WorkStatus::Todo]),
            None,
        );
        let tasks = vec![
            digest("Wire API", WorkStatus::Done, Some("Kim")),
            digest("Write docs", WorkStatus::Todo, None),
        ];
        let request = project(&ProjectInput {
            title: "Apollo",
            assigned_to: None,
            assigned_to_role: None,
            viewer_role: Role::Manager,
            stats: &stats,
            tasks: &tasks,
        });
        assert!(request.prompt.contains("Not assigned"));
        assert!(request.prompt.contains("- Wire API - DONE (Assigned to: Kim)"));
        assert!(request.prompt.contains("- Write docs - TODO (Unassigned)"));
        assert!(request.prompt.contains("Completed: 1 (50%)"));
        assert!(!request.prompt.contains("Team Lead Overall Workload"));
    }

    #[test]
    fn project_summary_system_prompt_names_sections() {
        let request = project_summary(&ProjectSummaryInput {
            title: "Apollo",
            description: None,
            tasks: &[],
        });
        assert!(request.system.contains("'Progress Summary'"));
        assert!(request.prompt.contains("Description: N/A"));
        assert!(request.prompt.contains("No tasks available"));
    }

    #[test]
    fn prompt_lines_end_with_newlines() {
        let mut prompt = Prompt::default();
        prompt.line("Tasks:");
        prompt.line(format!("- {}", "Ship"));
        prompt.push("rules");
        assert_eq!(prompt.into_string(), "Tasks:\n- Ship\nrules");
    }
}
