//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use taskhive_core::models;
use taskhive_core::risk;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Taskhive API",
        version = "0.1.0",
        description = "Multi-tenant project tracker. Organizations are run by a manager, team leads run projects and team members carry out tasks; independent users track their own work. All endpoints live under /api/."
    ),
    modifiers(&BearerAuth),
    security(("bearer_auth" = [])),
    paths(
        // Auth
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        // Directory
        handlers::users::me,
        handlers::users::list_team,
        handlers::users::assignable_users,
        handlers::orgs::team_leads_by_org,
        handlers::orgs::organization_by_manager,
        handlers::team_leads::invite_team_lead,
        // Projects
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::update_project_by_path,
        handlers::projects::delete_project,
        handlers::projects::delete_project_by_path,
        // Tasks
        handlers::tasks::list_tasks,
        handlers::tasks::get_task,
        handlers::tasks::create_task,
        handlers::tasks::update_task,
        handlers::tasks::update_task_by_path,
        handlers::tasks::delete_task,
        handlers::tasks::delete_task_by_path,
        // Subtasks
        handlers::subtasks::list_subtasks,
        handlers::subtasks::create_subtask,
        handlers::subtasks::update_subtask,
        handlers::subtasks::update_subtask_by_path,
        handlers::subtasks::delete_subtask,
        handlers::subtasks::delete_subtask_by_path,
        // Insights
        handlers::insights::dashboard_insights,
        handlers::insights::project_insights,
        handlers::insights::project_insights_post,
        handlers::insights::team_lead_insights,
        handlers::insights::team_lead_insights_post,
        handlers::insights::generate_insight,
        handlers::insights::list_insights,
        // Notes
        handlers::notes::list_notes,
        handlers::notes::create_note,
        handlers::notes::delete_note,
        handlers::notes::download_attachment,
        handlers::notes::delete_attachment,
        // Health
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::Role,
            models::WorkStatus,
            models::UserResponse,
            models::AssignableUser,
            models::Organization,
            models::TeamLeadEntry,
            models::Project,
            models::Task,
            models::TaskView,
            models::TaskSummary,
            models::Note,
            models::NoteAttachment,
            models::NoteWithAttachments,
            models::Insight,
            models::DashboardStats,
            models::ProjectStats,
            models::TeamLeadWorkload,
            models::TeamLeadStats,
            models::ProjectCompletion,
            risk::TaskRisk,
            risk::RiskSeverity,
            risk::RiskSummary,
            handlers::DeleteResponse,
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::RegisterRequest,
            handlers::auth::RegisterResponse,
            handlers::auth::ForgotPasswordRequest,
            handlers::auth::ResetPasswordRequest,
            handlers::auth::MessageResponse,
            handlers::users::MeResponse,
            handlers::users::UsersResponse,
            handlers::users::AssignableUsersResponse,
            handlers::orgs::OrganizationRef,
            handlers::orgs::TeamLeadDirectoryResponse,
            handlers::orgs::ManagedOrganizationResponse,
            handlers::team_leads::InviteTeamLeadRequest,
            handlers::team_leads::InviteTeamLeadResponse,
            handlers::team_leads::InvitedTeamLead,
            handlers::projects::CreateProjectRequest,
            handlers::projects::UpdateProjectRequest,
            handlers::projects::ProjectListResponse,
            handlers::tasks::CreateTaskRequest,
            handlers::tasks::UpdateTaskRequest,
            handlers::tasks::TaskListResponse,
            handlers::tasks::TaskSummaryListResponse,
            handlers::subtasks::CreateSubtaskRequest,
            handlers::subtasks::UpdateSubtaskRequest,
            handlers::subtasks::SubtaskListResponse,
            handlers::insights::ProjectTarget,
            handlers::insights::TeamLeadTarget,
            handlers::insights::DashboardInsightsResponse,
            handlers::insights::ProjectInsightsResponse,
            handlers::insights::ProjectHeading,
            handlers::insights::TeamLeadInsightsResponse,
            handlers::insights::TeamLeadHeading,
            handlers::insights::StoredInsightsResponse,
            handlers::notes::NotesResponse,
            handlers::notes::NoteDeletedResponse,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Sign-in, registration and password reset"),
        (name = "users", description = "Current user, team rosters and assignee pickers"),
        (name = "organizations", description = "Public organization directory"),
        (name = "team-leads", description = "Team-lead invitations"),
        (name = "projects", description = "Projects scoped by role"),
        (name = "tasks", description = "Tasks with derived risk"),
        (name = "subtasks", description = "Subtasks owned by the assigned team member"),
        (name = "insights", description = "Natural-language summaries over scoped statistics"),
        (name = "notes", description = "Personal notes and attachments"),
        (name = "health", description = "Liveness and database connectivity")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_the_core_routes() {
        let spec = get_openapi_spec();
        for path in [
            "/api/auth/login",
            "/api/projects/{id}",
            "/api/tasks",
            "/api/team-leads/invite",
            "/api/notes/{id}/attachments/{attachment_id}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
