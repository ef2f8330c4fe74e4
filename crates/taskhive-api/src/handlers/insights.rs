//! Natural-language summaries over scoped statistics.
//!
//! Each handler gathers the same rows its list endpoint would show, computes the
//! statistics, then asks the summarizer for text. The summarizer never fails: a
//! provider error degrades to the templated summary.

use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{authorize, check};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhive_core::models::{
    DashboardStats, Insight, Project, ProjectCompletion, ProjectStats, Role, TeamLeadStats,
};
use taskhive_core::policy::{self, OperationClass};
use taskhive_core::AppError;
use taskhive_services::insights::{
    DashboardInput, ProjectInput, ProjectSummaryInput, TeamLeadInput,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ProjectTarget {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct TeamLeadTarget {
    pub team_lead_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardInsightsResponse {
    pub insights: String,
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHeading {
    pub title: String,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectInsightsResponse {
    pub insights: String,
    pub stats: ProjectStats,
    pub project: ProjectHeading,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamLeadHeading {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeadInsightsResponse {
    pub insights: String,
    pub stats: TeamLeadStats,
    pub team_lead: TeamLeadHeading,
    pub projects: Vec<ProjectCompletion>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoredInsightsResponse {
    pub insights: Vec<Insight>,
}

/// Target ids may come in the query string or, for POST, a JSON body
fn merge_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, HttpAppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        HttpAppError(AppError::Validation(format!("Invalid request body: {}", e)))
    })
}

fn required(id: Option<Uuid>, field: &str) -> Result<Uuid, HttpAppError> {
    id.ok_or_else(|| HttpAppError(AppError::Validation(format!("{} is required", field))))
}

async fn scoped_project(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<Project, HttpAppError> {
    state
        .db
        .project_repository
        .find(policy::project_scope(&ctx.actor), id)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Project not found".to_string())))
}

async fn dashboard(
    state: &AppState,
    ctx: &SessionContext,
) -> Result<DashboardInsightsResponse, HttpAppError> {
    authorize(ctx, OperationClass::ViewDashboardInsights)?;

    let project_scope = policy::project_scope(&ctx.actor);
    let task_scope = policy::task_scope(&ctx.actor);
    let insights = &state.db.insight_repository;
    let stats = insights.dashboard_stats(project_scope, task_scope).await?;
    let projects = insights.project_digests(project_scope).await?;
    let tasks = insights.task_digests(task_scope).await?;

    let text = state
        .summarizer
        .dashboard(&DashboardInput {
            user_name: ctx.display_name(),
            role: ctx.user.role,
            stats: &stats,
            projects: &projects,
            tasks: &tasks,
        })
        .await;

    Ok(DashboardInsightsResponse {
        insights: text,
        stats,
    })
}

#[utoipa::path(
    get,
    path = "/api/dashboard-insights",
    tag = "insights",
    responses(
        (status = 200, description = "Summary of everything visible to the caller", body = DashboardInsightsResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn dashboard_insights(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(dashboard(&state, &ctx).await?))
}

async fn project(
    state: &AppState,
    ctx: &SessionContext,
    project_id: Uuid,
) -> Result<ProjectInsightsResponse, HttpAppError> {
    authorize(ctx, OperationClass::ViewProjectInsights)?;
    let project = scoped_project(state, ctx, project_id).await?;
    check(
        ctx,
        OperationClass::ViewProjectInsights,
        policy::may_view_project_insights(&ctx.actor, &project),
    )?;

    let assignee = match project.assigned_to_id {
        Some(id) => state.db.user_repository.find_by_id(id).await?,
        None => None,
    };
    let insights = &state.db.insight_repository;
    let workload = match &assignee {
        Some(user) if user.role == Role::TeamLead => Some(insights.workload(user.id).await?),
        _ => None,
    };
    let counts = insights.project_counts(project.id).await?;
    let tasks = insights
        .project_task_digests(project.id, policy::task_scope(&ctx.actor))
        .await?;
    let stats = ProjectStats::new(counts, workload);

    let assigned_to = assignee
        .as_ref()
        .map(|user| user.name.clone().unwrap_or_else(|| user.email.clone()));
    let text = state
        .summarizer
        .project(&ProjectInput {
            title: &project.title,
            assigned_to: assigned_to.as_deref(),
            assigned_to_role: assignee.as_ref().map(|user| user.role),
            viewer_role: ctx.user.role,
            stats: &stats,
            tasks: &tasks,
        })
        .await;

    Ok(ProjectInsightsResponse {
        insights: text,
        stats,
        project: ProjectHeading {
            title: project.title,
            assigned_to,
        },
    })
}

#[utoipa::path(
    get,
    path = "/api/project-insights",
    tag = "insights",
    params(ProjectTarget),
    responses(
        (status = 200, description = "Summary of one project", body = ProjectInsightsResponse),
        (status = 403, description = "Role may not view project insights", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn project_insights(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<ProjectTarget>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = required(query.project_id, "projectId")?;
    Ok(Json(project(&state, &ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/project-insights",
    tag = "insights",
    params(ProjectTarget),
    request_body = ProjectTarget,
    responses(
        (status = 200, description = "Summary of one project", body = ProjectInsightsResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn project_insights_post(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<ProjectTarget>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let from_body: ProjectTarget = merge_body(&body)?;
    let id = required(query.project_id.or(from_body.project_id), "projectId")?;
    Ok(Json(project(&state, &ctx, id).await?))
}

async fn team_lead(
    state: &AppState,
    ctx: &SessionContext,
    lead_id: Uuid,
) -> Result<TeamLeadInsightsResponse, HttpAppError> {
    authorize(ctx, OperationClass::ViewTeamLeadInsights)?;
    let lead = state.db.user_repository.find_by_id(lead_id).await?;
    check(
        ctx,
        OperationClass::ViewTeamLeadInsights,
        policy::may_view_team_lead(&ctx.actor, lead.as_ref()),
    )?;
    let lead = lead
        .ok_or_else(|| HttpAppError(AppError::NotFound("Team lead not found".to_string())))?;

    let insights = &state.db.insight_repository;
    let projects = insights.lead_projects(lead.id).await?;
    let counts = insights.counts_for_user(lead.id).await?;
    let stats = TeamLeadStats::new(lead.id, &projects, counts);

    let lead_name = lead.name.clone().unwrap_or_else(|| lead.email.clone());
    let text = state
        .summarizer
        .team_lead(&TeamLeadInput {
            lead_name: &lead_name,
            stats: &stats,
            projects: &projects,
        })
        .await;

    Ok(TeamLeadInsightsResponse {
        insights: text,
        stats,
        team_lead: TeamLeadHeading {
            id: lead.id,
            name: lead.name,
            email: lead.email,
        },
        projects,
    })
}

#[utoipa::path(
    get,
    path = "/api/team-lead-insights",
    tag = "insights",
    params(TeamLeadTarget),
    responses(
        (status = 200, description = "Review of one team lead", body = TeamLeadInsightsResponse),
        (status = 403, description = "Only managers can view team lead insights", body = ErrorResponse),
        (status = 404, description = "Team lead not found in the organization", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn team_lead_insights(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<TeamLeadTarget>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = required(query.team_lead_id, "teamLeadId")?;
    Ok(Json(team_lead(&state, &ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/team-lead-insights",
    tag = "insights",
    params(TeamLeadTarget),
    request_body = TeamLeadTarget,
    responses(
        (status = 200, description = "Review of one team lead", body = TeamLeadInsightsResponse),
        (status = 404, description = "Team lead not found in the organization", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn team_lead_insights_post(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<TeamLeadTarget>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let from_body: TeamLeadTarget = merge_body(&body)?;
    let id = required(query.team_lead_id.or(from_body.team_lead_id), "teamLeadId")?;
    Ok(Json(team_lead(&state, &ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/insights",
    tag = "insights",
    request_body = ProjectTarget,
    responses(
        (status = 201, description = "Project summary generated and stored", body = Insight),
        (status = 400, description = "projectId missing", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn generate_insight(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<ProjectTarget>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::GenerateProjectInsight)?;
    let from_body: ProjectTarget = merge_body(&body)?;
    let id = required(from_body.project_id.or(query.project_id), "projectId")?;
    let project = scoped_project(&state, &ctx, id).await?;

    let tasks = state
        .db
        .insight_repository
        .project_task_digests(project.id, policy::task_scope(&ctx.actor))
        .await?;
    let summary = state
        .summarizer
        .project_summary(&ProjectSummaryInput {
            title: &project.title,
            description: project.description.as_deref(),
            tasks: &tasks,
        })
        .await;

    let insight = state
        .db
        .insight_repository
        .create(project.id, &summary, ctx.user.id)
        .await?;
    tracing::info!(insight_id = %insight.id, project_id = %project.id, "Project insight stored");
    Ok((StatusCode::CREATED, Json(insight)))
}

#[utoipa::path(
    get,
    path = "/api/insights",
    tag = "insights",
    params(ProjectTarget),
    responses(
        (status = 200, description = "Stored summaries of a visible project, newest first", body = StoredInsightsResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<ProjectTarget>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::ViewProjects)?;
    let id = required(query.project_id, "projectId")?;
    let project = scoped_project(&state, &ctx, id).await?;
    let insights = state
        .db
        .insight_repository
        .list_for_project(project.id, policy::stored_insight_author(&ctx.actor))
        .await?;
    Ok(Json(StoredInsightsResponse { insights }))
}
