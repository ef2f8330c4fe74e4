use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{authorize, check};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhive_core::hierarchy::assignable_targets;
use taskhive_core::models::{AssignableUser, Project, Task, UserResponse};
use taskhive_core::policy::{self, OperationClass};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MeQuery {
    /// Include owned projects and assigned tasks
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_projects: Option<Vec<Project>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_tasks: Option<Vec<Task>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct TeamQuery {
    pub team_lead_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignableUsersResponse {
    pub users: Vec<AssignableUser>,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    params(MeQuery),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn me(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<MeQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = UserResponse::from(&ctx.user);
    if !query.full {
        return Ok(Json(MeResponse {
            user,
            owned_projects: None,
            assigned_tasks: None,
        }));
    }

    let projects = state
        .db
        .project_repository
        .list(policy::project_scope(&ctx.actor))
        .await?
        .into_iter()
        .filter(|project| project.owner_id == ctx.user.id)
        .collect();
    let tasks = state
        .db
        .task_repository
        .list(policy::task_scope(&ctx.actor), None)
        .await?
        .into_iter()
        .filter(|task| ctx.actor.is(task.assignee_id))
        .collect();

    Ok(Json(MeResponse {
        user,
        owned_projects: Some(projects),
        assigned_tasks: Some(tasks),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(TeamQuery),
    responses(
        (status = 200, description = "Members reporting to the team lead", body = UsersResponse),
        (status = 403, description = "Role may not list teams", body = ErrorResponse),
        (status = 404, description = "Team lead not found or out of reach", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_team(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<TeamQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::ListTeam)?;

    let users = &state.db.user_repository;
    let lead = users.find_by_id(query.team_lead_id).await?;
    check(
        &ctx,
        OperationClass::ListTeam,
        policy::may_list_team(&ctx.actor, lead.as_ref()),
    )?;

    let members = users.list_members(query.team_lead_id).await?;
    Ok(Json(UsersResponse {
        users: members.iter().map(UserResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/assignable-users",
    tag = "users",
    responses(
        (status = 200, description = "Users the caller may assign work to", body = AssignableUsersResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn assignable_users(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::ListAssignable)?;

    let users = state
        .db
        .user_repository
        .assignable(assignable_targets(&ctx.actor))
        .await?;
    Ok(Json(AssignableUsersResponse {
        users: users.iter().map(AssignableUser::from).collect(),
    }))
}
