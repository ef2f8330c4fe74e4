use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{authorize, check, pick_id, required_text, DeleteResponse, IdQuery};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhive_core::models::{NewProject, Project, WorkStatus};
use taskhive_core::policy::{self, OperationClass};
use taskhive_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    /// Required for MANAGER and TEAM_LEAD; ignored for INDIVIDUAL
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    /// Used when the id is not in the path
    pub id: Option<Uuid>,
    pub status: WorkStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

fn project_not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("Project not found".to_string()))
}

/// Load a project through the actor's scope; anything outside it is "not found"
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
        .ok_or_else(project_not_found)
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    params(IdQuery),
    responses(
        (status = 200, description = "Projects visible to the caller, or one project with ?id=", body = ProjectListResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
) -> Result<axum::response::Response, HttpAppError> {
    authorize(&ctx, OperationClass::ViewProjects)?;

    if let Some(id) = query.id {
        let project = scoped_project(&state, &ctx, id).await?;
        return Ok(Json(project).into_response());
    }

    let projects = state
        .db
        .project_repository
        .list(policy::project_scope(&ctx.actor))
        .await?;
    Ok(Json(ProjectListResponse { projects }).into_response())
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::ViewProjects)?;
    let project = scoped_project(&state, &ctx, id).await?;
    Ok(Json(project))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Missing title or unknown assignee", body = ErrorResponse),
        (status = 403, description = "Role may not create projects or assignee out of reach", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    ValidatedJson(body): ValidatedJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::CreateProject)?;
    body.validate()?;
    let title = required_text(Some(&body.title), "title")?;

    let assignee = match body.assigned_to_id {
        Some(id) => Some(
            state
                .db
                .user_repository
                .find_by_id(id)
                .await?
                .ok_or_else(|| HttpAppError(AppError::Validation("Assignee not found".to_string())))?,
        ),
        None => None,
    };

    let placement = check(
        &ctx,
        OperationClass::CreateProject,
        policy::place_project(&ctx.actor, assignee.as_ref()),
    )?;

    let project = state
        .db
        .project_repository
        .create(NewProject {
            title,
            description: body.description,
            deadline: body.deadline,
            owner_id: ctx.user.id,
            assigned_to_id: placement.assigned_to_id,
            organization_id: placement.organization_id,
        })
        .await?;

    tracing::info!(
        project_id = %project.id,
        assigned_to_id = %placement.assigned_to_id,
        "Project created"
    );
    Ok((StatusCode::CREATED, Json(project)))
}

async fn apply_status_update(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
    status: WorkStatus,
) -> Result<Project, HttpAppError> {
    authorize(ctx, OperationClass::UpdateProjectStatus)?;
    let project = scoped_project(state, ctx, id).await?;
    check(
        ctx,
        OperationClass::UpdateProjectStatus,
        policy::may_update_project_status(&ctx.actor, &project),
    )?;

    let updated = state
        .db
        .project_repository
        .update_status(project.id, status)
        .await?;
    Ok(updated)
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Status updated", body = Project),
        (status = 403, description = "Caller is not the assignee", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update_project_by_path(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let project = apply_status_update(&state, &ctx, id, body.status).await?;
    Ok(Json(project))
}

#[utoipa::path(
    put,
    path = "/api/projects",
    tag = "projects",
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Status updated", body = Project),
        (status = 400, description = "id missing", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
    ValidatedJson(body): ValidatedJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = pick_id(None, query.id, body.id)?;
    let project = apply_status_update(&state, &ctx, id, body.status).await?;
    Ok(Json(project))
}

async fn apply_delete(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<DeleteResponse, HttpAppError> {
    authorize(ctx, OperationClass::DeleteProject)?;
    let project = scoped_project(state, ctx, id).await?;
    check(
        ctx,
        OperationClass::DeleteProject,
        policy::may_delete_project(&ctx.actor, &project),
    )?;

    let deleted = state.db.project_repository.delete(project.id).await?;
    if deleted == 0 {
        return Err(project_not_found());
    }
    tracing::info!(project_id = %project.id, "Project deleted");
    Ok(DeleteResponse::ok())
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project and its tasks deleted", body = DeleteResponse),
        (status = 403, description = "Caller may not delete this project", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_project_by_path(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(apply_delete(&state, &ctx, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/projects",
    tag = "projects",
    params(IdQuery),
    responses(
        (status = 200, description = "Project and its tasks deleted", body = DeleteResponse),
        (status = 400, description = "id missing", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = pick_id(None, query.id, None)?;
    Ok(Json(apply_delete(&state, &ctx, id).await?))
}
