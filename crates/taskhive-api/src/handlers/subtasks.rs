//! Subtasks: one level below a task, owned by the parent's TEAM_MEMBER assignee.

use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::tasks::scoped_task;
use crate::handlers::{
    authorize, check, optional_text, pick_id, required_text, DeleteResponse, IdQuery,
};
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
use taskhive_core::models::{NewTask, Task, TaskUpdate, WorkStatus};
use taskhive_core::policy::{self, OperationClass};
use taskhive_core::AppError;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct SubtaskListQuery {
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubtaskRequest {
    pub parent_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubtaskRequest {
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubtaskListResponse {
    pub subtasks: Vec<Task>,
}

fn subtask_not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("Subtask not found".to_string()))
}

/// A subtask reachable by the actor; top-level tasks do not qualify
async fn scoped_subtask(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<Task, HttpAppError> {
    match scoped_task(state, ctx, id).await {
        Ok(task) if task.is_subtask() => Ok(task),
        Ok(_) | Err(HttpAppError(AppError::NotFound(_))) => Err(subtask_not_found()),
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/subtasks",
    tag = "subtasks",
    params(SubtaskListQuery),
    responses(
        (status = 200, description = "Subtasks of the parent visible to the caller", body = SubtaskListResponse),
        (status = 400, description = "parentId missing", body = ErrorResponse),
        (status = 404, description = "Parent task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_subtasks(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<SubtaskListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::ViewSubtasks)?;
    let parent_id = query
        .parent_id
        .ok_or_else(|| HttpAppError(AppError::Validation("parentId is required".to_string())))?;

    let parent = scoped_task(&state, &ctx, parent_id).await?;
    check(
        &ctx,
        OperationClass::ViewSubtasks,
        policy::may_view_subtasks(&ctx.actor, &parent),
    )?;

    let subtasks = state.db.task_repository.subtasks_of(parent.id).await?;
    Ok(Json(SubtaskListResponse {
        subtasks: policy::oversight_subtasks(&ctx.actor, subtasks),
    }))
}

#[utoipa::path(
    post,
    path = "/api/subtasks",
    tag = "subtasks",
    request_body = CreateSubtaskRequest,
    responses(
        (status = 201, description = "Subtask created", body = Task),
        (status = 400, description = "Parent is itself a subtask", body = ErrorResponse),
        (status = 403, description = "Caller is not the parent's assigned team member", body = ErrorResponse),
        (status = 404, description = "Parent task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn create_subtask(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    ValidatedJson(body): ValidatedJson<CreateSubtaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::CreateSubtask)?;
    body.validate()?;
    let title = required_text(Some(&body.title), "title")?;

    let parent = scoped_task(&state, &ctx, body.parent_id).await?;
    if parent.is_subtask() {
        return Err(HttpAppError(AppError::Validation(
            "Subtasks cannot have subtasks".to_string(),
        )));
    }
    let placement = check(
        &ctx,
        OperationClass::CreateSubtask,
        policy::place_subtask(&ctx.actor, &parent),
    )?;

    let subtask = state
        .db
        .task_repository
        .create(NewTask {
            title,
            description: body.description,
            status: body.status.unwrap_or_default(),
            project_id: placement.project_id,
            assignee_id: placement.assignee_id,
            creator_id: ctx.user.id,
            due_date: body.due_date,
            parent_task_id: Some(placement.parent_task_id),
        })
        .await?;

    tracing::info!(subtask_id = %subtask.id, parent_id = %parent.id, "Subtask created");
    Ok((StatusCode::CREATED, Json(subtask)))
}

async fn apply_update(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
    body: UpdateSubtaskRequest,
) -> Result<Task, HttpAppError> {
    authorize(ctx, OperationClass::ModifySubtask)?;
    body.validate()?;

    let update = TaskUpdate {
        title: optional_text(body.title, "title")?,
        description: body.description,
        status: body.status,
        due_date: body.due_date,
        assignee_id: None,
    };
    if update.is_empty() {
        return Err(HttpAppError(AppError::Validation(
            "No fields to update".to_string(),
        )));
    }

    let subtask = scoped_subtask(state, ctx, id).await?;
    check(
        ctx,
        OperationClass::ModifySubtask,
        policy::may_modify_subtask(&ctx.actor, &subtask),
    )?;

    Ok(state.db.task_repository.update(subtask.id, update).await?)
}

#[utoipa::path(
    put,
    path = "/api/subtasks/{id}",
    tag = "subtasks",
    params(("id" = Uuid, Path, description = "Subtask ID")),
    request_body = UpdateSubtaskRequest,
    responses(
        (status = 200, description = "Subtask updated", body = Task),
        (status = 403, description = "Caller is not the assigned team member", body = ErrorResponse),
        (status = 404, description = "Subtask not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update_subtask_by_path(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateSubtaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(apply_update(&state, &ctx, id, body).await?))
}

#[utoipa::path(
    put,
    path = "/api/subtasks",
    tag = "subtasks",
    request_body = UpdateSubtaskRequest,
    responses(
        (status = 200, description = "Subtask updated", body = Task),
        (status = 400, description = "id missing", body = ErrorResponse),
        (status = 404, description = "Subtask not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update_subtask(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
    ValidatedJson(body): ValidatedJson<UpdateSubtaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = pick_id(None, query.id, body.id)?;
    Ok(Json(apply_update(&state, &ctx, id, body).await?))
}

async fn apply_delete(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<DeleteResponse, HttpAppError> {
    authorize(ctx, OperationClass::ModifySubtask)?;
    let subtask = scoped_subtask(state, ctx, id).await?;
    check(
        ctx,
        OperationClass::ModifySubtask,
        policy::may_modify_subtask(&ctx.actor, &subtask),
    )?;

    state.db.task_repository.delete(subtask.id).await?;
    Ok(DeleteResponse::ok())
}

#[utoipa::path(
    delete,
    path = "/api/subtasks/{id}",
    tag = "subtasks",
    params(("id" = Uuid, Path, description = "Subtask ID")),
    responses(
        (status = 200, description = "Subtask deleted", body = DeleteResponse),
        (status = 404, description = "Subtask not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_subtask_by_path(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(apply_delete(&state, &ctx, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/subtasks",
    tag = "subtasks",
    params(IdQuery),
    responses(
        (status = 200, description = "Subtask deleted", body = DeleteResponse),
        (status = 400, description = "id missing", body = ErrorResponse),
        (status = 404, description = "Subtask not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_subtask(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = pick_id(None, query.id, None)?;
    Ok(Json(apply_delete(&state, &ctx, id).await?))
}
