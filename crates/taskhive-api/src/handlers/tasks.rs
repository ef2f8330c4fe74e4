use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{
    authorize, check, optional_text, pick_id, required_text, DeleteResponse, IdQuery,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use taskhive_core::models::{NewTask, Task, TaskSummary, TaskUpdate, TaskView, User, WorkStatus};
use taskhive_core::policy::{self, Actor, OperationClass, TaskChange, TaskDraft};
use taskhive_core::risk::{self, RiskSummary};
use taskhive_core::AppError;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    /// Return the lighter projection
    #[serde(default)]
    pub summary: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_personal: bool,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// Used when the id is not in the path
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
}

impl UpdateTaskRequest {
    fn into_update(self) -> Result<TaskUpdate, HttpAppError> {
        Ok(TaskUpdate {
            title: optional_text(self.title, "title")?,
            description: self.description,
            status: self.status,
            due_date: self.due_date,
            assignee_id: self.assignee_id,
        })
    }
}

/// Checks that need nothing from the database; returns the trimmed title
fn admit_new_task(ctx: &SessionContext, body: &CreateTaskRequest) -> Result<String, HttpAppError> {
    authorize(ctx, OperationClass::CreateTask)?;
    check(
        ctx,
        OperationClass::CreateTask,
        policy::check_task_kind(&ctx.actor, body.is_personal),
    )?;
    body.validate()?;
    required_text(Some(&body.title), "title")
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
    pub risk_summary: RiskSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummaryListResponse {
    pub tasks: Vec<TaskSummary>,
    pub risk_summary: RiskSummary,
}

pub(crate) fn task_not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("Task not found".to_string()))
}

/// Load a task through the actor's scope; anything outside it is "not found"
pub(crate) async fn scoped_task(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<Task, HttpAppError> {
    state
        .db
        .task_repository
        .find(policy::task_scope(&ctx.actor), ctx.actor.id, id)
        .await?
        .ok_or_else(task_not_found)
}

/// A user referenced as the new assignee; unknown ids are a validation error
async fn load_assignee(state: &AppState, id: Option<Uuid>) -> Result<Option<User>, HttpAppError> {
    match id {
        Some(id) => state
            .db
            .user_repository
            .find_by_id(id)
            .await?
            .map(Some)
            .ok_or_else(|| HttpAppError(AppError::Validation("Assignee not found".to_string()))),
        None => Ok(None),
    }
}

/// Attach risk and the subtasks the actor may see to each task
pub(crate) async fn build_views(
    state: &AppState,
    actor: &Actor,
    tasks: Vec<Task>,
    now: DateTime<Utc>,
) -> Result<Vec<TaskView>, HttpAppError> {
    let parent_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let subtasks = state
        .db
        .task_repository
        .subtasks_for_parents(&parent_ids)
        .await?;

    let mut by_parent: HashMap<Uuid, Vec<Task>> = HashMap::new();
    for subtask in policy::visible_subtasks(actor, subtasks) {
        if let Some(parent_id) = subtask.parent_task_id {
            by_parent.entry(parent_id).or_default().push(subtask);
        }
    }

    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            risk: risk::assess_task(&task, now),
            subtasks: by_parent.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect())
}

pub(crate) async fn build_view(
    state: &AppState,
    actor: &Actor,
    task: Task,
) -> Result<TaskView, HttpAppError> {
    let mut views = build_views(state, actor, vec![task], Utc::now()).await?;
    views.pop().ok_or_else(task_not_found)
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Visible top-level tasks with risk, or one task with ?id=", body = TaskListResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<TaskListQuery>,
) -> Result<Response, HttpAppError> {
    authorize(&ctx, OperationClass::ViewTasks)?;

    if let Some(id) = query.id {
        let task = scoped_task(&state, &ctx, id).await?;
        return Ok(Json(build_view(&state, &ctx.actor, task).await?).into_response());
    }

    let tasks = state
        .db
        .task_repository
        .list(policy::task_scope(&ctx.actor), query.project_id)
        .await?;
    let now = Utc::now();
    let risk_summary = risk::summarize(&tasks, now);

    if query.summary {
        let tasks = tasks.iter().map(TaskSummary::from).collect();
        return Ok(Json(TaskSummaryListResponse {
            tasks,
            risk_summary,
        })
        .into_response());
    }

    let tasks = build_views(&state, &ctx.actor, tasks, now).await?;
    Ok(Json(TaskListResponse {
        tasks,
        risk_summary,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task with risk and visible subtasks", body = TaskView),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::ViewTasks)?;
    let task = scoped_task(&state, &ctx, id).await?;
    Ok(Json(build_view(&state, &ctx.actor, task).await?))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskView),
        (status = 400, description = "Missing title or assignee", body = ErrorResponse),
        (status = 403, description = "Assignee or project out of reach", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    ValidatedJson(body): ValidatedJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let title = admit_new_task(&ctx, &body)?;

    let (assignee, project) = if body.is_personal {
        (None, None)
    } else {
        let assignee = load_assignee(&state, body.assignee_id).await?;
        let project = match body.project_id {
            Some(id) => Some(
                state
                    .db
                    .project_repository
                    .find(policy::project_scope(&ctx.actor), id)
                    .await?
                    .ok_or_else(|| {
                        HttpAppError(AppError::NotFound("Project not found".to_string()))
                    })?,
            ),
            None => None,
        };
        (assignee, project)
    };

    let placement = check(
        &ctx,
        OperationClass::CreateTask,
        policy::place_task(
            &ctx.actor,
            TaskDraft {
                personal: body.is_personal,
                assignee: assignee.as_ref(),
                project: project.as_ref(),
            },
        ),
    )?;

    let task = state
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
            parent_task_id: None,
        })
        .await?;

    tracing::info!(
        task_id = %task.id,
        assignee_id = %placement.assignee_id,
        personal = body.is_personal,
        "Task created"
    );

    let view = TaskView {
        risk: risk::assess_task(&task, Utc::now()),
        subtasks: Vec::new(),
        task,
    };
    Ok((StatusCode::CREATED, Json(view)))
}

async fn apply_update(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
    body: UpdateTaskRequest,
) -> Result<TaskView, HttpAppError> {
    authorize(ctx, OperationClass::UpdateTask)?;
    body.validate()?;

    let update = body.into_update()?;
    if update.is_empty() {
        return Err(HttpAppError(AppError::Validation(
            "No fields to update".to_string(),
        )));
    }

    let task = scoped_task(state, ctx, id).await?;
    let reassign_to = load_assignee(state, update.assignee_id).await?;
    check(
        ctx,
        OperationClass::UpdateTask,
        policy::may_update_task(
            &ctx.actor,
            &task,
            TaskChange {
                status: update.status.is_some(),
                content: update.touches_content(),
                reassign_to: reassign_to.as_ref(),
            },
        ),
    )?;

    let updated = state.db.task_repository.update(task.id, update).await?;
    build_view(state, &ctx.actor, updated).await
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskView),
        (status = 400, description = "Nothing to update", body = ErrorResponse),
        (status = 403, description = "Caller may not change these fields", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update_task_by_path(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(apply_update(&state, &ctx, id, body).await?))
}

#[utoipa::path(
    put,
    path = "/api/tasks",
    tag = "tasks",
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskView),
        (status = 400, description = "id missing or nothing to update", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
    ValidatedJson(body): ValidatedJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = pick_id(None, query.id, body.id)?;
    Ok(Json(apply_update(&state, &ctx, id, body).await?))
}

async fn apply_delete(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<DeleteResponse, HttpAppError> {
    authorize(ctx, OperationClass::DeleteTask)?;
    let task = scoped_task(state, ctx, id).await?;
    check(
        ctx,
        OperationClass::DeleteTask,
        policy::may_delete_task(&ctx.actor, &task),
    )?;

    state.db.task_repository.delete(task.id).await?;
    tracing::info!(task_id = %task.id, "Task deleted");
    Ok(DeleteResponse::ok())
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task and its subtasks deleted", body = DeleteResponse),
        (status = 403, description = "Only the creator or a manager may delete", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_task_by_path(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(apply_delete(&state, &ctx, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/tasks",
    tag = "tasks",
    params(IdQuery),
    responses(
        (status = 200, description = "Task and its subtasks deleted", body = DeleteResponse),
        (status = 400, description = "id missing", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = pick_id(None, query.id, None)?;
    Ok(Json(apply_delete(&state, &ctx, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhive_core::models::Role;

    #[test]
    fn update_request_maps_to_partial_update() {
        let request: UpdateTaskRequest = serde_json::from_value(serde_json::json!({
            "status": "DONE"
        }))
        .unwrap();
        let update = request.into_update().unwrap();
        assert_eq!(update.status, Some(WorkStatus::Done));
        assert!(!update.touches_content());
        assert!(!update.is_empty());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateTaskRequest::default().into_update().unwrap().is_empty());
    }

    #[test]
    fn blank_title_update_is_rejected() {
        let request = UpdateTaskRequest {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            request.into_update(),
            Err(HttpAppError(AppError::Validation(_)))
        ));
    }

    fn session(role: Role) -> SessionContext {
        let now = Utc::now();
        let organization_id = (role != Role::Individual).then(Uuid::new_v4);
        let user = User {
            id: Uuid::new_v4(),
            email: "someone@acme.test".to_string(),
            name: None,
            role,
            password_hash: String::new(),
            organization_id,
            team_lead_id: (role == Role::TeamMember).then(Uuid::new_v4),
            tl_id_within_org: (role == Role::TeamLead).then_some(1),
            created_at: now,
            updated_at: now,
        };
        SessionContext::new(user, None)
    }

    fn create_request(value: serde_json::Value) -> CreateTaskRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn member_non_personal_create_is_forbidden_before_lookups() {
        let body = create_request(serde_json::json!({
            "title": "sneaky",
            "projectId": Uuid::new_v4()
        }));
        assert!(matches!(
            admit_new_task(&session(Role::TeamMember), &body),
            Err(HttpAppError(AppError::Forbidden(_)))
        ));

        let personal = create_request(serde_json::json!({
            "title": " notes ",
            "isPersonal": true
        }));
        assert_eq!(
            admit_new_task(&session(Role::TeamMember), &personal).unwrap(),
            "notes"
        );
    }

    #[test]
    fn blank_title_create_is_rejected() {
        let body = create_request(serde_json::json!({
            "title": "   ",
            "assigneeId": Uuid::new_v4()
        }));
        assert!(matches!(
            admit_new_task(&session(Role::TeamLead), &body),
            Err(HttpAppError(AppError::Validation(_)))
        ));
    }

    #[test]
    fn personal_flag_defaults_to_false() {
        let request: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "Write report"
        }))
        .unwrap();
        assert!(!request.is_personal);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_status_is_rejected_at_deserialization() {
        let result: Result<UpdateTaskRequest, _> =
            serde_json::from_value(serde_json::json!({ "status": "ARCHIVED" }));
        assert!(result.is_err());
    }
}
