//! Personal notes with file attachments, bounded by a per-user storage quota.

use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::DeleteResponse;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use taskhive_core::models::{NewAttachment, NoteWithAttachments};
use taskhive_core::quota;
use taskhive_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotesResponse {
    pub notes: Vec<NoteWithAttachments>,
    pub usage_bytes: i64,
    pub limit_bytes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDeletedResponse {
    pub success: bool,
    pub usage_bytes: i64,
}

/// Fields of a note upload form
#[derive(Debug, Default)]
struct NoteForm {
    title: Option<String>,
    content: Option<String>,
    attachments: Vec<NewAttachment>,
}

impl NoteForm {
    fn requested_bytes(&self) -> i64 {
        let text = self.content.as_deref().map(quota::text_bytes).unwrap_or(0);
        let files: i64 = self.attachments.iter().map(|a| a.data.len() as i64).sum();
        text + files
    }
}

async fn read_note_form(mut multipart: Multipart) -> Result<NoteForm, AppError> {
    let mut form = NoteForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field_name.as_str() {
            "title" | "content" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read {}: {}", field_name, e)))?;
                if field_name == "title" {
                    form.title = Some(text);
                } else {
                    form.content = Some(text);
                }
            }
            "attachments" | "files" => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or("attachment"));
                let mime_type = field
                    .content_type()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;
                form.attachments.push(NewAttachment {
                    file_name,
                    mime_type,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Last path segment without quotes or control characters
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

#[utoipa::path(
    get,
    path = "/api/notes",
    tag = "notes",
    responses(
        (status = 200, description = "Caller's notes with attachment metadata and quota usage", body = NotesResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let notes_repo = &state.db.note_repository;
    let notes = notes_repo.list(ctx.user.id).await?;
    let usage_bytes = notes_repo.usage_bytes(ctx.user.id).await?;

    Ok(Json(NotesResponse {
        notes,
        usage_bytes,
        limit_bytes: state.config.note_quota_bytes(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/notes",
    tag = "notes",
    request_body(content_type = "multipart/form-data", description = "title, content and attachments files"),
    responses(
        (status = 201, description = "Note created", body = NoteWithAttachments),
        (status = 400, description = "Missing title or storage limit reached", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, multipart))]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_note_form(multipart).await?;
    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("title is required".to_string()))?
        .to_string();

    let notes_repo = &state.db.note_repository;
    let used = notes_repo.usage_bytes(ctx.user.id).await?;
    quota::ensure_within_quota(used, form.requested_bytes(), state.config.note_quota_bytes())?;

    let content = form.content.unwrap_or_default();
    let note = notes_repo
        .create(ctx.user.id, &title, &content, form.attachments)
        .await?;

    tracing::info!(
        note_id = %note.note.id,
        attachments = note.attachments.len(),
        "Note created"
    );
    Ok((StatusCode::CREATED, Json(note)))
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    tag = "notes",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note and its attachments deleted", body = NoteDeletedResponse),
        (status = 404, description = "Note not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let notes_repo = &state.db.note_repository;
    if !notes_repo.delete(ctx.user.id, id).await? {
        return Err(HttpAppError(AppError::NotFound("Note not found".to_string())));
    }
    let usage_bytes = notes_repo.usage_bytes(ctx.user.id).await?;

    Ok(Json(NoteDeletedResponse {
        success: true,
        usage_bytes,
    }))
}

#[utoipa::path(
    get,
    path = "/api/notes/{id}/attachments/{attachment_id}",
    tag = "notes",
    params(
        ("id" = Uuid, Path, description = "Note ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Attachment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn download_attachment(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path((note_id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let blob = state
        .db
        .note_repository
        .attachment(ctx.user.id, note_id, attachment_id)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Attachment not found".to_string())))?;

    let content_type = HeaderValue::from_str(&blob.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        sanitize_file_name(&blob.file_name)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        blob.data,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}/attachments/{attachment_id}",
    tag = "notes",
    params(
        ("id" = Uuid, Path, description = "Note ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment deleted", body = DeleteResponse),
        (status = 404, description = "Attachment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    Path((note_id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let deleted = state
        .db
        .note_repository
        .delete_attachment(ctx.user.id, note_id, attachment_id)
        .await?;
    if !deleted {
        return Err(HttpAppError(AppError::NotFound(
            "Attachment not found".to_string(),
        )));
    }
    Ok(Json(DeleteResponse::ok()))
}
