use std::collections::HashMap;

use sqlx::{PgPool, Postgres};
use taskhive_core::{
    models::{AttachmentBlob, NewAttachment, Note, NoteAttachment, NoteWithAttachments},
    quota::text_bytes,
    AppError,
};
use uuid::Uuid;

use super::transaction::TransactionGuard;

const ATTACHMENT_COLUMNS: &str = "id, note_id, file_name, mime_type, size_bytes, created_at";

/// Repository for private notes and their attachments
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bytes used by a user's note text and attachments
    #[tracing::instrument(skip(self), fields(db.table = "notes", db.operation = "select"))]
    pub async fn usage_bytes(&self, owner_id: Uuid) -> Result<i64, AppError> {
        let usage = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT
                COALESCE((SELECT SUM(n.size_bytes) FROM notes n WHERE n.owner_id = $1), 0)::BIGINT
                + COALESCE((
                    SELECT SUM(a.size_bytes)
                    FROM note_attachments a
                    JOIN notes n ON n.id = a.note_id
                    WHERE n.owner_id = $1
                ), 0)::BIGINT
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(usage)
    }

    /// A user's notes with attachment metadata, newest first
    #[tracing::instrument(skip(self), fields(db.table = "notes", db.operation = "select"))]
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<NoteWithAttachments>, AppError> {
        let notes = sqlx::query_as::<Postgres, Note>(
            "SELECT * FROM notes WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let note_ids: Vec<Uuid> = notes.iter().map(|n| n.id).collect();
        let attachments = sqlx::query_as::<Postgres, NoteAttachment>(&format!(
            "SELECT {} FROM note_attachments WHERE note_id = ANY($1) ORDER BY created_at ASC",
            ATTACHMENT_COLUMNS
        ))
        .bind(&note_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_note: HashMap<Uuid, Vec<NoteAttachment>> = HashMap::new();
        for attachment in attachments {
            by_note.entry(attachment.note_id).or_default().push(attachment);
        }

        Ok(notes
            .into_iter()
            .map(|note| NoteWithAttachments {
                attachments: by_note.remove(&note.id).unwrap_or_default(),
                note,
            })
            .collect())
    }

    /// Store a note and its attachments atomically
    #[tracing::instrument(skip(self, content, files), fields(db.table = "notes", db.operation = "insert", files = files.len()))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        title: &str,
        content: &str,
        files: Vec<NewAttachment>,
    ) -> Result<NoteWithAttachments, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "create_note").await?;

        let note = sqlx::query_as::<Postgres, Note>(
            r#"
            INSERT INTO notes (id, owner_id, title, content, size_bytes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(content)
        .bind(text_bytes(content))
        .fetch_one(&mut *tx)
        .await?;

        let mut attachments = Vec::with_capacity(files.len());
        for file in files {
            let attachment = sqlx::query_as::<Postgres, NoteAttachment>(&format!(
                r#"
                INSERT INTO note_attachments (id, note_id, file_name, mime_type, size_bytes, data)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {}
                "#,
                ATTACHMENT_COLUMNS
            ))
            .bind(Uuid::new_v4())
            .bind(note.id)
            .bind(&file.file_name)
            .bind(&file.mime_type)
            .bind(file.data.len() as i64)
            .bind(&file.data)
            .fetch_one(&mut *tx)
            .await?;
            attachments.push(attachment);
        }

        tx.commit().await?;

        tracing::info!(
            note_id = %note.id,
            owner_id = %owner_id,
            attachments = attachments.len(),
            "Note created"
        );

        Ok(NoteWithAttachments { note, attachments })
    }

    /// Delete an owned note; false when it does not exist for this owner
    #[tracing::instrument(skip(self), fields(db.table = "notes", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "note_attachments", db.operation = "select", db.record_id = %attachment_id))]
    pub async fn attachment(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<Option<AttachmentBlob>, AppError> {
        let blob = sqlx::query_as::<Postgres, AttachmentBlob>(
            r#"
            SELECT a.file_name, a.mime_type, a.data
            FROM note_attachments a
            JOIN notes n ON n.id = a.note_id
            WHERE a.id = $1 AND a.note_id = $2 AND n.owner_id = $3
            "#,
        )
        .bind(attachment_id)
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(blob)
    }

    #[tracing::instrument(skip(self), fields(db.table = "note_attachments", db.operation = "delete", db.record_id = %attachment_id))]
    pub async fn delete_attachment(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<bool, AppError> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM note_attachments a
            USING notes n
            WHERE a.id = $1 AND a.note_id = $2 AND n.id = a.note_id AND n.owner_id = $3
            "#,
        )
        .bind(attachment_id)
        .bind(note_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted > 0)
    }
}
