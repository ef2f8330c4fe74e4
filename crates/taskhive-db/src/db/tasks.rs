use sqlx::{PgPool, Postgres, QueryBuilder};
use taskhive_core::{
    models::{NewTask, Task, TaskUpdate},
    policy::TaskScope,
    AppError,
};
use uuid::Uuid;

use super::scope::{push_subtask_visibility, push_task_scope};

/// Repository for tasks and subtasks
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Top-level tasks inside `scope`, optionally narrowed to one project
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select"))]
    pub async fn list(
        &self,
        scope: TaskScope,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, AppError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT t.* FROM tasks t WHERE t.parent_task_id IS NULL AND ");
        push_task_scope(&mut qb, scope);
        if let Some(project_id) = project_id {
            qb.push(" AND t.project_id = ").push_bind(project_id);
        }
        qb.push(" ORDER BY t.created_at DESC");

        let tasks = qb.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    /// A single task inside `scope`. Subtasks are only returned to their assignee.
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select", db.record_id = %id))]
    pub async fn find(
        &self,
        scope: TaskScope,
        actor_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Task>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.* FROM tasks t WHERE t.id = ");
        qb.push_bind(id).push(" AND ");
        push_subtask_visibility(&mut qb, actor_id);
        qb.push(" AND ");
        push_task_scope(&mut qb, scope);

        let task = qb
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    /// Direct subtasks of several parents at once
    #[tracing::instrument(skip(self, parent_ids), fields(db.table = "tasks", db.operation = "select", parents = parent_ids.len()))]
    pub async fn subtasks_for_parents(&self, parent_ids: &[Uuid]) -> Result<Vec<Task>, AppError> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let subtasks = sqlx::query_as::<Postgres, Task>(
            r#"
            SELECT * FROM tasks
            WHERE parent_task_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(subtasks)
    }

    /// Direct subtasks of one parent; callers must have loaded the parent through a scope
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select"))]
    pub async fn subtasks_of(&self, parent_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.subtasks_for_parents(&[parent_id]).await
    }

    #[tracing::instrument(skip(self, new_task), fields(db.table = "tasks", db.operation = "insert"))]
    pub async fn create(&self, new_task: NewTask) -> Result<Task, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(
            r#"
            INSERT INTO tasks (
                id, title, description, status, project_id, assignee_id, creator_id, due_date,
                parent_task_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.status)
        .bind(new_task.project_id)
        .bind(new_task.assignee_id)
        .bind(new_task.creator_id)
        .bind(new_task.due_date)
        .bind(new_task.parent_task_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            task_id = %task.id,
            creator_id = %task.creator_id,
            assignee_id = ?task.assignee_id,
            parent_task_id = ?task.parent_task_id,
            "Task created"
        );

        Ok(task)
    }

    /// Apply a partial update; absent fields keep their value
    #[tracing::instrument(skip(self, update), fields(db.table = "tasks", db.operation = "update", db.record_id = %id))]
    pub async fn update(&self, id: Uuid, update: TaskUpdate) -> Result<Task, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                due_date = COALESCE($5, due_date),
                assignee_id = COALESCE($6, assignee_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.status)
        .bind(update.due_date)
        .bind(update.assignee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        Ok(task)
    }

    /// Delete a task; its subtasks go with it through the parent FK
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("Task not found".to_string()));
        }

        tracing::info!(task_id = %id, "Task deleted");
        Ok(())
    }
}
