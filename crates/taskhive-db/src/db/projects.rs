use sqlx::{PgPool, Postgres, QueryBuilder};
use taskhive_core::{
    models::{NewProject, Project, WorkStatus},
    policy::ProjectScope,
    AppError,
};
use uuid::Uuid;

use super::{scope::push_project_scope, transaction::TransactionGuard};

/// Repository for projects
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Projects inside `scope`, newest first
    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select"))]
    pub async fn list(&self, scope: ProjectScope) -> Result<Vec<Project>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM projects p WHERE ");
        push_project_scope(&mut qb, scope);
        qb.push(" ORDER BY p.created_at DESC");

        let projects = qb.build_query_as::<Project>().fetch_all(&self.pool).await?;
        Ok(projects)
    }

    /// A single project, only if it lies inside `scope`
    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select", db.record_id = %id))]
    pub async fn find(&self, scope: ProjectScope, id: Uuid) -> Result<Option<Project>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM projects p WHERE p.id = ");
        qb.push_bind(id).push(" AND ");
        push_project_scope(&mut qb, scope);

        let project = qb
            .build_query_as::<Project>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    #[tracing::instrument(skip(self, new_project), fields(db.table = "projects", db.operation = "insert"))]
    pub async fn create(&self, new_project: NewProject) -> Result<Project, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(
            r#"
            INSERT INTO projects (
                id, title, description, deadline, owner_id, assigned_to_id, organization_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_project.title)
        .bind(&new_project.description)
        .bind(new_project.deadline)
        .bind(new_project.owner_id)
        .bind(new_project.assigned_to_id)
        .bind(new_project.organization_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            project_id = %project.id,
            owner_id = %project.owner_id,
            assigned_to_id = ?project.assigned_to_id,
            "Project created"
        );

        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "update", db.record_id = %id))]
    pub async fn update_status(&self, id: Uuid, status: WorkStatus) -> Result<Project, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(
            "UPDATE projects SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        Ok(project)
    }

    /// Delete a project with all of its tasks and their subtasks. Returns the
    /// number of task rows removed.
    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "delete_project").await?;

        // Subtasks share the parent's project id; the parent FK cascades any that do not.
        let tasks_removed = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("Project not found".to_string()));
        }

        tx.commit().await?;

        tracing::info!(project_id = %id, tasks_removed, "Project deleted");
        Ok(tasks_removed)
    }
}
