use sqlx::{PgPool, Postgres, QueryBuilder};
use taskhive_core::{
    models::{
        DashboardStats, Insight, ProjectCompletion, ProjectDigest, StatusCounts, TaskDigest,
        TeamLeadWorkload, WorkStatus,
    },
    policy::{ProjectScope, TaskScope},
    AppError,
};
use uuid::Uuid;

use super::scope::{push_project_scope, push_task_scope};

/// Upper bound on rows handed to the summarizer
const DIGEST_LIMIT: i64 = 50;

/// Repository for insight statistics and stored project summaries
#[derive(Clone)]
pub struct InsightRepository {
    pool: PgPool,
}

impl InsightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Project and task counts over the actor's scopes
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "aggregate"))]
    pub async fn dashboard_stats(
        &self,
        projects: ProjectScope,
        tasks: TaskScope,
    ) -> Result<DashboardStats, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects p WHERE ");
        push_project_scope(&mut qb, projects);
        let total_projects = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.status, COUNT(*) FROM tasks t WHERE t.parent_task_id IS NULL AND ",
        );
        push_task_scope(&mut qb, tasks);
        qb.push(" GROUP BY t.status");
        let grouped = qb
            .build_query_as::<(WorkStatus, i64)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(DashboardStats::new(
            total_projects,
            StatusCounts::from_grouped(grouped),
        ))
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select"))]
    pub async fn project_digests(&self, scope: ProjectScope) -> Result<Vec<ProjectDigest>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                p.title,
                p.description,
                p.deadline,
                COALESCE(u.name, u.email) AS assigned_to,
                (SELECT COUNT(*) FROM tasks pt
                 WHERE pt.project_id = p.id AND pt.parent_task_id IS NULL) AS task_count
            FROM projects p
            LEFT JOIN users u ON u.id = p.assigned_to_id
            WHERE "#,
        );
        push_project_scope(&mut qb, scope);
        qb.push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(DIGEST_LIMIT);

        let digests = qb
            .build_query_as::<ProjectDigest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(digests)
    }

    /// Task lines within `scope`, soonest due first
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select"))]
    pub async fn task_digests(&self, scope: TaskScope) -> Result<Vec<TaskDigest>, AppError> {
        let mut qb = digest_query();
        push_task_scope(&mut qb, scope);
        qb.push(" ORDER BY t.due_date ASC NULLS LAST LIMIT ")
            .push_bind(DIGEST_LIMIT);

        let digests = qb
            .build_query_as::<TaskDigest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(digests)
    }

    /// Top-level task lines of one project that also fall inside `scope`
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select"))]
    pub async fn project_task_digests(
        &self,
        project_id: Uuid,
        scope: TaskScope,
    ) -> Result<Vec<TaskDigest>, AppError> {
        let mut qb = digest_query();
        qb.push("t.project_id = ").push_bind(project_id).push(" AND ");
        push_task_scope(&mut qb, scope);
        qb.push(" ORDER BY t.created_at ASC");

        let digests = qb
            .build_query_as::<TaskDigest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(digests)
    }

    /// Load carried by the user a project is assigned to
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "aggregate"))]
    pub async fn workload(&self, user_id: Uuid) -> Result<TeamLeadWorkload, AppError> {
        let total_projects = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM projects WHERE assigned_to_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let counts = self.counts_for_user(user_id).await?;

        Ok(TeamLeadWorkload {
            total_projects,
            total_tasks: counts.total,
            completed_tasks: counts.completed,
            in_progress_tasks: counts.in_progress,
        })
    }

    /// Status counts of the top-level tasks in one project
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "aggregate"))]
    pub async fn project_counts(&self, project_id: Uuid) -> Result<StatusCounts, AppError> {
        let grouped = sqlx::query_as::<Postgres, (WorkStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM tasks
            WHERE project_id = $1 AND parent_task_id IS NULL
            GROUP BY status
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StatusCounts::from_grouped(grouped))
    }

    /// Status counts of tasks a user created or holds
    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "aggregate"))]
    pub async fn counts_for_user(&self, user_id: Uuid) -> Result<StatusCounts, AppError> {
        let grouped = sqlx::query_as::<Postgres, (WorkStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM tasks
            WHERE assignee_id = $1 OR creator_id = $1
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StatusCounts::from_grouped(grouped))
    }

    /// Per-project completion of everything a lead owns or runs
    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select"))]
    pub async fn lead_projects(&self, lead_id: Uuid) -> Result<Vec<ProjectCompletion>, AppError> {
        let projects = sqlx::query_as::<Postgres, ProjectCompletion>(
            r#"
            SELECT
                p.id,
                p.title,
                p.owner_id,
                p.assigned_to_id,
                COUNT(t.id) AS total_tasks,
                COUNT(t.id) FILTER (WHERE t.status = 'DONE') AS completed_tasks
            FROM projects p
            LEFT JOIN tasks t ON t.project_id = p.id AND t.parent_task_id IS NULL
            WHERE p.owner_id = $1 OR p.assigned_to_id = $1
            GROUP BY p.id
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    #[tracing::instrument(skip(self, summary), fields(db.table = "insights", db.operation = "insert"))]
    pub async fn create(
        &self,
        project_id: Uuid,
        summary: &str,
        generated_by_id: Uuid,
    ) -> Result<Insight, AppError> {
        let insight = sqlx::query_as::<Postgres, Insight>(
            r#"
            INSERT INTO insights (id, project_id, summary, generated_by_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(summary)
        .bind(generated_by_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(insight)
    }

    /// Stored summaries of a project, newest first, optionally only those one user generated
    #[tracing::instrument(skip(self), fields(db.table = "insights", db.operation = "select"))]
    pub async fn list_for_project(
        &self,
        project_id: Uuid,
        generated_by: Option<Uuid>,
    ) -> Result<Vec<Insight>, AppError> {
        let insights = sqlx::query_as::<Postgres, Insight>(
            r#"
            SELECT * FROM insights
            WHERE project_id = $1 AND ($2::UUID IS NULL OR generated_by_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .bind(generated_by)
        .fetch_all(&self.pool)
        .await?;

        Ok(insights)
    }
}

/// Task digest projection, ready for a trailing predicate on `t`
fn digest_query() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(
        r#"
        SELECT
            t.title,
            t.status,
            p.title AS project,
            COALESCE(u.name, u.email) AS assignee,
            t.due_date,
            (SELECT COUNT(*) FROM tasks s WHERE s.parent_task_id = t.id) AS subtask_count
        FROM tasks t
        LEFT JOIN projects p ON p.id = t.project_id
        LEFT JOIN users u ON u.id = t.assignee_id
        WHERE t.parent_task_id IS NULL AND "#,
    )
}
