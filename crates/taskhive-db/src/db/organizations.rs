use sqlx::{PgPool, Postgres};
use taskhive_core::{models::Organization, AppError};
use uuid::Uuid;

/// Repository for organizations
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization =
            sqlx::query_as::<Postgres, Organization>("SELECT * FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(organization)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, AppError> {
        let organization =
            sqlx::query_as::<Postgres, Organization>("SELECT * FROM organizations WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(organization)
    }

    /// Organization owned by a MANAGER
    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    pub async fn find_by_manager(&self, manager_id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<Postgres, Organization>(
            "SELECT * FROM organizations WHERE manager_id = $1",
        )
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }
}
