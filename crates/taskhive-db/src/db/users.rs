use sqlx::{PgConnection, PgPool, Postgres};
use taskhive_core::{
    hierarchy::{next_tl_id, AssignableTargets},
    models::{NewUser, Organization, Role, TeamLeadEntry, User},
    AppError,
};
use uuid::Uuid;

use super::{conflict_on_unique, transaction::TransactionGuard};

const EMAIL_TAKEN: &str = "Email already registered";

/// Repository for users and the registration flows that create them
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Team lead identified by its sequential number inside the organization
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn find_team_lead_by_number(
        &self,
        organization_id: Uuid,
        tl_id_within_org: i32,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT * FROM users
            WHERE organization_id = $1 AND tl_id_within_org = $2 AND role = 'TEAM_LEAD'
            "#,
        )
        .bind(organization_id)
        .bind(tl_id_within_org)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// TEAM_LEAD users of an organization, by name
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list_team_leads(&self, organization_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT * FROM users
            WHERE organization_id = $1 AND role = 'TEAM_LEAD'
            ORDER BY name ASC NULLS LAST, email ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Public team-lead directory of an organization, by tlId
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn team_lead_directory(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<TeamLeadEntry>, AppError> {
        let rows = sqlx::query_as::<Postgres, (Uuid, Option<i32>, Option<String>)>(
            r#"
            SELECT id, tl_id_within_org, name FROM users
            WHERE organization_id = $1 AND role = 'TEAM_LEAD'
            ORDER BY tl_id_within_org ASC NULLS LAST
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, tl_id_within_org, name)| TeamLeadEntry {
                id,
                tl_id_within_org,
                name,
            })
            .collect())
    }

    /// TEAM_MEMBER users reporting to a lead, by name
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list_members(&self, team_lead_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT * FROM users
            WHERE team_lead_id = $1 AND role = 'TEAM_MEMBER'
            ORDER BY name ASC NULLS LAST, email ASC
            "#,
        )
        .bind(team_lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Materialize an assignable-target set
    pub async fn assignable(&self, targets: AssignableTargets) -> Result<Vec<User>, AppError> {
        match targets {
            AssignableTargets::TeamLeadsOf(organization_id) => {
                self.list_team_leads(organization_id).await
            }
            AssignableTargets::MembersOf(team_lead_id) => self.list_members(team_lead_id).await,
            AssignableTargets::Nobody => Ok(Vec::new()),
        }
    }

    /// Register a MANAGER together with the organization it owns
    #[tracing::instrument(skip(self, new_user), fields(db.table = "users", db.operation = "insert"))]
    pub async fn register_manager(
        &self,
        new_user: NewUser,
        organization_name: &str,
    ) -> Result<(User, Organization), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "register_manager").await?;

        let user = insert_user(&mut tx, &new_user, None, None, None).await?;

        let organization = sqlx::query_as::<Postgres, Organization>(
            r#"
            INSERT INTO organizations (id, name, manager_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_name)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Organization name already exists"))?;

        let user = sqlx::query_as::<Postgres, User>(
            "UPDATE users SET organization_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .bind(organization.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user.id,
            organization_id = %organization.id,
            "Manager registered with organization"
        );

        Ok((user, organization))
    }

    /// Register a TEAM_LEAD with the next sequential tlId of the organization
    #[tracing::instrument(skip(self, new_user), fields(db.table = "users", db.operation = "insert"))]
    pub async fn register_team_lead(
        &self,
        new_user: NewUser,
        organization_id: Uuid,
    ) -> Result<User, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "register_team_lead").await?;
        let user = Self::create_team_lead_in(&mut tx, &new_user, organization_id).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user.id,
            organization_id = %organization_id,
            tl_id_within_org = ?user.tl_id_within_org,
            "Team lead registered"
        );

        Ok(user)
    }

    /// Insert a TEAM_LEAD inside a caller-managed transaction
    pub async fn create_team_lead_in(
        conn: &mut PgConnection,
        new_user: &NewUser,
        organization_id: Uuid,
    ) -> Result<User, AppError> {
        let tl_id = allocate_tl_id(conn, organization_id).await?;
        insert_user(conn, new_user, Some(organization_id), None, Some(tl_id)).await
    }

    /// Register a TEAM_MEMBER under `lead`, inheriting its organization
    #[tracing::instrument(skip(self, new_user, lead), fields(db.table = "users", db.operation = "insert"))]
    pub async fn register_member(&self, new_user: NewUser, lead: &User) -> Result<User, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = insert_user(
            &mut conn,
            &new_user,
            lead.organization_id,
            Some(lead.id),
            None,
        )
        .await?;

        tracing::info!(user_id = %user.id, team_lead_id = %lead.id, "Team member registered");
        Ok(user)
    }

    #[tracing::instrument(skip(self, new_user), fields(db.table = "users", db.operation = "insert"))]
    pub async fn register_individual(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut conn = self.pool.acquire().await?;
        let user = insert_user(&mut conn, &new_user, None, None, None).await?;

        tracing::info!(user_id = %user.id, "Individual registered");
        Ok(user)
    }

    #[tracing::instrument(skip(conn, password_hash), fields(db.table = "users", db.operation = "update", db.record_id = %user_id))]
    pub async fn update_password_in(
        conn: &mut PgConnection,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Give an existing team lead a tlId if it has none
    pub async fn ensure_tl_id_in(
        conn: &mut PgConnection,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<User, AppError> {
        let tl_id = allocate_tl_id(conn, organization_id).await?;
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            UPDATE users
            SET tl_id_within_org = COALESCE(tl_id_within_org, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tl_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }
}

/// Lock the organization row and compute the next tlId. The lock serializes
/// concurrent allocations in the same organization until the transaction ends.
async fn allocate_tl_id(conn: &mut PgConnection, organization_id: Uuid) -> Result<i32, AppError> {
    let locked = sqlx::query_scalar::<Postgres, Uuid>(
        "SELECT id FROM organizations WHERE id = $1 FOR UPDATE",
    )
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?;

    if locked.is_none() {
        return Err(AppError::Validation("Organization not found".to_string()));
    }

    let current_max = sqlx::query_scalar::<Postgres, Option<i32>>(
        r#"
        SELECT MAX(tl_id_within_org) FROM users
        WHERE organization_id = $1 AND role = 'TEAM_LEAD'
        "#,
    )
    .bind(organization_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(next_tl_id(current_max))
}

async fn insert_user(
    conn: &mut PgConnection,
    new_user: &NewUser,
    organization_id: Option<Uuid>,
    team_lead_id: Option<Uuid>,
    tl_id_within_org: Option<i32>,
) -> Result<User, AppError> {
    debug_assert!(tl_id_within_org.is_none() || new_user.role == Role::TeamLead);

    sqlx::query_as::<Postgres, User>(
        r#"
        INSERT INTO users (
            id, email, name, role, password_hash, organization_id, team_lead_id, tl_id_within_org
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new_user.email)
    .bind(&new_user.name)
    .bind(new_user.role)
    .bind(&new_user.password_hash)
    .bind(organization_id)
    .bind(team_lead_id)
    .bind(tl_id_within_org)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| conflict_on_unique(e, EMAIL_TAKEN))
}
