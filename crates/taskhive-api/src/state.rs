//! Application state shared by every handler.
//!
//! Repositories are grouped in [`DbState`]; the external collaborators (mailer,
//! insight summarizer) are trait objects so tests can swap in failing ones.

use crate::auth::{AuthState, JwtService};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_core::Config;
use taskhive_db::{
    InsightRepository, NoteRepository, OrganizationRepository, ProjectRepository,
    ResetTokenRepository, TaskRepository, UserRepository,
};
use taskhive_services::{InsightSummarizer, Mailer};

/// Database pool and one repository per entity
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub user_repository: UserRepository,
    pub organization_repository: OrganizationRepository,
    pub project_repository: ProjectRepository,
    pub task_repository: TaskRepository,
    pub note_repository: NoteRepository,
    pub reset_token_repository: ResetTokenRepository,
    pub insight_repository: InsightRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: UserRepository::new(pool.clone()),
            organization_repository: OrganizationRepository::new(pool.clone()),
            project_repository: ProjectRepository::new(pool.clone()),
            task_repository: TaskRepository::new(pool.clone()),
            note_repository: NoteRepository::new(pool.clone()),
            reset_token_repository: ResetTokenRepository::new(pool.clone()),
            insight_repository: InsightRepository::new(pool.clone()),
            pool,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub jwt: JwtService,
    pub mailer: Arc<dyn Mailer>,
    pub summarizer: InsightSummarizer,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        mailer: Arc<dyn Mailer>,
        summarizer: InsightSummarizer,
    ) -> Self {
        let jwt = JwtService::new(config.jwt_secret(), config.jwt_expires_in());
        Self {
            db: DbState::new(pool),
            jwt,
            mailer,
            summarizer,
            config,
        }
    }

    /// State for the bearer-token middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt: self.jwt.clone(),
            user_repository: self.db.user_repository.clone(),
            organization_repository: self.db.organization_repository.clone(),
        }
    }
}
