//! Taskhive Database Layer
//!
//! Postgres repositories for every persisted entity. Read queries take a policy
//! scope and translate it into SQL, so callers cannot fetch rows outside the
//! actor's reach.

pub mod db;

pub use db::{
    InsightRepository, NoteRepository, OrganizationRepository, ProjectRepository,
    ResetTokenRepository, TaskRepository, UserRepository,
};

// Re-exports: Transaction utilities
pub use db::transaction::TransactionGuard;
