//! Database repositories for data access layer
//!
//! Each repository owns a pool handle and is responsible for one entity. Methods
//! that must join a caller-managed transaction take `&mut PgConnection` and end
//! in `_in`.

pub mod insights;
pub mod notes;
pub mod organizations;
pub mod projects;
pub mod reset_tokens;
mod scope;
pub mod tasks;
pub mod transaction;
pub mod users;

pub use insights::InsightRepository;
pub use notes::NoteRepository;
pub use organizations::OrganizationRepository;
pub use projects::ProjectRepository;
pub use reset_tokens::ResetTokenRepository;
pub use tasks::TaskRepository;
pub use users::UserRepository;

use taskhive_core::AppError;

/// Map a unique-constraint violation to a conflict carrying `message`; any other
/// database error passes through unchanged.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            tracing::debug!(error = %db_err, "Unique constraint violated");
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
