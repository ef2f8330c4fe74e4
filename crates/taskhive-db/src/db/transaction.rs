//! Database transaction utilities
//!
//! Multi-step writes (registration, tlId allocation, reset-token rotation, the
//! team-lead invite) run inside a [`TransactionGuard`].

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::ops::{Deref, DerefMut};
use taskhive_core::AppError;

/// A database transaction with explicit commit/rollback.
///
/// Dropping the guard without committing rolls the transaction back (sqlx
/// returns the connection to the pool with the transaction aborted).
///
/// # Example
///
/// ```ignore
/// use taskhive_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), taskhive_core::AppError> {
///     let mut tx = TransactionGuard::begin(pool, "example").await?;
///     sqlx::query("UPDATE ...").execute(&mut *tx).await?;
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard {
    transaction: Transaction<'static, Postgres>,
    operation: &'static str,
}

impl TransactionGuard {
    /// Begin a new database transaction. `operation` labels log lines.
    pub async fn begin(pool: &PgPool, operation: &'static str) -> Result<Self, AppError> {
        let transaction = pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to begin database transaction");
            AppError::Database(e)
        })?;

        Ok(Self {
            transaction,
            operation,
        })
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<(), AppError> {
        let operation = self.operation;
        self.transaction.commit().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to commit database transaction");
            AppError::Database(e)
        })
    }

    /// Roll the transaction back
    pub async fn rollback(self) -> Result<(), AppError> {
        let operation = self.operation;
        tracing::debug!(operation, "Rolling back database transaction");
        self.transaction.rollback().await.map_err(|e| {
            tracing::error!(error = %e, operation, "Failed to roll back database transaction");
            AppError::Database(e)
        })
    }
}

impl Deref for TransactionGuard {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl DerefMut for TransactionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.transaction
    }
}
