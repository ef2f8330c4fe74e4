use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use taskhive_core::{
    models::{PasswordResetToken, ResetOutcome},
    AppError,
};
use uuid::Uuid;

use super::{transaction::TransactionGuard, users::UserRepository};

/// Repository for password reset tokens
#[derive(Clone)]
pub struct ResetTokenRepository {
    pool: PgPool,
}

impl ResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace every token of the user with a fresh one. A concurrent redemption
    /// sees either the old set or the new token, never neither.
    #[tracing::instrument(skip(self, token), fields(db.table = "password_reset_tokens", db.operation = "insert"))]
    pub async fn replace(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "replace_reset_token").await?;

        let removed = sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let record = sqlx::query_as::<Postgres, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(user_id = %user_id, removed, "Password reset token issued");
        Ok(record)
    }

    /// Exchange a token for a password change. The token row stays locked until
    /// the password is written and the token marked used, so a token succeeds
    /// at most once even under concurrent attempts.
    #[tracing::instrument(skip(self, token, password_hash), fields(db.table = "password_reset_tokens", db.operation = "update"))]
    pub async fn redeem(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "redeem_reset_token").await?;

        let record = sqlx::query_as::<Postgres, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            tx.rollback().await?;
            return Ok(ResetOutcome::Unknown);
        };

        if !record.is_redeemable(now) {
            tx.rollback().await?;
            return Ok(ResetOutcome::ExpiredOrUsed);
        }

        UserRepository::update_password_in(&mut tx, record.user_id, password_hash).await?;

        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = $1")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %record.user_id, "Password reset completed");
        Ok(ResetOutcome::Completed)
    }
}
