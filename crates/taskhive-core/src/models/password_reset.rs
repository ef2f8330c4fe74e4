use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Single-use, time-boxed password reset token
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Whether the token may still be exchanged for a password change
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

/// Result of trying to redeem a reset token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Completed,
    Unknown,
    ExpiredOrUsed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn used_or_expired_tokens_are_not_redeemable() {
        let now = Utc::now();
        let mut token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "abc".to_string(),
            expires_at: now + Duration::minutes(30),
            used: false,
            created_at: now,
        };
        assert!(token.is_redeemable(now));
        token.used = true;
        assert!(!token.is_redeemable(now));
        token.used = false;
        assert!(!token.is_redeemable(now + Duration::minutes(31)));
    }
}
