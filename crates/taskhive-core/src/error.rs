//! Error types module
//!
//! All failures are unified under [`AppError`]. Each variant self-describes how it
//! is presented over HTTP through [`ErrorMetadata`], so handlers never pick status
//! codes by hand.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures or denied requests
    Debug,
    /// Recoverable issues such as quota limits
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FORBIDDEN")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage limit reached: {used} of {limit} bytes used, {requested} bytes requested")]
    StorageLimit {
        used: i64,
        limit: i64,
        requested: i64,
    },

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Sign in and send the token as a Bearer authorization header"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidToken(_) => (
            403,
            "INVALID_TOKEN",
            false,
            Some("Sign in again to obtain a fresh token"),
            true,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::StorageLimit { .. } => (
            400,
            "STORAGE_LIMIT_REACHED",
            false,
            Some("Delete notes or attachments to free space"),
            false,
            LogLevel::Warn,
        ),
        AppError::EmailDelivery(_) => (
            500,
            "EMAIL_DELIVERY_FAILED",
            true,
            Some("Check the mail server configuration and retry"),
            false,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Validation(_) => "Validation",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::InvalidToken(_) => "InvalidToken",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::StorageLimit { .. } => "StorageLimit",
            AppError::EmailDelivery(_) => "EmailDelivery",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::InvalidToken(_) => "Invalid token".to_string(),
            AppError::StorageLimit { .. } => {
                "Storage limit reached. Delete notes or attachments to free space.".to_string()
            }
            AppError::EmailDelivery(_) => "Failed to send email".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_unauthenticated_and_bad_token_are_distinct() {
        let missing = AppError::Unauthorized("missing header".to_string());
        let invalid = AppError::InvalidToken("bad signature".to_string());
        assert_eq!(missing.http_status_code(), 401);
        assert_eq!(invalid.http_status_code(), 403);
        assert_eq!(missing.client_message(), "missing header");
        // Decoder errors stay server-side
        assert_eq!(invalid.client_message(), "Invalid token");
        assert!(invalid.is_sensitive());
    }

    #[test]
    fn test_forbidden_carries_rule_reason() {
        let err = AppError::Forbidden("You can only assign tasks to your own team members.".into());
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert_eq!(
            err.client_message(),
            "You can only assign tasks to your own team members."
        );
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_conflict_and_not_found() {
        let conflict = AppError::Conflict("Email already registered".to_string());
        assert_eq!(conflict.http_status_code(), 409);
        let missing = AppError::NotFound("Project not found".to_string());
        assert_eq!(missing.http_status_code(), 404);
        assert_eq!(missing.suggested_action(), Some("Verify the resource ID exists"));
    }

    #[test]
    fn test_storage_limit_is_a_client_error() {
        let err = AppError::StorageLimit {
            used: 10,
            limit: 20,
            requested: 15,
        };
        assert_eq!(err.http_status_code(), 400);
        assert!(err.client_message().starts_with("Storage limit reached"));
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.to_string().contains("15 bytes requested"));
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::from(anyhow::anyhow!("connection reset"));
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.detailed_message().contains("connection reset"));
    }

    #[test]
    fn test_email_delivery_exposes_detail() {
        let err = AppError::EmailDelivery("SMTP 550 mailbox unavailable".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.is_sensitive());
        assert!(err.detailed_message().contains("550"));
    }
}
