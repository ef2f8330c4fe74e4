//! HTTP handlers.
//!
//! Every protected handler follows the same order: role gate ([`authorize`]),
//! load targets through the actor's scope, run the target rule ([`check`]), then
//! persist. Forbidden outcomes are written to the audit log on the way out.

pub mod auth;
pub mod health;
pub mod insights;
pub mod notes;
pub mod orgs;
pub mod projects;
pub mod subtasks;
pub mod tasks;
pub mod team_leads;
pub mod users;

use crate::auth::SessionContext;
use crate::error::HttpAppError;
use crate::middleware::audit;
use serde::{Deserialize, Serialize};
use taskhive_core::policy::{self, Denial, DenialKind, OperationClass};
use taskhive_core::AppError;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// `?id=` used by endpoints that also accept the id in the path or body
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct IdQuery {
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

impl DeleteResponse {
    pub fn ok() -> Self {
        DeleteResponse { success: true }
    }
}

/// Apply the role gate for `op`
pub(crate) fn authorize(ctx: &SessionContext, op: OperationClass) -> Result<(), HttpAppError> {
    check(ctx, op, policy::require(&ctx.actor, op))
}

/// Turn a rule outcome into a handler result, auditing forbidden ones
pub(crate) fn check<T>(
    ctx: &SessionContext,
    op: OperationClass,
    outcome: Result<T, Denial>,
) -> Result<T, HttpAppError> {
    outcome.map_err(|denial| {
        if denial.kind == DenialKind::Forbidden {
            audit::log_permission_denied(
                ctx.user.id,
                ctx.actor.organization_id,
                ctx.user.role.as_str(),
                op.as_str(),
                &denial.reason,
            );
        }
        HttpAppError::from(denial)
    })
}

/// First id found among path, query string and body
pub(crate) fn pick_id(
    path: Option<Uuid>,
    query: Option<Uuid>,
    body: Option<Uuid>,
) -> Result<Uuid, HttpAppError> {
    path.or(query)
        .or(body)
        .ok_or_else(|| HttpAppError(AppError::Validation("id is required".to_string())))
}

/// Trimmed, non-empty required text field
pub(crate) fn required_text(value: Option<&str>, field: &str) -> Result<String, HttpAppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| HttpAppError(AppError::Validation(format!("{} is required", field))))
}

/// Trimmed replacement text for a partial update; present but blank is rejected
pub(crate) fn optional_text(
    value: Option<String>,
    field: &str,
) -> Result<Option<String>, HttpAppError> {
    value
        .map(|v| required_text(Some(&v), field))
        .transpose()
}

/// Normalized email: trimmed and lower-cased
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_prefers_path_then_query_then_body() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(pick_id(Some(a), Some(b), Some(c)).unwrap(), a);
        assert_eq!(pick_id(None, Some(b), Some(c)).unwrap(), b);
        assert_eq!(pick_id(None, None, Some(c)).unwrap(), c);
        assert!(matches!(
            pick_id(None, None, None),
            Err(HttpAppError(AppError::Validation(_)))
        ));
    }

    #[test]
    fn required_text_rejects_blank() {
        assert_eq!(required_text(Some("  Launch "), "title").unwrap(), "Launch");
        assert!(required_text(Some("   "), "title").is_err());
        assert!(required_text(None, "title").is_err());
    }

    #[test]
    fn optional_text_allows_absent_but_not_blank() {
        assert_eq!(optional_text(None, "title").unwrap(), None);
        assert_eq!(
            optional_text(Some(" Ship it ".to_string()), "title").unwrap(),
            Some("Ship it".to_string())
        );
        assert!(matches!(
            optional_text(Some("\t ".to_string()), "title"),
            Err(HttpAppError(AppError::Validation(_)))
        ));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Alice@Acme.IO "), "alice@acme.io");
    }
}
