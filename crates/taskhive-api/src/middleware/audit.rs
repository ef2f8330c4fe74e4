//! Security audit logging
//!
//! Structured audit records for security-relevant events:
//! - Authentication attempts (success/failure)
//! - Registrations and team-lead invitations
//! - Password reset requests and completions
//! - Authorization denials
//!
//! Records carry the email at most; passwords and tokens are never logged.

use serde::Serialize;
use uuid::Uuid;

/// Audit event types for categorization
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    UserRegistered,
    PasswordResetRequested,
    PasswordResetCompleted,
    TeamLeadInvited,
    PermissionDenied,
}

/// Structured audit log entry
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Event details (JSON object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            organization_id: None,
            user_id: None,
            email: None,
            user_agent: None,
            operation: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_organization_id(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failure
    pub fn with_failure(mut self, error_message: String) -> Self {
        self.success = false;
        self.error_message = Some(error_message);
        self
    }

    /// Emit under the `audit` target so the records can be filtered out of the main log
    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::event!(
                target: "audit",
                tracing::Level::INFO,
                audit_entry = %json,
                event_type = ?self.event_type,
                organization_id = ?self.organization_id,
                user_id = ?self.user_id,
                success = self.success,
                "Security audit log"
            );
        } else {
            tracing::event!(
                target: "audit",
                tracing::Level::WARN,
                audit_entry = %json,
                event_type = ?self.event_type,
                organization_id = ?self.organization_id,
                user_id = ?self.user_id,
                success = self.success,
                error = ?self.error_message,
                "Security audit log - failure"
            );
        }
    }
}

/// `Option` flavours of the builder setters
pub trait AuditLogEntryOpt {
    fn with_organization_id_opt(self, organization_id: Option<Uuid>) -> Self;
    fn with_user_id_opt(self, user_id: Option<Uuid>) -> Self;
    fn with_email_opt(self, email: Option<String>) -> Self;
    fn with_user_agent_opt(self, user_agent: Option<String>) -> Self;
}

impl AuditLogEntryOpt for AuditLogEntry {
    fn with_organization_id_opt(self, organization_id: Option<Uuid>) -> Self {
        match organization_id {
            Some(id) => self.with_organization_id(id),
            None => self,
        }
    }

    fn with_user_id_opt(self, user_id: Option<Uuid>) -> Self {
        match user_id {
            Some(id) => self.with_user_id(id),
            None => self,
        }
    }

    fn with_email_opt(self, email: Option<String>) -> Self {
        match email {
            Some(email) => self.with_email(email),
            None => self,
        }
    }

    fn with_user_agent_opt(self, user_agent: Option<String>) -> Self {
        match user_agent {
            Some(agent) => self.with_user_agent(agent),
            None => self,
        }
    }
}

/// Bearer-token check in the auth middleware
pub fn log_authentication_attempt(
    user_id: Option<Uuid>,
    organization_id: Option<Uuid>,
    user_agent: Option<String>,
    success: bool,
    error_message: Option<String>,
) {
    let event_type = if success {
        AuditEventType::AuthenticationSuccess
    } else {
        AuditEventType::AuthenticationFailure
    };

    let mut entry = AuditLogEntry::new(event_type)
        .with_user_id_opt(user_id)
        .with_organization_id_opt(organization_id)
        .with_user_agent_opt(user_agent);

    if let Some(msg) = error_message {
        entry = entry.with_failure(msg);
    }

    entry.log();
}

/// Email/password login
pub fn log_login(email: &str, user_id: Option<Uuid>, error_message: Option<&str>) {
    let event_type = match error_message {
        None => AuditEventType::AuthenticationSuccess,
        Some(_) => AuditEventType::AuthenticationFailure,
    };
    let mut entry = AuditLogEntry::new(event_type)
        .with_email(email.to_string())
        .with_user_id_opt(user_id)
        .with_operation("login");
    if let Some(msg) = error_message {
        entry = entry.with_failure(msg.to_string());
    }
    entry.log();
}

pub fn log_user_registered(
    user_id: Uuid,
    email: &str,
    role: &str,
    organization_id: Option<Uuid>,
) {
    AuditLogEntry::new(AuditEventType::UserRegistered)
        .with_user_id(user_id)
        .with_email(email.to_string())
        .with_organization_id_opt(organization_id)
        .with_details(serde_json::json!({ "role": role }))
        .log();
}

/// `user_id` is `None` when no account matched; the response never says so.
pub fn log_password_reset_requested(email: &str, user_id: Option<Uuid>) {
    AuditLogEntry::new(AuditEventType::PasswordResetRequested)
        .with_email(email.to_string())
        .with_user_id_opt(user_id)
        .with_details(serde_json::json!({ "account_found": user_id.is_some() }))
        .log();
}

pub fn log_password_reset_completed(success: bool, error_message: Option<&str>) {
    let mut entry = AuditLogEntry::new(AuditEventType::PasswordResetCompleted);
    if !success {
        entry = entry.with_failure(error_message.unwrap_or("Reset rejected").to_string());
    }
    entry.log();
}

pub fn log_team_lead_invited(
    manager_id: Uuid,
    organization_id: Uuid,
    invitee_email: &str,
    created: bool,
    error_message: Option<String>,
) {
    let mut entry = AuditLogEntry::new(AuditEventType::TeamLeadInvited)
        .with_user_id(manager_id)
        .with_organization_id(organization_id)
        .with_email(invitee_email.to_string())
        .with_details(serde_json::json!({ "created": created }));
    if let Some(msg) = error_message {
        entry = entry.with_failure(msg);
    }
    entry.log();
}

pub fn log_permission_denied(
    user_id: Uuid,
    organization_id: Option<Uuid>,
    role: &str,
    operation: &str,
    reason: &str,
) {
    AuditLogEntry::new(AuditEventType::PermissionDenied)
        .with_user_id(user_id)
        .with_organization_id_opt(organization_id)
        .with_operation(operation)
        .with_details(serde_json::json!({ "role": role }))
        .with_failure(reason.to_string())
        .log();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_without_empty_fields() {
        let entry = AuditLogEntry::new(AuditEventType::PermissionDenied)
            .with_operation("invite_team_lead")
            .with_failure("Only managers can invite team leads".to_string());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event_type"], "permission_denied");
        assert_eq!(json["operation"], "invite_team_lead");
        assert_eq!(json["success"], false);
        assert!(json.get("user_id").is_none());
        assert!(json.get("email").is_none());
    }

    #[test]
    fn optional_setters_skip_none() {
        let entry = AuditLogEntry::new(AuditEventType::AuthenticationSuccess)
            .with_user_id_opt(None)
            .with_email_opt(Some("a@b.c".to_string()));
        assert!(entry.user_id.is_none());
        assert_eq!(entry.email.as_deref(), Some("a@b.c"));
        assert!(entry.success);
    }
}
