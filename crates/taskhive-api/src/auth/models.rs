use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use taskhive_core::models::User;
use taskhive_core::Actor;
use uuid::Uuid;

/// Authenticated user resolved by the auth middleware and stored in request extensions.
/// The user row is re-read on every request; only the token's `sub` is trusted.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user: User,
    pub actor: Actor,
}

impl SessionContext {
    pub fn new(user: User, managed_organization: Option<Uuid>) -> Self {
        let actor = Actor::from_user(&user, managed_organization);
        Self { user, actor }
    }

    /// Name for greetings and summaries, falling back to the email
    pub fn display_name(&self) -> &str {
        self.user
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.user.email)
    }
}

// Extracted from request parts so it also works alongside Multipart bodies
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::full(
                        "Unauthorized",
                        "MISSING_SESSION",
                        false,
                        Some("Sign in and send the token as a Bearer authorization header"),
                    )),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskhive_core::models::Role;

    fn manager(organization_id: Option<Uuid>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "alice@acme.io".to_string(),
            name: None,
            role: Role::Manager,
            password_hash: String::new(),
            organization_id,
            team_lead_id: None,
            tl_id_within_org: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn manager_without_inline_org_gets_managed_org() {
        let org = Uuid::new_v4();
        let ctx = SessionContext::new(manager(None), Some(org));
        assert_eq!(ctx.actor.organization_id, Some(org));
        assert_eq!(ctx.display_name(), "alice@acme.io");
    }
}
