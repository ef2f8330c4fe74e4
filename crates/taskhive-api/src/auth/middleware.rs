use crate::auth::jwt::JwtService;
use crate::auth::models::SessionContext;
use crate::error::HttpAppError;
use crate::middleware::{audit, get_request_id};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use taskhive_core::models::Role;
use taskhive_core::AppError;
use taskhive_db::{OrganizationRepository, UserRepository};

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
    pub user_repository: UserRepository,
    pub organization_repository: OrganizationRepository,
}

/// Map a bearer token to a fresh session. The user row is always re-read; a MANAGER
/// whose row carries no organization gets the one it manages.
pub async fn resolve_session(auth: &AuthState, token: &str) -> Result<SessionContext, AppError> {
    let claims = auth.jwt.verify(token)?;

    let user = auth
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    let managed_organization = if user.role == Role::Manager && user.organization_id.is_none() {
        auth.organization_repository
            .find_by_manager(user.id)
            .await?
            .map(|org| org.id)
    } else {
        None
    };

    Ok(SessionContext::new(user, managed_organization))
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = get_request_id(&request);
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let token = match extract_token(request.headers()) {
        Ok(token) => token,
        Err(reason) => {
            audit::log_authentication_attempt(
                None,
                None,
                user_agent,
                false,
                Some(reason.to_string()),
            );
            return HttpAppError(AppError::Unauthorized(reason.to_string())).into_response();
        }
    };

    match resolve_session(&auth_state, &token).await {
        Ok(session) => {
            audit::log_authentication_attempt(
                Some(session.user.id),
                session.actor.organization_id,
                user_agent,
                true,
                None,
            );
            tracing::debug!(
                request_id = ?request_id,
                user_id = %session.user.id,
                role = %session.user.role,
                "Request authenticated"
            );
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            audit::log_authentication_attempt(
                None,
                None,
                user_agent,
                false,
                Some(err.to_string()),
            );
            tracing::debug!(request_id = ?request_id, error = %err, "Authentication failed");
            HttpAppError(err).into_response()
        }
    }
}

/// Bearer token from `Authorization`. The login cookie is never read back.
fn extract_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing authorization header")?
        .to_str()
        .map_err(|_| "Invalid authorization header format")?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or("Invalid authorization header format")
}
