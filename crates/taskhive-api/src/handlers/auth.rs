//! Login, registration and password reset.

use crate::constants::{INVALID_CREDENTIALS, MIN_PASSWORD_LENGTH, SESSION_COOKIE};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{normalize_email, required_text};
use crate::middleware::audit;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhive_core::models::{NewUser, ResetOutcome, Role, User};
use taskhive_core::AppError;
use taskhive_services::mail::templates;
use taskhive_services::{generate_reset_token, hash_password, verify_decoy, verify_password};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub role: Role,
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,
    pub role: Role,
    /// Required for MANAGER and TEAM_LEAD; with `tlIdWithinOrg` identifies a TEAM_MEMBER's lead
    pub organization_name: Option<String>,
    pub tl_id_within_org: Option<i32>,
    pub team_lead_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
    pub role: Role,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn invalid_credentials() -> HttpAppError {
    HttpAppError(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = LoginResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (email, password) = match (body.email.as_deref(), body.password.as_deref()) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (normalize_email(email), password.to_string())
        }
        _ => {
            return Err(HttpAppError(AppError::Validation(
                "Email and password are required".to_string(),
            )))
        }
    };

    let Some(user) = state.db.user_repository.find_by_email(&email).await? else {
        verify_decoy(&password, state.config.bcrypt_cost()).await?;
        audit::log_login(&email, None, Some("Unknown email"));
        return Err(invalid_credentials());
    };

    if !verify_password(&password, &user.password_hash).await? {
        audit::log_login(&email, Some(user.id), Some("Password mismatch"));
        return Err(invalid_credentials());
    }

    let token = state.jwt.issue(&user)?;
    audit::log_login(&email, Some(user.id), None);

    let cookie = session_cookie(
        &token,
        state.jwt.expires_in_secs(),
        state.config.is_production(),
    );
    let response = LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        role: user.role,
        user_id: user.id,
        organization_id: user.organization_id,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing or invalid role-specific fields", body = ErrorResponse),
        (status = 409, description = "Email or organization name already taken", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(mut body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    body.email = normalize_email(&body.email);
    body.validate()?;

    let users = &state.db.user_repository;
    if users.find_by_email(&body.email).await?.is_some() {
        return Err(HttpAppError(AppError::Conflict(
            "Email already registered".to_string(),
        )));
    }

    let organization_name = body
        .organization_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    // Resolve role-specific targets before paying for the hash
    let lead = match body.role {
        Role::TeamMember => Some(find_team_lead(&state, &body, organization_name).await?),
        Role::Manager | Role::TeamLead | Role::Individual => None,
    };
    let team_lead_org = match body.role {
        Role::TeamLead => {
            let name = required_text(organization_name, "organizationName")?;
            let organization = state
                .db
                .organization_repository
                .find_by_name(&name)
                .await?
                .ok_or_else(|| HttpAppError(AppError::Validation("Organization not found".to_string())))?;
            Some(organization.id)
        }
        Role::Manager | Role::TeamMember | Role::Individual => None,
    };

    let new_user = NewUser {
        email: body.email.clone(),
        name: body
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        role: body.role,
        password_hash: hash_password(&body.password, state.config.bcrypt_cost()).await?,
    };

    let user: User = match body.role {
        Role::Manager => {
            let name = required_text(organization_name, "organizationName")?;
            let (user, _organization) = users.register_manager(new_user, &name).await?;
            user
        }
        Role::TeamLead => {
            let organization_id = team_lead_org.ok_or_else(|| {
                HttpAppError(AppError::Validation("Organization not found".to_string()))
            })?;
            users.register_team_lead(new_user, organization_id).await?
        }
        Role::TeamMember => {
            let lead = lead.ok_or_else(|| {
                HttpAppError(AppError::Validation("Team lead not found".to_string()))
            })?;
            users.register_member(new_user, &lead).await?
        }
        Role::Individual => users.register_individual(new_user).await?,
    };

    audit::log_user_registered(user.id, &user.email, user.role.as_str(), user.organization_id);

    let response = RegisterResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user_id: user.id,
        role: user.role,
        organization_id: user.organization_id,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// The lead a new TEAM_MEMBER reports to: by id, or by organization name plus tlId
async fn find_team_lead(
    state: &AppState,
    body: &RegisterRequest,
    organization_name: Option<&str>,
) -> Result<User, HttpAppError> {
    let not_found = || HttpAppError(AppError::Validation("Team lead not found".to_string()));
    let users = &state.db.user_repository;

    let lead = match (body.team_lead_id, organization_name, body.tl_id_within_org) {
        (Some(id), _, _) => users.find_by_id(id).await?,
        (None, Some(name), Some(number)) => {
            let organization = state
                .db
                .organization_repository
                .find_by_name(name)
                .await?
                .ok_or_else(|| HttpAppError(AppError::Validation("Organization not found".to_string())))?;
            users.find_team_lead_by_number(organization.id, number).await?
        }
        _ => {
            return Err(HttpAppError(AppError::Validation(
                "teamLeadId, or organizationName with tlIdWithinOrg, is required for team members"
                    .to_string(),
            )))
        }
    };

    lead.filter(|user| user.role == Role::TeamLead)
        .ok_or_else(not_found)
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Same answer whether or not the account exists", body = MessageResponse)
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = normalize_email(&body.email);
    let user = state.db.user_repository.find_by_email(&email).await?;
    audit::log_password_reset_requested(&email, user.as_ref().map(|u| u.id));

    if let Some(user) = user {
        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(templates::RESET_LINK_MINUTES);
        state
            .db
            .reset_token_repository
            .replace(user.id, &token, expires_at)
            .await?;

        let link = templates::reset_link(state.config.app_url(), &token);
        let message = templates::password_reset(&user.email, user.name.as_deref(), &link);
        if let Err(e) = state.mailer.send(&message).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to send password reset email");
        }
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "If an account exists for this email, a reset link has been sent".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Unknown, expired or used token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = body.token.trim();
    if token.is_empty() {
        return Err(HttpAppError(AppError::Validation(
            "Invalid or expired token".to_string(),
        )));
    }
    if body.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(HttpAppError(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))));
    }

    let password_hash = hash_password(&body.password, state.config.bcrypt_cost()).await?;
    let outcome = state
        .db
        .reset_token_repository
        .redeem(token, &password_hash, Utc::now())
        .await?;

    let rejection = match outcome {
        ResetOutcome::Completed => None,
        ResetOutcome::Unknown => Some("Invalid or expired token"),
        ResetOutcome::ExpiredOrUsed => Some("Token expired or already used"),
    };
    audit::log_password_reset_completed(rejection.is_none(), rejection);

    match rejection {
        None => Ok(Json(MessageResponse {
            success: true,
            message: "Password has been reset".to_string(),
        })),
        Some(reason) => Err(HttpAppError(AppError::Validation(reason.to_string()))),
    }
}
