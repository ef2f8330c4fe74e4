//! Team-lead invitations.
//!
//! The account write and the invitation email form one unit: the transaction is
//! committed only after the mail was accepted, and rolled back otherwise.

use crate::auth::SessionContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::{authorize, check, normalize_email};
use crate::middleware::audit;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhive_core::models::{NewUser, Role, User};
use taskhive_core::policy::{self, InviteMode, OperationClass};
use taskhive_core::AppError;
use taskhive_db::{TransactionGuard, UserRepository};
use taskhive_services::mail::templates::{self, TeamLeadInvite};
use taskhive_services::{generate_temporary_password, hash_password};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteTeamLeadRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitedTeamLead {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub tl_id_within_org: Option<i32>,
}

impl From<&User> for InvitedTeamLead {
    fn from(user: &User) -> Self {
        InvitedTeamLead {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            tl_id_within_org: user.tl_id_within_org,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteTeamLeadResponse {
    pub success: bool,
    pub message: String,
    pub team_lead: InvitedTeamLead,
    pub temporary_password: String,
}

#[utoipa::path(
    post,
    path = "/api/team-leads/invite",
    tag = "team-leads",
    request_body = InviteTeamLeadRequest,
    responses(
        (status = 201, description = "Team lead created and emailed", body = InviteTeamLeadResponse),
        (status = 200, description = "Existing team lead's password reset and emailed", body = InviteTeamLeadResponse),
        (status = 403, description = "Only managers can invite", body = ErrorResponse),
        (status = 409, description = "Email belongs to a user who is not a team lead here", body = ErrorResponse),
        (status = 500, description = "Email could not be sent; nothing was saved", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, body))]
pub async fn invite_team_lead(
    State(state): State<Arc<AppState>>,
    ctx: SessionContext,
    ValidatedJson(mut body): ValidatedJson<InviteTeamLeadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize(&ctx, OperationClass::InviteTeamLead)?;
    body.email = normalize_email(&body.email);
    body.validate()?;

    let organization_id = ctx.actor.organization_id.ok_or_else(|| {
        HttpAppError(AppError::Forbidden("Manager has no organization".to_string()))
    })?;
    let organization = state
        .db
        .organization_repository
        .find_by_id(organization_id)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Organization not found".to_string())))?;

    let existing = state.db.user_repository.find_by_email(&body.email).await?;
    let mode = check(
        &ctx,
        OperationClass::InviteTeamLead,
        policy::check_invite_target(&ctx.actor, existing.as_ref()),
    )?;

    let temporary_password = generate_temporary_password();
    let password_hash = hash_password(&temporary_password, state.config.bcrypt_cost()).await?;
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let mut tx = TransactionGuard::begin(&state.db.pool, "invite_team_lead").await?;
    let written = match mode {
        InviteMode::Create => {
            let new_user = NewUser {
                email: body.email.clone(),
                name,
                role: Role::TeamLead,
                password_hash,
            };
            UserRepository::create_team_lead_in(&mut tx, &new_user, organization_id).await
        }
        InviteMode::ResetExisting { user_id, has_tl_id } => {
            reset_existing(&mut tx, existing, user_id, has_tl_id, organization_id, &password_hash)
                .await
        }
    };
    let lead = match written {
        Ok(lead) => lead,
        Err(e) => {
            tx.rollback().await?;
            return Err(e.into());
        }
    };

    let login_url = format!("{}/login", state.config.app_url().trim_end_matches('/'));
    let message = templates::team_lead_invite(&TeamLeadInvite {
        organization_name: &organization.name,
        manager_name: ctx.display_name(),
        login_url: &login_url,
        email: &lead.email,
        temporary_password: &temporary_password,
    });

    let created = mode == InviteMode::Create;
    if let Err(e) = state.mailer.send(&message).await {
        tx.rollback().await?;
        audit::log_team_lead_invited(
            ctx.user.id,
            organization_id,
            &lead.email,
            created,
            Some(e.to_string()),
        );
        let detail = match e {
            AppError::EmailDelivery(detail) => detail,
            other => other.to_string(),
        };
        return Err(HttpAppError(AppError::EmailDelivery(format!(
            "Failed to send invitation email: {}",
            detail
        ))));
    }

    tx.commit().await?;
    audit::log_team_lead_invited(ctx.user.id, organization_id, &lead.email, created, None);

    let (status, text) = if created {
        (StatusCode::CREATED, "Team lead invited successfully")
    } else {
        (StatusCode::OK, "Team lead password reset and invitation resent")
    };
    Ok((
        status,
        Json(InviteTeamLeadResponse {
            success: true,
            message: text.to_string(),
            team_lead: InvitedTeamLead::from(&lead),
            temporary_password,
        }),
    ))
}

async fn reset_existing(
    tx: &mut TransactionGuard,
    existing: Option<User>,
    user_id: Uuid,
    has_tl_id: bool,
    organization_id: Uuid,
    password_hash: &str,
) -> Result<User, AppError> {
    UserRepository::update_password_in(&mut **tx, user_id, password_hash).await?;
    match existing {
        Some(user) if has_tl_id => Ok(user),
        _ => UserRepository::ensure_tl_id_in(&mut **tx, user_id, organization_id).await,
    }
}
