//! Public organization directory, used while registering.

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::required_text;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhive_core::models::{Organization, TeamLeadEntry};
use taskhive_core::AppError;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct TeamLeadDirectoryQuery {
    pub org_name: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ByManagerQuery {
    pub manager_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamLeadDirectoryResponse {
    pub success: bool,
    pub organization: OrganizationRef,
    pub team_leads: Vec<TeamLeadEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedOrganizationResponse {
    pub organization: Organization,
    pub team_leads: Vec<TeamLeadEntry>,
}

#[utoipa::path(
    get,
    path = "/api/orgs/teamleads",
    tag = "organizations",
    params(TeamLeadDirectoryQuery),
    responses(
        (status = 200, description = "Team leads of the organization", body = TeamLeadDirectoryResponse),
        (status = 400, description = "orgName missing", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn team_leads_by_org(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamLeadDirectoryQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let name = required_text(query.org_name.as_deref(), "orgName")?;
    let organization = state
        .db
        .organization_repository
        .find_by_name(&name)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Organization not found".to_string())))?;

    let team_leads = state
        .db
        .user_repository
        .team_lead_directory(organization.id)
        .await?;

    Ok(Json(TeamLeadDirectoryResponse {
        success: true,
        organization: OrganizationRef {
            id: organization.id,
            name: organization.name,
        },
        team_leads,
    }))
}

#[utoipa::path(
    get,
    path = "/api/orgs/by-manager",
    tag = "organizations",
    params(ByManagerQuery),
    responses(
        (status = 200, description = "Organization run by the manager", body = ManagedOrganizationResponse),
        (status = 404, description = "Manager has no organization", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn organization_by_manager(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ByManagerQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let organization = state
        .db
        .organization_repository
        .find_by_manager(query.manager_id)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Organization not found".to_string())))?;

    let team_leads = state
        .db
        .user_repository
        .team_lead_directory(organization.id)
        .await?;

    Ok(Json(ManagedOrganizationResponse {
        organization,
        team_leads,
    }))
}
