use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Position of a user in the organizational hierarchy. Immutable after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Manager,
    TeamLead,
    TeamMember,
    Individual,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::TeamLead => "TEAM_LEAD",
            Role::TeamMember => "TEAM_MEMBER",
            Role::Individual => "INDIVIDUAL",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MANAGER" => Ok(Role::Manager),
            "TEAM_LEAD" => Ok(Role::TeamLead),
            "TEAM_MEMBER" => Ok(Role::TeamMember),
            "INDIVIDUAL" => Ok(Role::Individual),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub organization_id: Option<Uuid>,
    /// Set only for TEAM_MEMBER
    pub team_lead_id: Option<Uuid>,
    /// Set only for TEAM_LEAD; sequential within the organization
    pub tl_id_within_org: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user (no credential material)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub organization_id: Option<Uuid>,
    pub team_lead_id: Option<Uuid>,
    pub tl_id_within_org: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            organization_id: user.organization_id,
            team_lead_id: user.team_lead_id,
            tl_id_within_org: user.tl_id_within_org,
            created_at: user.created_at,
        }
    }
}

/// Entry of an assignee picker
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignableUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub tl_id_within_org: Option<i32>,
}

impl From<&User> for AssignableUser {
    fn from(user: &User) -> Self {
        AssignableUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            tl_id_within_org: user.tl_id_within_org,
        }
    }
}

/// Fields of a user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub password_hash: String,
}
