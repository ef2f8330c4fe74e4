//! Authorization engine
//!
//! Every request is evaluated in three steps:
//!
//! 1. [`require`] checks that the actor's role may attempt the operation class at all.
//! 2. A rule from [`rules`] validates any explicit target (assignee, project, parent task).
//! 3. The [`scope`] for the actor is pushed into the persistence query, so list and
//!    lookup queries never fetch rows outside the actor's reach even if a rule is wrong.
//!
//! Rules are pure functions over already-loaded entities. They return a [`Denial`]
//! carrying a stable, client-safe reason.

mod rules;
mod scope;

pub use rules::*;
pub use scope::*;

use std::borrow::Cow;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, User};

/// Authenticated principal resolved for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    /// Own organization; for a MANAGER this is the organization they manage
    pub organization_id: Option<Uuid>,
    pub team_lead_id: Option<Uuid>,
}

impl Actor {
    /// Build an actor from a freshly loaded user row. `managed_organization` fills the
    /// organization of a MANAGER whose row carries no inline reference.
    pub fn from_user(user: &User, managed_organization: Option<Uuid>) -> Self {
        let organization_id = match user.role {
            Role::Manager => user.organization_id.or(managed_organization),
            Role::TeamLead | Role::TeamMember | Role::Individual => user.organization_id,
        };
        Actor {
            id: user.id,
            role: user.role,
            organization_id,
            team_lead_id: user.team_lead_id,
        }
    }

    pub fn is(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// Role or relationship check failed (403)
    Forbidden,
    /// Target does not exist or is out of scope (404)
    NotFound,
    /// Required input is missing or malformed (400)
    Invalid,
    /// Target exists in an incompatible state (409)
    Conflict,
}

/// Outcome of a failed rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    pub reason: Cow<'static, str>,
}

impl Denial {
    pub fn forbidden(reason: impl Into<Cow<'static, str>>) -> Self {
        Denial {
            kind: DenialKind::Forbidden,
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<Cow<'static, str>>) -> Self {
        Denial {
            kind: DenialKind::NotFound,
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<Cow<'static, str>>) -> Self {
        Denial {
            kind: DenialKind::Invalid,
            reason: reason.into(),
        }
    }

    pub fn conflict(reason: impl Into<Cow<'static, str>>) -> Self {
        Denial {
            kind: DenialKind::Conflict,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.reason)
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        let reason = denial.reason.into_owned();
        match denial.kind {
            DenialKind::Forbidden => AppError::Forbidden(reason),
            DenialKind::NotFound => AppError::NotFound(reason),
            DenialKind::Invalid => AppError::Validation(reason),
            DenialKind::Conflict => AppError::Conflict(reason),
        }
    }
}

/// Operation classes gated by role before any target is examined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    CreateProject,
    ViewProjects,
    UpdateProjectStatus,
    DeleteProject,
    CreateTask,
    ViewTasks,
    UpdateTask,
    DeleteTask,
    CreateSubtask,
    ViewSubtasks,
    ModifySubtask,
    ListAssignable,
    ListTeam,
    InviteTeamLead,
    ViewDashboardInsights,
    ViewProjectInsights,
    ViewTeamLeadInsights,
    GenerateProjectInsight,
}

impl OperationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationClass::CreateProject => "create_project",
            OperationClass::ViewProjects => "view_projects",
            OperationClass::UpdateProjectStatus => "update_project_status",
            OperationClass::DeleteProject => "delete_project",
            OperationClass::CreateTask => "create_task",
            OperationClass::ViewTasks => "view_tasks",
            OperationClass::UpdateTask => "update_task",
            OperationClass::DeleteTask => "delete_task",
            OperationClass::CreateSubtask => "create_subtask",
            OperationClass::ViewSubtasks => "view_subtasks",
            OperationClass::ModifySubtask => "modify_subtask",
            OperationClass::ListAssignable => "list_assignable",
            OperationClass::ListTeam => "list_team",
            OperationClass::InviteTeamLead => "invite_team_lead",
            OperationClass::ViewDashboardInsights => "view_dashboard_insights",
            OperationClass::ViewProjectInsights => "view_project_insights",
            OperationClass::ViewTeamLeadInsights => "view_team_lead_insights",
            OperationClass::GenerateProjectInsight => "generate_project_insight",
        }
    }

    /// Reason reported when the role gate rejects this class
    fn role_denial_reason(&self) -> &'static str {
        match self {
            OperationClass::CreateProject => "Team members cannot create projects",
            OperationClass::DeleteProject => "Team members cannot delete projects",
            OperationClass::CreateSubtask => "Only team members can create subtasks",
            OperationClass::ModifySubtask => "Only the assigned team member can modify subtasks",
            OperationClass::ListTeam => "Only managers and team leads can list team members",
            OperationClass::InviteTeamLead => "Only managers can invite team leads",
            OperationClass::ViewProjectInsights => {
                "Only managers and team leads can view project insights"
            }
            OperationClass::ViewTeamLeadInsights => "Only managers can view team lead insights",
            OperationClass::ViewProjects
            | OperationClass::UpdateProjectStatus
            | OperationClass::CreateTask
            | OperationClass::ViewTasks
            | OperationClass::UpdateTask
            | OperationClass::DeleteTask
            | OperationClass::ViewSubtasks
            | OperationClass::ListAssignable
            | OperationClass::ViewDashboardInsights
            | OperationClass::GenerateProjectInsight => "Permission denied",
        }
    }
}

/// Role gate. Finer checks (assignee, ownership) happen in [`rules`].
pub fn permits(role: Role, op: OperationClass) -> bool {
    use OperationClass::*;

    match role {
        Role::Manager => match op {
            CreateProject | ViewProjects | UpdateProjectStatus | DeleteProject => true,
            CreateTask | ViewTasks | UpdateTask | DeleteTask => true,
            CreateSubtask | ModifySubtask => false,
            ViewSubtasks => true,
            ListAssignable | ListTeam | InviteTeamLead => true,
            ViewDashboardInsights | ViewProjectInsights | ViewTeamLeadInsights => true,
            GenerateProjectInsight => true,
        },
        Role::TeamLead => match op {
            CreateProject | ViewProjects | UpdateProjectStatus | DeleteProject => true,
            CreateTask | ViewTasks | UpdateTask | DeleteTask => true,
            CreateSubtask | ModifySubtask => false,
            ViewSubtasks => true,
            ListAssignable | ListTeam => true,
            InviteTeamLead => false,
            ViewDashboardInsights | ViewProjectInsights => true,
            ViewTeamLeadInsights => false,
            GenerateProjectInsight => true,
        },
        Role::TeamMember => match op {
            CreateProject | DeleteProject => false,
            ViewProjects | UpdateProjectStatus => true,
            CreateTask | ViewTasks | UpdateTask | DeleteTask => true,
            CreateSubtask | ViewSubtasks | ModifySubtask => true,
            ListAssignable => true,
            ListTeam | InviteTeamLead => false,
            ViewDashboardInsights => true,
            ViewProjectInsights | ViewTeamLeadInsights => false,
            GenerateProjectInsight => true,
        },
        Role::Individual => match op {
            CreateProject | ViewProjects | UpdateProjectStatus | DeleteProject => true,
            CreateTask | ViewTasks | UpdateTask | DeleteTask => true,
            CreateSubtask | ViewSubtasks | ModifySubtask => false,
            ListAssignable => true,
            ListTeam | InviteTeamLead => false,
            ViewDashboardInsights => true,
            ViewProjectInsights | ViewTeamLeadInsights => false,
            GenerateProjectInsight => true,
        },
    }
}

/// Apply the role gate for `op`
pub fn require(actor: &Actor, op: OperationClass) -> Result<(), Denial> {
    if permits(actor.role, op) {
        Ok(())
    } else {
        Err(Denial::forbidden(op.role_denial_reason()))
    }
}
