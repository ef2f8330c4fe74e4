//! Hierarchy rules
//!
//! Who an actor may reference as an assignee, and how team leads are numbered
//! inside their organization.

use uuid::Uuid;

use crate::models::{Role, User};
use crate::policy::Actor;

/// Users an actor may assign work to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignableTargets {
    /// TEAM_LEAD users of the organization
    TeamLeadsOf(Uuid),
    /// TEAM_MEMBER users reporting to the lead
    MembersOf(Uuid),
    Nobody,
}

impl AssignableTargets {
    /// Whether `user` belongs to this target set
    pub fn admits(&self, user: &User) -> bool {
        match *self {
            AssignableTargets::TeamLeadsOf(org) => {
                user.role == Role::TeamLead && user.organization_id == Some(org)
            }
            AssignableTargets::MembersOf(lead) => {
                user.role == Role::TeamMember && user.team_lead_id == Some(lead)
            }
            AssignableTargets::Nobody => false,
        }
    }
}

pub fn assignable_targets(actor: &Actor) -> AssignableTargets {
    match actor.role {
        Role::Manager => actor
            .organization_id
            .map_or(AssignableTargets::Nobody, AssignableTargets::TeamLeadsOf),
        Role::TeamLead => AssignableTargets::MembersOf(actor.id),
        Role::TeamMember | Role::Individual => AssignableTargets::Nobody,
    }
}

/// Next sequential team-lead number given the current maximum in the organization.
/// Must be read under the same transaction (and lock) as the insert that uses it.
pub fn next_tl_id(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}
