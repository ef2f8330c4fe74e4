//! Data scopes
//!
//! A scope describes which rows an actor may see. The persistence layer turns each
//! variant into a SQL predicate; nothing outside the scope is ever fetched.

use uuid::Uuid;

use super::Actor;
use crate::models::{Role, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Projects attached to the organization
    Organization(Uuid),
    /// Projects the user owns or is assigned to
    OwnedOrAssigned(Uuid),
    /// Projects assigned to the user or containing a task assigned to them
    AssignedOrWorkedOn(Uuid),
    /// Projects the user owns
    Owned(Uuid),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Tasks in the organization's projects, or created by or assigned to its members
    Organization {
        organization_id: Uuid,
        manager_id: Uuid,
    },
    /// Tasks created by or assigned to the lead, or assigned to one of their members
    Team { lead_id: Uuid },
    AssignedTo(Uuid),
    CreatedOrAssigned(Uuid),
    Nothing,
}

pub fn project_scope(actor: &Actor) -> ProjectScope {
    match actor.role {
        Role::Manager => match actor.organization_id {
            Some(org) => ProjectScope::Organization(org),
            None => ProjectScope::Owned(actor.id),
        },
        Role::TeamLead => ProjectScope::OwnedOrAssigned(actor.id),
        Role::TeamMember => ProjectScope::AssignedOrWorkedOn(actor.id),
        Role::Individual => ProjectScope::Owned(actor.id),
    }
}

pub fn task_scope(actor: &Actor) -> TaskScope {
    match actor.role {
        Role::Manager => match actor.organization_id {
            Some(organization_id) => TaskScope::Organization {
                organization_id,
                manager_id: actor.id,
            },
            None => TaskScope::CreatedOrAssigned(actor.id),
        },
        Role::TeamLead => TaskScope::Team { lead_id: actor.id },
        Role::TeamMember => TaskScope::AssignedTo(actor.id),
        Role::Individual => TaskScope::CreatedOrAssigned(actor.id),
    }
}

/// Generator filter for stored project summaries. A summary is written from its
/// generator's task scope, so only an organization-wide scope may read every one.
pub fn stored_insight_author(actor: &Actor) -> Option<Uuid> {
    match task_scope(actor) {
        TaskScope::Organization { .. } => None,
        TaskScope::Team { .. }
        | TaskScope::AssignedTo(_)
        | TaskScope::CreatedOrAssigned(_)
        | TaskScope::Nothing => Some(actor.id),
    }
}

/// Keep only the subtasks assigned to the actor. This is the one place subtask
/// visibility is decided; leads and managers see an empty list here and use the
/// dedicated subtasks query for oversight.
pub fn visible_subtasks(actor: &Actor, mut subtasks: Vec<Task>) -> Vec<Task> {
    subtasks.retain(|subtask| actor.is(subtask.assignee_id));
    subtasks
}

/// Subtasks shown by the dedicated per-parent query. Leads and managers get the full
/// list for oversight; a member only their own.
pub fn oversight_subtasks(actor: &Actor, subtasks: Vec<Task>) -> Vec<Task> {
    match actor.role {
        Role::Manager | Role::TeamLead => subtasks,
        Role::TeamMember => visible_subtasks(actor, subtasks),
        Role::Individual => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkStatus;
    use chrono::Utc;

    fn actor(role: Role, organization_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            organization_id,
            team_lead_id: None,
        }
    }

    fn subtask(assignee: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "sub".to_string(),
            description: None,
            status: WorkStatus::Todo,
            project_id: None,
            assignee_id: Some(assignee),
            creator_id: assignee,
            due_date: None,
            parent_task_id: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn scopes_follow_role() {
        let org = Uuid::new_v4();
        let manager = actor(Role::Manager, Some(org));
        assert_eq!(project_scope(&manager), ProjectScope::Organization(org));
        assert_eq!(
            task_scope(&manager),
            TaskScope::Organization {
                organization_id: org,
                manager_id: manager.id
            }
        );

        let lead = actor(Role::TeamLead, Some(org));
        assert_eq!(project_scope(&lead), ProjectScope::OwnedOrAssigned(lead.id));
        assert_eq!(task_scope(&lead), TaskScope::Team { lead_id: lead.id });

        let member = actor(Role::TeamMember, Some(org));
        assert_eq!(project_scope(&member), ProjectScope::AssignedOrWorkedOn(member.id));
        assert_eq!(task_scope(&member), TaskScope::AssignedTo(member.id));

        let individual = actor(Role::Individual, None);
        assert_eq!(project_scope(&individual), ProjectScope::Owned(individual.id));
        assert_eq!(task_scope(&individual), TaskScope::CreatedOrAssigned(individual.id));
    }

    #[test]
    fn manager_without_organization_falls_back_to_own_rows() {
        let manager = actor(Role::Manager, None);
        assert_eq!(project_scope(&manager), ProjectScope::Owned(manager.id));
        assert_eq!(task_scope(&manager), TaskScope::CreatedOrAssigned(manager.id));
    }

    #[test]
    fn stored_summaries_are_limited_to_own_below_manager() {
        let org = Uuid::new_v4();
        assert_eq!(stored_insight_author(&actor(Role::Manager, Some(org))), None);

        for role in [Role::TeamLead, Role::TeamMember, Role::Individual] {
            let someone = actor(role, Some(org));
            assert_eq!(stored_insight_author(&someone), Some(someone.id));
        }
        let unattached = actor(Role::Manager, None);
        assert_eq!(stored_insight_author(&unattached), Some(unattached.id));
    }

    #[test]
    fn subtasks_are_visible_only_to_their_assignee() {
        let member = actor(Role::TeamMember, None);
        let lead = actor(Role::TeamLead, None);
        let subtasks = vec![subtask(member.id), subtask(member.id)];

        assert_eq!(visible_subtasks(&member, subtasks.clone()).len(), 2);
        assert!(visible_subtasks(&lead, subtasks).is_empty());
    }

    #[test]
    fn oversight_query_shows_leads_every_subtask() {
        let member = actor(Role::TeamMember, None);
        let other = actor(Role::TeamMember, None);
        let subtasks = vec![subtask(member.id), subtask(other.id)];

        assert_eq!(oversight_subtasks(&actor(Role::TeamLead, None), subtasks.clone()).len(), 2);
        assert_eq!(oversight_subtasks(&actor(Role::Manager, None), subtasks.clone()).len(), 2);
        assert_eq!(oversight_subtasks(&member, subtasks.clone()).len(), 1);
        assert!(oversight_subtasks(&actor(Role::Individual, None), subtasks).is_empty());
    }
}
