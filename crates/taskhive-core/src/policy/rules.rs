//! Per-operation rules over loaded entities
//!
//! Callers load targets through the actor's scope first, so a target that is out of
//! reach surfaces as "not found" before these rules run. The rules re-check the
//! relationships they depend on regardless.

use uuid::Uuid;

use super::{Actor, Denial};
use crate::hierarchy::{assignable_targets, AssignableTargets};
use crate::models::{Project, Role, Task, User};

const INVALID_TEAM_LEAD: &str = "Invalid assignee: must be a team lead in your organization";
const INVALID_TEAM_MEMBER: &str = "You can only assign tasks to your own team members.";
const INVALID_PROJECT_MEMBER: &str = "Invalid assignee: must be one of your team members";

fn project_not_found() -> Denial {
    Denial::not_found("Project not found")
}

fn task_not_found() -> Denial {
    Denial::not_found("Task not found")
}

/// Organization a MANAGER acts for
fn managed_organization(actor: &Actor) -> Result<Uuid, Denial> {
    actor
        .organization_id
        .ok_or_else(|| Denial::forbidden("Manager has no organization"))
}

/// Check `assignee` against the actor's assignable set
fn check_assignee(actor: &Actor, assignee: &User, reason: &'static str) -> Result<(), Denial> {
    if assignable_targets(actor).admits(assignee) {
        Ok(())
    } else {
        Err(Denial::forbidden(reason))
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectPlacement {
    pub assigned_to_id: Uuid,
    pub organization_id: Option<Uuid>,
}

/// Decide assignee and organization of a new project
pub fn place_project(actor: &Actor, assignee: Option<&User>) -> Result<ProjectPlacement, Denial> {
    match actor.role {
        Role::Manager => {
            let organization_id = managed_organization(actor)?;
            let assignee = assignee.ok_or_else(|| Denial::invalid("assignedToId is required"))?;
            check_assignee(actor, assignee, INVALID_TEAM_LEAD)?;
            Ok(ProjectPlacement {
                assigned_to_id: assignee.id,
                organization_id: Some(organization_id),
            })
        }
        Role::TeamLead => {
            let assignee = assignee.ok_or_else(|| Denial::invalid("assignedToId is required"))?;
            check_assignee(actor, assignee, INVALID_PROJECT_MEMBER)?;
            // Kept private to the lead and member pair.
            Ok(ProjectPlacement {
                assigned_to_id: assignee.id,
                organization_id: None,
            })
        }
        Role::Individual => match assignee {
            Some(user) if user.id != actor.id => Err(Denial::forbidden(
                "Individuals can only assign projects to themselves",
            )),
            _ => Ok(ProjectPlacement {
                assigned_to_id: actor.id,
                organization_id: None,
            }),
        },
        Role::TeamMember => Err(Denial::forbidden("Team members cannot create projects")),
    }
}

pub fn may_update_project_status(actor: &Actor, project: &Project) -> Result<(), Denial> {
    if actor.is(project.assigned_to_id) {
        Ok(())
    } else {
        Err(Denial::forbidden("Only the assignee can update project status"))
    }
}

pub fn may_delete_project(actor: &Actor, project: &Project) -> Result<(), Denial> {
    match actor.role {
        Role::Manager => {
            let in_org =
                project.organization_id.is_some() && project.organization_id == actor.organization_id;
            if in_org || project.owner_id == actor.id {
                Ok(())
            } else {
                Err(project_not_found())
            }
        }
        Role::TeamLead | Role::Individual => {
            if project.owner_id == actor.id {
                Ok(())
            } else {
                Err(Denial::forbidden(
                    "Only the project owner or a manager can delete this project",
                ))
            }
        }
        Role::TeamMember => Err(Denial::forbidden("Team members cannot delete projects")),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Targets named by a task creation request, already loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDraft<'a> {
    pub personal: bool,
    pub assignee: Option<&'a User>,
    pub project: Option<&'a Project>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPlacement {
    pub assignee_id: Uuid,
    pub project_id: Option<Uuid>,
}

/// Kind of task the actor may create, decided before any target is loaded
pub fn check_task_kind(actor: &Actor, personal: bool) -> Result<(), Denial> {
    if actor.role == Role::TeamMember && !personal {
        return Err(Denial::forbidden(
            "Team members can only create personal tasks",
        ));
    }
    Ok(())
}

/// Decide assignee and project of a new top-level task
pub fn place_task(actor: &Actor, draft: TaskDraft<'_>) -> Result<TaskPlacement, Denial> {
    check_task_kind(actor, draft.personal)?;
    if draft.personal {
        return Ok(TaskPlacement {
            assignee_id: actor.id,
            project_id: None,
        });
    }

    match actor.role {
        Role::Manager => {
            let organization_id = managed_organization(actor)?;
            let assignee = draft
                .assignee
                .ok_or_else(|| Denial::invalid("assigneeId is required"))?;
            check_assignee(actor, assignee, INVALID_TEAM_LEAD)?;
            let project_id = match draft.project {
                Some(project) if project.organization_id == Some(organization_id) => Some(project.id),
                Some(_) => return Err(project_not_found()),
                None => None,
            };
            Ok(TaskPlacement {
                assignee_id: assignee.id,
                project_id,
            })
        }
        Role::TeamLead => {
            let assignee = draft
                .assignee
                .ok_or_else(|| Denial::invalid("assigneeId is required"))?;
            check_assignee(actor, assignee, INVALID_TEAM_MEMBER)?;
            let project_id = match draft.project {
                Some(project)
                    if project.owner_id == actor.id || actor.is(project.assigned_to_id) =>
                {
                    Some(project.id)
                }
                Some(_) => return Err(project_not_found()),
                None => None,
            };
            Ok(TaskPlacement {
                assignee_id: assignee.id,
                project_id,
            })
        }
        Role::Individual => {
            if draft.assignee.is_some_and(|user| user.id != actor.id) {
                return Err(Denial::forbidden(
                    "Individuals can only assign tasks to themselves",
                ));
            }
            let project_id = match draft.project {
                Some(project) if project.owner_id == actor.id => Some(project.id),
                Some(_) => {
                    return Err(Denial::forbidden(
                        "You can only create tasks for your own projects.",
                    ))
                }
                None => None,
            };
            Ok(TaskPlacement {
                assignee_id: actor.id,
                project_id,
            })
        }
        Role::TeamMember => Err(Denial::forbidden(
            "Team members can only create personal tasks",
        )),
    }
}

/// What an update request touches
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskChange<'a> {
    pub status: bool,
    /// Title, description or due date
    pub content: bool,
    pub reassign_to: Option<&'a User>,
}

pub fn may_update_task(actor: &Actor, task: &Task, change: TaskChange<'_>) -> Result<(), Denial> {
    if task.is_subtask() {
        return may_modify_subtask(actor, task);
    }

    match actor.role {
        Role::Manager | Role::TeamLead => {
            if let Some(assignee) = change.reassign_to {
                let reason = match actor.role {
                    Role::Manager => INVALID_TEAM_LEAD,
                    _ => INVALID_TEAM_MEMBER,
                };
                check_assignee(actor, assignee, reason)?;
            }
            Ok(())
        }
        Role::TeamMember | Role::Individual => {
            if change.reassign_to.is_some() {
                return Err(Denial::forbidden(
                    "Only managers and team leads can reassign tasks",
                ));
            }
            let is_creator = task.creator_id == actor.id;
            if change.content && !is_creator {
                return Err(Denial::forbidden(
                    "Only the task creator can edit task details",
                ));
            }
            if change.status && !(is_creator || actor.is(task.assignee_id)) {
                return Err(Denial::forbidden(
                    "Only the assignee or creator can update this task",
                ));
            }
            Ok(())
        }
    }
}

/// Creator or MANAGER. A MANAGER only ever reaches tasks inside its organization scope.
pub fn may_delete_task(actor: &Actor, task: &Task) -> Result<(), Denial> {
    if task.is_subtask() {
        return may_modify_subtask(actor, task);
    }

    match actor.role {
        Role::Manager => Ok(()),
        Role::TeamLead | Role::TeamMember | Role::Individual => {
            if task.creator_id == actor.id {
                Ok(())
            } else {
                Err(Denial::forbidden(
                    "Only the task creator or a manager can delete this task",
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Subtasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskPlacement {
    pub assignee_id: Uuid,
    pub project_id: Option<Uuid>,
    pub parent_task_id: Uuid,
}

/// A subtask is created by the parent's assignee, for themselves, inside the
/// parent's project.
pub fn place_subtask(actor: &Actor, parent: &Task) -> Result<SubtaskPlacement, Denial> {
    match actor.role {
        Role::TeamMember => {
            if !actor.is(parent.assignee_id) {
                return Err(Denial::forbidden("Not authorized for this task"));
            }
            Ok(SubtaskPlacement {
                assignee_id: actor.id,
                project_id: parent.project_id,
                parent_task_id: parent.id,
            })
        }
        Role::Manager | Role::TeamLead | Role::Individual => {
            Err(Denial::forbidden("Only team members can create subtasks"))
        }
    }
}

pub fn may_modify_subtask(actor: &Actor, subtask: &Task) -> Result<(), Denial> {
    if actor.role == Role::TeamMember && actor.is(subtask.assignee_id) {
        Ok(())
    } else {
        Err(Denial::forbidden(
            "Only the assigned team member can modify subtasks",
        ))
    }
}

/// Listing the subtasks of `parent`. Leads and managers load the parent through
/// their task scope; a member must be the parent's assignee.
pub fn may_view_subtasks(actor: &Actor, parent: &Task) -> Result<(), Denial> {
    match actor.role {
        Role::Manager | Role::TeamLead => Ok(()),
        Role::TeamMember => {
            if actor.is(parent.assignee_id) {
                Ok(())
            } else {
                Err(task_not_found())
            }
        }
        Role::Individual => Err(Denial::forbidden("Permission denied")),
    }
}

// ---------------------------------------------------------------------------
// Directory and invitations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteMode {
    /// No account exists for the email yet
    Create,
    /// Account is already a team lead of the manager's organization
    ResetExisting { user_id: Uuid, has_tl_id: bool },
}

/// Decide how an invitation treats the account currently registered to the email
pub fn check_invite_target(actor: &Actor, existing: Option<&User>) -> Result<InviteMode, Denial> {
    let organization_id = match actor.role {
        Role::Manager => managed_organization(actor)?,
        Role::TeamLead | Role::TeamMember | Role::Individual => {
            return Err(Denial::forbidden("Only managers can invite team leads"))
        }
    };

    match existing {
        None => Ok(InviteMode::Create),
        Some(user)
            if AssignableTargets::TeamLeadsOf(organization_id).admits(user) =>
        {
            Ok(InviteMode::ResetExisting {
                user_id: user.id,
                has_tl_id: user.tl_id_within_org.is_some(),
            })
        }
        Some(_) => Err(Denial::conflict(
            "A user with this email already exists and is not a team lead in your organization",
        )),
    }
}

/// A team lead is visible to the MANAGER of its organization
pub fn may_view_team_lead(actor: &Actor, lead: Option<&User>) -> Result<(), Denial> {
    let not_found = || Denial::not_found("Team lead not found");
    match actor.role {
        Role::Manager => {
            let organization_id = managed_organization(actor)?;
            match lead {
                Some(user) if AssignableTargets::TeamLeadsOf(organization_id).admits(user) => Ok(()),
                _ => Err(not_found()),
            }
        }
        Role::TeamLead | Role::TeamMember | Role::Individual => Err(Denial::forbidden(
            "Only managers can view team lead insights",
        )),
    }
}

/// A team roster is visible to its lead and to the MANAGER of the lead's organization
pub fn may_list_team(actor: &Actor, lead: Option<&User>) -> Result<(), Denial> {
    let lead = match lead {
        Some(user) if user.role == Role::TeamLead => user,
        _ => return Err(Denial::not_found("Team lead not found")),
    };
    let allowed = match actor.role {
        Role::TeamLead => lead.id == actor.id,
        Role::Manager => {
            actor.organization_id.is_some() && lead.organization_id == actor.organization_id
        }
        Role::TeamMember | Role::Individual => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(Denial::not_found("Team lead not found"))
    }
}

/// Project insights: the MANAGER of the project's organization, or the lead that
/// owns or runs the project.
pub fn may_view_project_insights(actor: &Actor, project: &Project) -> Result<(), Denial> {
    match actor.role {
        Role::Manager => {
            if project.organization_id.is_some() && project.organization_id == actor.organization_id {
                Ok(())
            } else {
                Err(project_not_found())
            }
        }
        Role::TeamLead => {
            if project.owner_id == actor.id || actor.is(project.assigned_to_id) {
                Ok(())
            } else {
                Err(project_not_found())
            }
        }
        Role::TeamMember | Role::Individual => Err(Denial::forbidden(
            "Only managers and team leads can view project insights",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkStatus;
    use crate::policy::DenialKind;
    use chrono::Utc;

    struct Org {
        id: Uuid,
        manager: User,
        lead: User,
        member: User,
    }

    fn user(role: Role, organization_id: Option<Uuid>, team_lead_id: Option<Uuid>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: format!("{}@acme.test", Uuid::new_v4()),
            name: None,
            role,
            password_hash: String::new(),
            organization_id,
            team_lead_id,
            tl_id_within_org: (role == Role::TeamLead).then_some(1),
            created_at: now,
            updated_at: now,
        }
    }

    fn org() -> Org {
        let id = Uuid::new_v4();
        let manager = user(Role::Manager, Some(id), None);
        let lead = user(Role::TeamLead, Some(id), None);
        let member = user(Role::TeamMember, Some(id), Some(lead.id));
        Org {
            id,
            manager,
            lead,
            member,
        }
    }

    fn actor(user: &User) -> Actor {
        Actor::from_user(user, None)
    }

    fn project(owner: &User, assigned_to: &User, organization_id: Option<Uuid>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            description: None,
            deadline: None,
            status: WorkStatus::Todo,
            owner_id: owner.id,
            assigned_to_id: Some(assigned_to.id),
            organization_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(creator: &User, assignee: &User, parent: Option<Uuid>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Write copy".to_string(),
            description: None,
            status: WorkStatus::Todo,
            project_id: None,
            assignee_id: Some(assignee.id),
            creator_id: creator.id,
            due_date: None,
            parent_task_id: parent,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn manager_assigns_projects_to_own_team_leads() {
        let acme = org();
        let globex = org();
        let manager = actor(&acme.manager);

        let placement = place_project(&manager, Some(&acme.lead)).unwrap();
        assert_eq!(placement.assigned_to_id, acme.lead.id);
        assert_eq!(placement.organization_id, Some(acme.id));

        let denial = place_project(&manager, Some(&globex.lead)).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Forbidden);
        assert!(denial.reason.contains("Invalid assignee"));

        let denial = place_project(&manager, Some(&acme.member)).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Forbidden);

        let denial = place_project(&manager, None).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Invalid);
    }

    #[test]
    fn lead_projects_stay_private_to_the_pair() {
        let acme = org();
        let lead = actor(&acme.lead);
        let placement = place_project(&lead, Some(&acme.member)).unwrap();
        assert_eq!(placement.assigned_to_id, acme.member.id);
        assert_eq!(placement.organization_id, None);
    }

    #[test]
    fn lead_cannot_assign_project_to_someone_elses_member() {
        let acme = org();
        let other_lead = user(Role::TeamLead, Some(acme.id), None);
        let stranger = user(Role::TeamMember, Some(acme.id), Some(other_lead.id));

        let denial = place_project(&actor(&acme.lead), Some(&stranger)).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Forbidden);
        assert!(denial.reason.contains("Invalid assignee"));
    }

    #[test]
    fn individual_projects_are_self_assigned() {
        let me = user(Role::Individual, None, None);
        let someone = user(Role::Individual, None, None);
        let placement = place_project(&actor(&me), None).unwrap();
        assert_eq!(placement.assigned_to_id, me.id);
        assert_eq!(placement.organization_id, None);
        assert!(place_project(&actor(&me), Some(&someone)).is_err());
    }

    #[test]
    fn only_the_assignee_updates_project_status() {
        let acme = org();
        let p = project(&acme.manager, &acme.lead, Some(acme.id));
        assert!(may_update_project_status(&actor(&acme.lead), &p).is_ok());
        let denial = may_update_project_status(&actor(&acme.manager), &p).unwrap_err();
        assert_eq!(denial.reason, "Only the assignee can update project status");
    }

    #[test]
    fn project_deletion_by_owner_or_manager() {
        let acme = org();
        let org_project = project(&acme.manager, &acme.lead, Some(acme.id));
        let lead_project = project(&acme.lead, &acme.member, None);

        assert!(may_delete_project(&actor(&acme.manager), &org_project).is_ok());
        assert!(may_delete_project(&actor(&acme.lead), &lead_project).is_ok());
        assert_eq!(
            may_delete_project(&actor(&acme.lead), &org_project).unwrap_err().kind,
            DenialKind::Forbidden
        );
        assert_eq!(
            may_delete_project(&actor(&acme.manager), &lead_project).unwrap_err().kind,
            DenialKind::NotFound
        );
    }

    #[test]
    fn task_kind_is_decided_before_targets() {
        let acme = org();
        let denial = check_task_kind(&actor(&acme.member), false).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Forbidden);
        assert!(check_task_kind(&actor(&acme.member), true).is_ok());
        assert!(check_task_kind(&actor(&acme.lead), false).is_ok());
        assert!(check_task_kind(&actor(&acme.manager), false).is_ok());
    }

    #[test]
    fn members_only_create_personal_tasks() {
        let acme = org();
        let member = actor(&acme.member);

        let denial = place_task(&member, TaskDraft::default()).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Forbidden);
        assert_eq!(denial.reason, "Team members can only create personal tasks");

        let placement = place_task(
            &member,
            TaskDraft {
                personal: true,
                assignee: Some(&acme.lead),
                project: None,
            },
        )
        .unwrap();
        assert_eq!(placement.assignee_id, acme.member.id);
        assert_eq!(placement.project_id, None);
    }

    #[test]
    fn lead_tasks_target_own_members_in_own_projects() {
        let acme = org();
        let lead = actor(&acme.lead);
        let own = project(&acme.manager, &acme.lead, Some(acme.id));
        let foreign = project(&acme.manager, &acme.member, Some(acme.id));

        let placement = place_task(
            &lead,
            TaskDraft {
                personal: false,
                assignee: Some(&acme.member),
                project: Some(&own),
            },
        )
        .unwrap();
        assert_eq!(placement.assignee_id, acme.member.id);
        assert_eq!(placement.project_id, Some(own.id));

        let denial = place_task(
            &lead,
            TaskDraft {
                personal: false,
                assignee: Some(&acme.member),
                project: Some(&foreign),
            },
        )
        .unwrap_err();
        assert_eq!(denial.kind, DenialKind::NotFound);

        let denial = place_task(
            &lead,
            TaskDraft {
                personal: false,
                assignee: Some(&acme.manager),
                project: None,
            },
        )
        .unwrap_err();
        assert_eq!(denial.reason, INVALID_TEAM_MEMBER);
    }

    #[test]
    fn manager_tasks_target_team_leads_in_org_projects() {
        let acme = org();
        let globex = org();
        let manager = actor(&acme.manager);
        let foreign = project(&globex.manager, &globex.lead, Some(globex.id));

        let denial = place_task(
            &manager,
            TaskDraft {
                personal: false,
                assignee: Some(&acme.lead),
                project: Some(&foreign),
            },
        )
        .unwrap_err();
        assert_eq!(denial.kind, DenialKind::NotFound);

        assert!(place_task(
            &manager,
            TaskDraft {
                personal: false,
                assignee: Some(&acme.lead),
                project: None,
            },
        )
        .is_ok());
    }

    #[test]
    fn individual_tasks_stay_in_own_projects() {
        let me = user(Role::Individual, None, None);
        let other = user(Role::Individual, None, None);
        let mine = project(&me, &me, None);
        let theirs = project(&other, &other, None);

        let placement = place_task(
            &actor(&me),
            TaskDraft {
                personal: false,
                assignee: None,
                project: Some(&mine),
            },
        )
        .unwrap();
        assert_eq!(placement.assignee_id, me.id);

        let denial = place_task(
            &actor(&me),
            TaskDraft {
                personal: false,
                assignee: None,
                project: Some(&theirs),
            },
        )
        .unwrap_err();
        assert_eq!(denial.reason, "You can only create tasks for your own projects.");
    }

    #[test]
    fn task_status_by_assignee_creator_or_hierarchy() {
        let acme = org();
        let t = task(&acme.lead, &acme.member, None);
        let status_only = TaskChange {
            status: true,
            ..Default::default()
        };

        assert!(may_update_task(&actor(&acme.member), &t, status_only).is_ok());
        assert!(may_update_task(&actor(&acme.lead), &t, status_only).is_ok());
        assert!(may_update_task(&actor(&acme.manager), &t, status_only).is_ok());

        let bystander = user(Role::TeamMember, Some(acme.id), Some(acme.lead.id));
        assert!(may_update_task(&actor(&bystander), &t, status_only).is_err());
    }

    #[test]
    fn members_cannot_edit_details_or_reassign() {
        let acme = org();
        let t = task(&acme.lead, &acme.member, None);
        let member = actor(&acme.member);

        let content = TaskChange {
            content: true,
            ..Default::default()
        };
        assert!(may_update_task(&member, &t, content).is_err());

        let reassign = TaskChange {
            reassign_to: Some(&acme.lead),
            ..Default::default()
        };
        assert!(may_update_task(&member, &t, reassign).is_err());
    }

    #[test]
    fn reassignment_is_validated_like_creation() {
        let acme = org();
        let t = task(&acme.lead, &acme.member, None);
        let other_member = user(Role::TeamMember, Some(acme.id), Some(acme.lead.id));
        let outsider = user(Role::TeamMember, Some(acme.id), Some(Uuid::new_v4()));

        let ok = TaskChange {
            reassign_to: Some(&other_member),
            ..Default::default()
        };
        assert!(may_update_task(&actor(&acme.lead), &t, ok).is_ok());

        let bad = TaskChange {
            reassign_to: Some(&outsider),
            ..Default::default()
        };
        assert_eq!(
            may_update_task(&actor(&acme.lead), &t, bad).unwrap_err().kind,
            DenialKind::Forbidden
        );
    }

    #[test]
    fn task_deletion_by_creator_or_manager() {
        let acme = org();
        let t = task(&acme.lead, &acme.member, None);
        assert!(may_delete_task(&actor(&acme.lead), &t).is_ok());
        assert!(may_delete_task(&actor(&acme.manager), &t).is_ok());

        let denial = may_delete_task(&actor(&acme.member), &t).unwrap_err();
        assert_eq!(denial.reason, "Only the task creator or a manager can delete this task");

        let personal = task(&acme.member, &acme.member, None);
        assert!(may_delete_task(&actor(&acme.member), &personal).is_ok());
    }

    #[test]
    fn subtasks_belong_to_the_parent_assignee() {
        let acme = org();
        let parent = task(&acme.lead, &acme.member, None);

        let placement = place_subtask(&actor(&acme.member), &parent).unwrap();
        assert_eq!(placement.assignee_id, acme.member.id);
        assert_eq!(placement.parent_task_id, parent.id);

        let bystander = user(Role::TeamMember, Some(acme.id), Some(acme.lead.id));
        let denial = place_subtask(&actor(&bystander), &parent).unwrap_err();
        assert_eq!(denial.reason, "Not authorized for this task");

        assert!(place_subtask(&actor(&acme.lead), &parent).is_err());
    }

    #[test]
    fn subtask_updates_route_through_subtask_rule() {
        let acme = org();
        let parent = task(&acme.lead, &acme.member, None);
        let sub = task(&acme.member, &acme.member, Some(parent.id));
        let status_only = TaskChange {
            status: true,
            ..Default::default()
        };

        assert!(may_update_task(&actor(&acme.member), &sub, status_only).is_ok());
        assert!(may_update_task(&actor(&acme.lead), &sub, status_only).is_err());
        assert!(may_delete_task(&actor(&acme.manager), &sub).is_err());
    }

    #[test]
    fn subtask_oversight() {
        let acme = org();
        let parent = task(&acme.lead, &acme.member, None);
        assert!(may_view_subtasks(&actor(&acme.lead), &parent).is_ok());
        assert!(may_view_subtasks(&actor(&acme.manager), &parent).is_ok());
        assert!(may_view_subtasks(&actor(&acme.member), &parent).is_ok());

        let bystander = user(Role::TeamMember, Some(acme.id), Some(acme.lead.id));
        assert_eq!(
            may_view_subtasks(&actor(&bystander), &parent).unwrap_err().kind,
            DenialKind::NotFound
        );
    }

    #[test]
    fn invitations() {
        let acme = org();
        let globex = org();
        let manager = actor(&acme.manager);

        assert_eq!(check_invite_target(&manager, None).unwrap(), InviteMode::Create);
        assert_eq!(
            check_invite_target(&manager, Some(&acme.lead)).unwrap(),
            InviteMode::ResetExisting {
                user_id: acme.lead.id,
                has_tl_id: true
            }
        );
        assert_eq!(
            check_invite_target(&manager, Some(&globex.lead)).unwrap_err().kind,
            DenialKind::Conflict
        );
        assert_eq!(
            check_invite_target(&manager, Some(&acme.member)).unwrap_err().kind,
            DenialKind::Conflict
        );
        assert_eq!(
            check_invite_target(&actor(&acme.lead), None).unwrap_err().kind,
            DenialKind::Forbidden
        );
    }

    #[test]
    fn team_lead_visibility() {
        let acme = org();
        let globex = org();
        let manager = actor(&acme.manager);

        assert!(may_view_team_lead(&manager, Some(&acme.lead)).is_ok());
        assert_eq!(
            may_view_team_lead(&manager, Some(&globex.lead)).unwrap_err().kind,
            DenialKind::NotFound
        );
        assert_eq!(
            may_view_team_lead(&manager, None).unwrap_err().kind,
            DenialKind::NotFound
        );

        assert!(may_list_team(&actor(&acme.lead), Some(&acme.lead)).is_ok());
        assert!(may_list_team(&manager, Some(&acme.lead)).is_ok());
        assert!(may_list_team(&manager, Some(&globex.lead)).is_err());
        assert!(may_list_team(&actor(&globex.lead), Some(&acme.lead)).is_err());
    }

    #[test]
    fn project_insight_visibility() {
        let acme = org();
        let globex = org();
        let p = project(&acme.manager, &acme.lead, Some(acme.id));

        assert!(may_view_project_insights(&actor(&acme.manager), &p).is_ok());
        assert!(may_view_project_insights(&actor(&acme.lead), &p).is_ok());
        assert_eq!(
            may_view_project_insights(&actor(&globex.manager), &p).unwrap_err().kind,
            DenialKind::NotFound
        );
        assert_eq!(
            may_view_project_insights(&actor(&acme.member), &p).unwrap_err().kind,
            DenialKind::Forbidden
        );
    }
}
