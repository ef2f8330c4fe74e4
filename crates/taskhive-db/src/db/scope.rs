//! Translation of policy scopes into SQL predicates.
//!
//! Project predicates expect the projects table aliased as `p`, task predicates
//! expect tasks aliased as `t`. Every user value is bound, never interpolated.

use sqlx::{Postgres, QueryBuilder};
use taskhive_core::policy::{ProjectScope, TaskScope};
use uuid::Uuid;

pub(crate) fn push_project_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: ProjectScope) {
    match scope {
        ProjectScope::Organization(organization_id) => {
            qb.push("p.organization_id = ").push_bind(organization_id);
        }
        ProjectScope::OwnedOrAssigned(user_id) => {
            qb.push("(p.owner_id = ")
                .push_bind(user_id)
                .push(" OR p.assigned_to_id = ")
                .push_bind(user_id)
                .push(")");
        }
        ProjectScope::AssignedOrWorkedOn(user_id) => {
            qb.push("(p.assigned_to_id = ")
                .push_bind(user_id)
                .push(" OR EXISTS (SELECT 1 FROM tasks st WHERE st.project_id = p.id AND st.assignee_id = ")
                .push_bind(user_id)
                .push("))");
        }
        ProjectScope::Owned(user_id) => {
            qb.push("p.owner_id = ").push_bind(user_id);
        }
        ProjectScope::Nothing => {
            qb.push("FALSE");
        }
    }
}

pub(crate) fn push_task_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: TaskScope) {
    match scope {
        TaskScope::Organization {
            organization_id,
            manager_id,
        } => {
            qb.push("(t.creator_id = ")
                .push_bind(manager_id)
                .push(" OR t.assignee_id = ")
                .push_bind(manager_id)
                .push(" OR EXISTS (SELECT 1 FROM projects sp WHERE sp.id = t.project_id AND sp.organization_id = ")
                .push_bind(organization_id)
                .push(") OR EXISTS (SELECT 1 FROM users su WHERE su.id IN (t.assignee_id, t.creator_id) AND su.organization_id = ")
                .push_bind(organization_id)
                .push("))");
        }
        TaskScope::Team { lead_id } => {
            qb.push("(t.creator_id = ")
                .push_bind(lead_id)
                .push(" OR t.assignee_id = ")
                .push_bind(lead_id)
                .push(" OR EXISTS (SELECT 1 FROM users su WHERE su.id = t.assignee_id AND su.team_lead_id = ")
                .push_bind(lead_id)
                .push("))");
        }
        TaskScope::AssignedTo(user_id) => {
            qb.push("t.assignee_id = ").push_bind(user_id);
        }
        TaskScope::CreatedOrAssigned(user_id) => {
            qb.push("(t.creator_id = ")
                .push_bind(user_id)
                .push(" OR t.assignee_id = ")
                .push_bind(user_id)
                .push(")");
        }
        TaskScope::Nothing => {
            qb.push("FALSE");
        }
    }
}

/// Subtasks are reachable through a lookup only by their assignee
pub(crate) fn push_subtask_visibility(qb: &mut QueryBuilder<'_, Postgres>, actor_id: Uuid) {
    qb.push("(t.parent_task_id IS NULL OR t.assignee_id = ")
        .push_bind(actor_id)
        .push(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_sql(scope: ProjectScope) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM projects p WHERE ");
        push_project_scope(&mut qb, scope);
        qb.sql().to_string()
    }

    fn task_sql(scope: TaskScope) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.* FROM tasks t WHERE ");
        push_task_scope(&mut qb, scope);
        qb.sql().to_string()
    }

    #[test]
    fn project_scopes_bind_every_value() {
        let id = Uuid::new_v4();
        assert_eq!(
            project_sql(ProjectScope::Organization(id)),
            "SELECT p.* FROM projects p WHERE p.organization_id = $1"
        );
        let sql = project_sql(ProjectScope::AssignedOrWorkedOn(id));
        assert!(sql.contains("p.assigned_to_id = $1"));
        assert!(sql.contains("st.assignee_id = $2"));
        assert!(!sql.contains(&id.to_string()));
    }

    #[test]
    fn empty_scopes_match_nothing() {
        assert!(project_sql(ProjectScope::Nothing).ends_with("WHERE FALSE"));
        assert!(task_sql(TaskScope::Nothing).ends_with("WHERE FALSE"));
    }

    #[test]
    fn team_scope_includes_members_tasks() {
        let sql = task_sql(TaskScope::Team {
            lead_id: Uuid::new_v4(),
        });
        assert!(sql.contains("su.team_lead_id = $3"));
    }

    #[test]
    fn organization_scope_checks_projects_and_people() {
        let sql = task_sql(TaskScope::Organization {
            organization_id: Uuid::new_v4(),
            manager_id: Uuid::new_v4(),
        });
        assert!(sql.contains("sp.organization_id = $3"));
        assert!(sql.contains("su.organization_id = $4"));
    }
}
