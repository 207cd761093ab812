//! Choosing who receives a ticket.
//!
//! Automatic routing looks up the category's eligible roles and picks the
//! active actor with the fewest open tickets. Ties go to the smallest actor
//! id, so the same store state always yields the same assignee.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::DeskError;
use crate::model::actor::{Actor, ActorId, Role};
use crate::model::category::Category;
use crate::routing::RoutingTable;
use crate::workload::WorkloadSnapshot;

/// Read access to actors and their loads.
pub trait StaffDirectory {
    /// Look up an actor, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn actor(&self, id: &ActorId) -> Result<Option<Actor>, DeskError>;

    /// Active actors holding any of `roles`, with open-ticket counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn workload(&self, roles: &BTreeSet<Role>) -> Result<Vec<WorkloadSnapshot>, DeskError>;
}

/// Outcome of [`AssignmentResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub actor: ActorId,
    pub manual: bool,
    pub confidential: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct AssignmentResolver<'r> {
    routing: &'r RoutingTable,
}

impl<'r> AssignmentResolver<'r> {
    #[must_use]
    pub const fn new(routing: &'r RoutingTable) -> Self {
        Self { routing }
    }

    /// Pick the assignee for a new ticket in `category`.
    ///
    /// A manual choice bypasses load balancing but must still be an active
    /// actor holding a routable HR role.
    ///
    /// # Errors
    ///
    /// - [`DeskError::UnknownCategory`] if the category has no routing row
    /// - [`DeskError::NoEligibleActor`] if no active actor holds a routed role
    /// - [`DeskError::ActorNotFound`], [`DeskError::ActorInactive`], or
    ///   [`DeskError::IneligibleAssignee`] for a bad manual choice
    pub fn resolve(
        &self,
        directory: &impl StaffDirectory,
        category: Category,
        manual: Option<&ActorId>,
    ) -> Result<Assignment, DeskError> {
        let entry = self.routing.roles_for(category)?;

        if let Some(chosen) = manual {
            self.check_assignable(directory, chosen)?;
            return Ok(Assignment {
                actor: chosen.clone(),
                manual: true,
                confidential: entry.confidential,
            });
        }

        let candidates = directory.workload(&entry.roles)?;
        let pick = candidates
            .into_iter()
            .filter(|candidate| entry.roles.contains(&candidate.role))
            .min_by(|a, b| {
                a.open_ticket_count
                    .cmp(&b.open_ticket_count)
                    .then_with(|| a.actor_id.cmp(&b.actor_id))
            })
            .ok_or_else(|| DeskError::NoEligibleActor {
                category: category.label().to_string(),
                roles: entry.roles.iter().copied().collect(),
            })?;

        tracing::debug!(
            category = category.key(),
            assignee = %pick.actor_id,
            open_tickets = pick.open_ticket_count,
            "routed by workload"
        );

        Ok(Assignment {
            actor: pick.actor_id,
            manual: false,
            confidential: entry.confidential,
        })
    }

    /// Confirm `id` may hold tickets at all: it exists, is active, and has
    /// a role some category routes to.
    ///
    /// # Errors
    ///
    /// [`DeskError::ActorNotFound`], [`DeskError::ActorInactive`], or
    /// [`DeskError::IneligibleAssignee`].
    pub fn check_assignable(
        &self,
        directory: &impl StaffDirectory,
        id: &ActorId,
    ) -> Result<Actor, DeskError> {
        let actor = directory
            .actor(id)?
            .ok_or_else(|| DeskError::ActorNotFound(id.clone()))?;
        if !actor.active {
            return Err(DeskError::ActorInactive(id.clone()));
        }
        if !self.routing.routable_roles().contains(&actor.role) {
            return Err(DeskError::IneligibleAssignee(id.clone()));
        }
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentResolver, StaffDirectory};
    use crate::error::DeskError;
    use crate::model::actor::{Actor, ActorId, Role};
    use crate::model::category::Category;
    use crate::routing::RoutingTable;
    use crate::testing::{actor, employee};
    use crate::workload::WorkloadSnapshot;
    use std::collections::{BTreeSet, HashMap};

    #[derive(Default)]
    struct FixedDirectory {
        actors: Vec<Actor>,
        load: HashMap<String, u32>,
    }

    impl FixedDirectory {
        fn with(mut self, actor: Actor, open: u32) -> Self {
            self.load.insert(actor.id.to_string(), open);
            self.actors.push(actor);
            self
        }
    }

    impl StaffDirectory for FixedDirectory {
        fn actor(&self, id: &ActorId) -> Result<Option<Actor>, DeskError> {
            Ok(self.actors.iter().find(|a| &a.id == id).cloned())
        }

        fn workload(&self, roles: &BTreeSet<Role>) -> Result<Vec<WorkloadSnapshot>, DeskError> {
            let mut rows: Vec<WorkloadSnapshot> = self
                .actors
                .iter()
                .filter(|a| a.active && roles.contains(&a.role))
                .map(|a| WorkloadSnapshot {
                    actor_id: a.id.clone(),
                    role: a.role,
                    open_ticket_count: self.load.get(a.id.as_str()).copied().unwrap_or(0),
                })
                .collect();
            rows.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));
            Ok(rows)
        }
    }

    fn inactive(id: &str, role: Role) -> Actor {
        let mut a = actor(id, role);
        a.active = false;
        a
    }

    #[test]
    fn picks_least_loaded() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default()
            .with(actor("hr-a", Role::HrExecutive), 4)
            .with(actor("hr-b", Role::HrExecutive), 1)
            .with(actor("hr-c", Role::HrExecutive), 2);

        let assignment = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::LeaveIssue, None)
            .expect("assign");
        assert_eq!(assignment.actor.as_str(), "hr-b");
        assert!(!assignment.manual);
    }

    #[test]
    fn ties_break_by_smallest_id() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default()
            .with(actor("hr-z", Role::HrExecutive), 0)
            .with(actor("hr-m", Role::HrExecutive), 0);

        let assignment = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::LeaveIssue, None)
            .expect("assign");
        assert_eq!(assignment.actor.as_str(), "hr-m");
    }

    #[test]
    fn payroll_ignores_executives() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default()
            .with(actor("hr-exec", Role::HrExecutive), 0)
            .with(actor("hr-mgr", Role::HrManager), 7);

        let assignment = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::PayrollSalary, None)
            .expect("assign");
        assert_eq!(assignment.actor.as_str(), "hr-mgr");
    }

    #[test]
    fn grievance_is_confidential() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default().with(actor("hr-mgr", Role::HrManager), 0);

        let assignment = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::HarassmentGrievance, None)
            .expect("assign");
        assert!(assignment.confidential);
    }

    #[test]
    fn no_active_candidate_fails() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default()
            .with(inactive("hr-gone", Role::HrManager), 0)
            .with(actor("hr-exec", Role::HrExecutive), 0);

        let err = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::PayrollSalary, None)
            .expect_err("nobody eligible");
        match err {
            DeskError::NoEligibleActor { roles, .. } => assert_eq!(roles, vec![Role::HrManager]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrouted_category_is_unknown() {
        let routing = RoutingTable::from_rows([(
            Category::LeaveIssue,
            BTreeSet::from([Role::HrExecutive]),
        )]);
        let directory = FixedDirectory::default().with(actor("hr-a", Role::HrExecutive), 0);

        let err = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::Recruitment, None)
            .expect_err("no row");
        assert!(matches!(err, DeskError::UnknownCategory(_)));
    }

    #[test]
    fn manual_choice_bypasses_load() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default()
            .with(actor("hr-busy", Role::HrOperations), 9)
            .with(actor("hr-idle", Role::HrExecutive), 0);
        let chosen = ActorId::new_unchecked("hr-busy");

        let assignment = AssignmentResolver::new(&routing)
            .resolve(&directory, Category::LeaveIssue, Some(&chosen))
            .expect("assign");
        assert_eq!(assignment.actor, chosen);
        assert!(assignment.manual);
    }

    #[test]
    fn manual_choice_must_be_active_hr() {
        let routing = RoutingTable::standard();
        let directory = FixedDirectory::default()
            .with(employee(), 0)
            .with(inactive("hr-gone", Role::HrExecutive), 0);
        let resolver = AssignmentResolver::new(&routing);

        let err = resolver
            .resolve(&directory, Category::LeaveIssue, Some(&employee().id))
            .expect_err("employee");
        assert!(matches!(err, DeskError::IneligibleAssignee(_)));

        let gone = ActorId::new_unchecked("hr-gone");
        let err = resolver
            .resolve(&directory, Category::LeaveIssue, Some(&gone))
            .expect_err("inactive");
        assert!(matches!(err, DeskError::ActorInactive(_)));

        let ghost = ActorId::new_unchecked("hr-ghost");
        let err = resolver
            .resolve(&directory, Category::LeaveIssue, Some(&ghost))
            .expect_err("missing");
        assert!(matches!(err, DeskError::ActorNotFound(_)));
    }
}
