//! The helpdesk service: every boundary operation over one SQLite store.
//!
//! Each write follows the same shape:
//!
//! 1. read the ticket without locking; this fixes the observed `version`
//! 2. open an `IMMEDIATE` transaction and take `now`
//! 3. under the lock, check the ticket is still at the observed version and
//!    look up every actor the command touches
//! 4. run the pure guard in [`crate::lifecycle::apply`]
//! 5. compare-and-swap the ticket row, move workload counters, append log
//!    messages, commit
//!
//! A ticket that moved between steps 1 and 3 is retried once from step 1
//! unless the caller pinned an `expected_version`.

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::assignment::{AssignmentResolver, StaffDirectory};
use crate::clock::{Clock, SystemClock, truncate_to_micros};
use crate::config::{DESK_DIR, ProjectConfig, STORE_FILE};
use crate::conversation::ConversationLog;
use crate::db::{self, actors, tickets};
use crate::error::{ActorRequirement, DeskError, ErrorKind, Rejection};
use crate::lifecycle::{self, Command, Context, LifecyclePolicy, Transition};
use crate::model::actor::{Actor, ActorId, Role};
use crate::model::category::Category;
use crate::model::message::{Message, NewMessage};
use crate::model::ticket::{AssigneeRef, Priority, ResolutionStatus, Status, Ticket, TicketId};
use crate::routing::RoutingTable;
use crate::workload::{WorkloadDrift, WorkloadIndex, WorkloadSnapshot};

pub use crate::db::tickets::TicketFilter;

/// Input to [`Desk::create_ticket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub category: Category,
    pub subcategory: Option<String>,
    pub priority: Priority,
    pub description: String,
    pub created_by: ActorId,
    /// Bypass workload routing and assign this actor directly.
    pub assignee: Option<ActorId>,
}

impl NewTicket {
    #[must_use]
    pub fn new(category: Category, created_by: ActorId, description: impl Into<String>) -> Self {
        Self {
            category,
            subcategory: None,
            priority: Priority::default(),
            description: description.into(),
            created_by,
            assignee: None,
        }
    }
}

/// Result of [`Desk::remove_actor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorRemoval {
    pub actor: ActorId,
    /// Tickets now pointing at a tombstone and awaiting reassignment.
    pub orphaned: Vec<TicketId>,
}

pub struct Desk {
    conn: Connection,
    routing: RoutingTable,
    policy: LifecyclePolicy,
    clock: Box<dyn Clock>,
}

struct StoreDirectory<'c>(&'c Connection);

impl StaffDirectory for StoreDirectory<'_> {
    fn actor(&self, id: &ActorId) -> Result<Option<Actor>, DeskError> {
        actors::get_actor(self.0, id)
    }

    fn workload(&self, roles: &BTreeSet<Role>) -> Result<Vec<WorkloadSnapshot>, DeskError> {
        WorkloadIndex::new(self.0).snapshot(roles)
    }
}

impl Desk {
    /// Open the desk rooted at `desk_root`, reading `.hrdesk/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is malformed or the store cannot be
    /// opened and migrated.
    pub fn open(desk_root: &Path) -> anyhow::Result<Self> {
        let config = crate::config::load_project_config(desk_root)?;
        let path = desk_root.join(DESK_DIR).join(STORE_FILE);
        Self::open_store(&path, &config)
    }

    /// Open a store file directly with an explicit config.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened and migrated.
    pub fn open_store(path: &Path, config: &ProjectConfig) -> anyhow::Result<Self> {
        let conn = db::open_store(path, config.store.busy_timeout())
            .with_context(|| format!("open helpdesk at {}", path.display()))?;
        Ok(Self::from_connection(conn, config.lifecycle_policy()))
    }

    /// Private in-memory desk with default policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::from_connection(
            db::open_in_memory()?,
            LifecyclePolicy::default(),
        ))
    }

    #[must_use]
    pub fn from_connection(conn: Connection, policy: LifecyclePolicy) -> Self {
        Self {
            conn,
            routing: RoutingTable::standard(),
            policy,
            clock: Box::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_routing(mut self, routing: RoutingTable) -> Self {
        self.routing = routing;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    #[must_use]
    pub const fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    // --- actor directory ---------------------------------------------------

    /// Insert or update an actor. Re-registering reactivates; use
    /// [`Self::remove_actor`] to deactivate.
    ///
    /// # Errors
    ///
    /// [`DeskError::RoleStrandsTickets`] when moving an actor who still holds
    /// open tickets to a role that cannot hold tickets, or a store error.
    pub fn register_actor(&mut self, actor: &Actor) -> Result<(), DeskError> {
        let result = self.register_actor_inner(actor);
        observe("register_actor", result)
    }

    fn register_actor_inner(&mut self, actor: &Actor) -> Result<(), DeskError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = truncate_to_micros(self.clock.now());
        if !self.routing.routable_roles().contains(&actor.role) {
            let held: Vec<TicketId> = tickets::list_tickets(
                &tx,
                &TicketFilter {
                    assignee: Some(actor.id.clone()),
                    ..TicketFilter::default()
                },
            )?
            .into_iter()
            .filter(|ticket| ticket.workload_holder().is_some())
            .map(|ticket| ticket.id)
            .collect();
            if !held.is_empty() {
                return Err(DeskError::RoleStrandsTickets {
                    actor: actor.id.clone(),
                    role: actor.role,
                    tickets: held,
                });
            }
        }
        actors::upsert_actor(&tx, actor, now)?;
        tx.commit()?;
        debug!(actor = %actor.id, role = %actor.role, "actor registered");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeskError::ActorNotFound`] if no such actor was registered.
    pub fn actor(&self, id: &ActorId) -> Result<Actor, DeskError> {
        let result = actors::get_actor(&self.conn, id)
            .and_then(|actor| actor.ok_or_else(|| DeskError::ActorNotFound(id.clone())));
        observe("actor", result)
    }

    /// # Errors
    ///
    /// Returns [`DeskError::Store`] on query failure.
    pub fn list_actors(&self, include_inactive: bool) -> Result<Vec<Actor>, DeskError> {
        actors::list_actors(&self.conn, include_inactive)
    }

    /// Deactivate an actor, tombstone every ticket they hold, and release
    /// their workload, atomically.
    ///
    /// # Errors
    ///
    /// [`DeskError::ActorNotFound`], [`DeskError::ActorInactive`] if already
    /// removed, or a store error.
    pub fn remove_actor(&mut self, id: &ActorId) -> Result<ActorRemoval, DeskError> {
        let result = self.remove_actor_inner(id);
        observe("remove_actor", result)
    }

    fn remove_actor_inner(&mut self, id: &ActorId) -> Result<ActorRemoval, DeskError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = truncate_to_micros(self.clock.now());
        active_actor(&tx, id)?;
        actors::deactivate_actor(&tx, id, now)?;

        let held = tickets::list_tickets(
            &tx,
            &TicketFilter {
                assignee: Some(id.clone()),
                ..TicketFilter::default()
            },
        )?;
        let log = ConversationLog::new(&tx);
        let mut orphaned = Vec::with_capacity(held.len());
        for ticket in held {
            let mut next = ticket.clone();
            next.assigned_to = AssigneeRef::Tombstone { former: id.clone() };
            next.updated_at = now;
            if !tickets::update_ticket(&tx, &next, ticket.version)? {
                return Err(conflict_on(&tx, &ticket.id)?);
            }
            log.append(
                &ticket.id,
                &NewMessage::system(format!("Assignee {id} was removed; ticket awaits reassignment")),
                now,
            )?;
            orphaned.push(ticket.id);
        }
        WorkloadIndex::new(&tx).clear(id)?;
        tx.commit()?;

        info!(actor = %id, orphaned = orphaned.len(), "actor removed");
        Ok(ActorRemoval {
            actor: id.clone(),
            orphaned,
        })
    }

    // --- ticket creation ---------------------------------------------------

    /// Route and persist a new ticket.
    ///
    /// Assignment, the insert, the workload charge, and the opening log entry
    /// share one transaction, so concurrent creations see each other's load.
    ///
    /// # Errors
    ///
    /// [`DeskError::UnknownCategory`], [`DeskError::NoEligibleActor`], an
    /// invalid creator or manual assignee, or a store error.
    pub fn create_ticket(&mut self, request: NewTicket) -> Result<Ticket, DeskError> {
        let result = self.create_ticket_inner(request);
        observe("create_ticket", result)
    }

    fn create_ticket_inner(&mut self, request: NewTicket) -> Result<Ticket, DeskError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(DeskError::InvalidValue {
                expected: "description",
                got: request.description.clone(),
            });
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = truncate_to_micros(self.clock.now());
        active_actor(&tx, &request.created_by)?;

        let assignment = AssignmentResolver::new(&self.routing).resolve(
            &StoreDirectory(&tx),
            request.category,
            request.assignee.as_ref(),
        )?;

        let seq = tickets::next_ticket_seq(&tx)?;
        let id = TicketId::derive(&format!(
            "{}:{}:{}:{seq}",
            request.created_by,
            request.category.key(),
            now.timestamp_micros()
        ));

        let ticket = Ticket {
            id,
            category: request.category,
            subcategory: request
                .subcategory
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            priority: request.priority,
            description: description.to_string(),
            status: Status::Open,
            resolution: ResolutionStatus::new(self.policy.max_reopen_allowed),
            escalation_level: 0,
            created_by: request.created_by,
            assigned_to: AssigneeRef::present(assignment.actor.clone()),
            original_assignee: assignment.actor.clone(),
            is_manually_assigned: assignment.manual,
            is_confidential: assignment.confidential,
            created_at: now,
            resolved_at: None,
            responded_at: None,
            updated_at: now,
            version: 1,
        };

        tickets::insert_ticket(&tx, &ticket)?;
        WorkloadIndex::new(&tx).increment(&assignment.actor)?;
        let how = if assignment.manual {
            "manually"
        } else {
            "by workload"
        };
        ConversationLog::new(&tx).append(
            &ticket.id,
            &NewMessage::system(format!(
                "Ticket opened in {} and assigned {how} to {}",
                ticket.category, assignment.actor
            )),
            now,
        )?;
        tx.commit()?;

        info!(
            ticket = %ticket.id,
            category = ticket.category.key(),
            assignee = %assignment.actor,
            manual = assignment.manual,
            confidential = ticket.is_confidential,
            "ticket created"
        );
        Ok(ticket)
    }

    // --- lifecycle ---------------------------------------------------------

    /// Set an arbitrary non-escalated status.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn set_status(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        to: Status,
        reason: Option<&str>,
    ) -> Result<Ticket, DeskError> {
        self.transition(
            ticket_id,
            actor_id,
            Command::SetStatus {
                to,
                reason: reason.map(str::to_string),
            },
            None,
        )
    }

    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn resolve_by_hr(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        comment: Option<&str>,
    ) -> Result<Ticket, DeskError> {
        self.transition(
            ticket_id,
            actor_id,
            Command::Resolve {
                comment: comment.map(str::to_string),
            },
            None,
        )
    }

    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn confirm_by_employee(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
    ) -> Result<Ticket, DeskError> {
        self.transition(ticket_id, actor_id, Command::Confirm, None)
    }

    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn reopen_by_employee(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        reason: &str,
    ) -> Result<Ticket, DeskError> {
        self.transition(
            ticket_id,
            actor_id,
            Command::Reopen {
                reason: reason.to_string(),
            },
            None,
        )
    }

    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn escalate(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        reason: &str,
    ) -> Result<Ticket, DeskError> {
        self.transition(
            ticket_id,
            actor_id,
            Command::Escalate {
                reason: reason.to_string(),
            },
            None,
        )
    }

    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn close_permanently(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        reason: Option<&str>,
    ) -> Result<Ticket, DeskError> {
        self.transition(
            ticket_id,
            actor_id,
            Command::ClosePermanently {
                reason: reason.map(str::to_string),
            },
            None,
        )
    }

    /// # Errors
    ///
    /// See [`Self::transition`].
    pub fn reassign(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        to: &ActorId,
    ) -> Result<Ticket, DeskError> {
        self.transition(ticket_id, actor_id, Command::Reassign { to: to.clone() }, None)
    }

    /// Apply `command` to a ticket on behalf of `actor_id`.
    ///
    /// With `expected_version`, the ticket must still be at that version or
    /// the call fails with [`DeskError::Conflict`] immediately. Without it, a
    /// concurrent write is absorbed by one re-read and retry.
    ///
    /// # Errors
    ///
    /// - [`DeskError::TicketNotFound`], [`DeskError::ActorNotFound`],
    ///   [`DeskError::ActorInactive`]
    /// - [`DeskError::Rejected`] when a lifecycle guard refuses
    /// - [`DeskError::Conflict`] when the race is lost (twice, or once with
    ///   `expected_version`)
    pub fn transition(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        command: Command,
        expected_version: Option<u64>,
    ) -> Result<Ticket, DeskError> {
        let mut retried = false;
        let result = loop {
            match self.try_transition(ticket_id, actor_id, &command, expected_version) {
                Err(DeskError::Conflict {
                    current_version, ..
                }) if expected_version.is_none() && !retried => {
                    warn!(
                        ticket = %ticket_id,
                        command = command.name(),
                        current_version,
                        "lost optimistic lock, retrying"
                    );
                    retried = true;
                }
                result => break result,
            }
        };
        observe(command.name(), result)
    }

    fn try_transition(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        command: &Command,
        expected_version: Option<u64>,
    ) -> Result<Ticket, DeskError> {
        let ticket = load_ticket(&self.conn, ticket_id)?;
        if let Some(expected) = expected_version {
            if ticket.version != expected {
                return Err(DeskError::Conflict {
                    ticket_id: ticket.id,
                    status: ticket.status,
                    current_version: ticket.version,
                });
            }
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = truncate_to_micros(self.clock.now());
        let current = load_ticket(&tx, ticket_id)?;
        if current.version != ticket.version {
            return Err(DeskError::Conflict {
                ticket_id: current.id,
                status: current.status,
                current_version: current.version,
            });
        }

        let actor = active_actor(&tx, actor_id)?;
        let directory = StoreDirectory(&tx);
        let resolver = AssignmentResolver::new(&self.routing);
        let mut transition = guard(&ticket, command, &actor, now, &self.policy, None)?;
        match command {
            Command::Reopen { .. } => {
                let target = reopen_target(&resolver, &directory, &ticket)?;
                if transition.ticket.assigned_to.actor() != Some(&target) {
                    transition =
                        guard(&ticket, command, &actor, now, &self.policy, Some(&target))?;
                }
            }
            Command::Reassign { to } => {
                resolver.check_assignable(&directory, to)?;
            }
            _ => {}
        }

        if !tickets::update_ticket(&tx, &transition.ticket, ticket.version)? {
            return Err(conflict_on(&tx, ticket_id)?);
        }
        WorkloadIndex::new(&tx).apply(&transition.workload)?;
        let log = ConversationLog::new(&tx);
        for message in &transition.messages {
            log.append(ticket_id, message, now)?;
        }
        tx.commit()?;

        let mut committed = transition.ticket;
        committed.version = ticket.version + 1;
        if matches!(command, Command::ClosePermanently { .. }) {
            info!(ticket = %committed.id, actor = %actor.id, "ticket permanently closed");
        } else {
            debug!(
                ticket = %committed.id,
                command = command.name(),
                from = %ticket.status,
                to = %committed.status,
                version = committed.version,
                "transition applied"
            );
        }
        Ok(committed)
    }

    // --- conversation ------------------------------------------------------

    /// Append a message from HR staff or the ticket creator.
    ///
    /// The first HR-authored message stamps `responded_at`.
    ///
    /// # Errors
    ///
    /// [`DeskError::Rejected`] for an outsider or a permanently closed
    /// ticket, [`DeskError::InvalidValue`] for a blank body, or lookup/store
    /// errors.
    pub fn post_message(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        body: &str,
    ) -> Result<Message, DeskError> {
        let result = self.post_message_inner(ticket_id, actor_id, body);
        observe("post_message", result)
    }

    fn post_message_inner(
        &mut self,
        ticket_id: &TicketId,
        actor_id: &ActorId,
        body: &str,
    ) -> Result<Message, DeskError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = truncate_to_micros(self.clock.now());
        let ticket = load_ticket(&tx, ticket_id)?;
        let actor = active_actor(&tx, actor_id)?;

        let reject = |rejection| DeskError::Rejected {
            ticket_id: ticket.id.clone(),
            status: ticket.status,
            rejection,
        };
        if !actor.role.is_hr() && actor.id != ticket.created_by {
            return Err(reject(Rejection::WrongActorRole {
                required: ActorRequirement::HrOrCreator,
                role: actor.role,
            }));
        }
        if ticket.is_terminal() {
            return Err(reject(Rejection::PermanentlyClosed));
        }

        let message = ConversationLog::new(&tx).append(
            &ticket.id,
            &NewMessage::from_actor(actor.id.clone(), body),
            now,
        )?;
        if actor.role.is_hr() && ticket.responded_at.is_none() {
            let mut next = ticket.clone();
            next.responded_at = Some(now);
            next.updated_at = now;
            if !tickets::update_ticket(&tx, &next, ticket.version)? {
                return Err(conflict_on(&tx, ticket_id)?);
            }
        }
        tx.commit()?;

        debug!(ticket = %ticket.id, author = %actor.id, seq = message.seq, "message posted");
        Ok(message)
    }

    /// # Errors
    ///
    /// [`DeskError::TicketNotFound`] or a store error.
    pub fn conversation(&self, ticket_id: &TicketId) -> Result<Vec<Message>, DeskError> {
        let result = load_ticket(&self.conn, ticket_id)
            .and_then(|ticket| ConversationLog::new(&self.conn).thread(&ticket.id));
        observe("conversation", result)
    }

    // --- read side ---------------------------------------------------------

    /// # Errors
    ///
    /// [`DeskError::TicketNotFound`] or a store error.
    pub fn get_ticket(&self, ticket_id: &TicketId) -> Result<Ticket, DeskError> {
        observe("get_ticket", load_ticket(&self.conn, ticket_id))
    }

    /// # Errors
    ///
    /// Returns a store error on query failure.
    pub fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DeskError> {
        tickets::list_tickets(&self.conn, filter)
    }

    /// Reopen deadline in force for `ticket` under this desk's policy.
    #[must_use]
    pub fn effective_reopen_deadline(&self, ticket: &Ticket) -> Option<DateTime<Utc>> {
        lifecycle::effective_reopen_deadline(ticket, &self.policy)
    }

    // --- workload ----------------------------------------------------------

    /// Active actors in `roles` with their open-ticket counts. An empty set
    /// means every role some category routes to.
    ///
    /// # Errors
    ///
    /// Returns a store error on query failure.
    pub fn get_workload(&self, roles: &BTreeSet<Role>) -> Result<Vec<WorkloadSnapshot>, DeskError> {
        let index = WorkloadIndex::new(&self.conn);
        if roles.is_empty() {
            index.snapshot(&self.routing.routable_roles())
        } else {
            index.snapshot(roles)
        }
    }

    /// Counters that disagree with a recount of the ticket table.
    ///
    /// # Errors
    ///
    /// Returns a store error on query failure.
    pub fn verify_workload(&self) -> Result<Vec<WorkloadDrift>, DeskError> {
        let drift = WorkloadIndex::new(&self.conn).drift()?;
        for row in &drift {
            warn!(
                actor = %row.actor_id,
                recorded = row.recorded,
                actual = row.actual,
                "workload drift"
            );
        }
        Ok(drift)
    }

    /// Rewrite every counter from a recount. Returns counters written.
    ///
    /// # Errors
    ///
    /// Returns a store error if the rebuild fails; nothing is changed then.
    pub fn rebuild_workload(&mut self) -> Result<usize, DeskError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let written = WorkloadIndex::new(&tx).rebuild()?;
        tx.commit()?;
        info!(counters = written, "workload rebuilt");
        Ok(written)
    }
}

fn guard(
    ticket: &Ticket,
    command: &Command,
    actor: &Actor,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
    reopen_assignee: Option<&ActorId>,
) -> Result<Transition, DeskError> {
    let ctx = Context {
        actor,
        now,
        policy,
        reopen_assignee,
    };
    lifecycle::apply(ticket, command, &ctx).map_err(|rejection| DeskError::Rejected {
        ticket_id: ticket.id.clone(),
        status: ticket.status,
        rejection,
    })
}

/// Original assignee when still assignable, otherwise a fresh route.
fn reopen_target(
    resolver: &AssignmentResolver<'_>,
    directory: &impl StaffDirectory,
    ticket: &Ticket,
) -> Result<ActorId, DeskError> {
    match resolver.check_assignable(directory, &ticket.original_assignee) {
        Ok(actor) => Ok(actor.id),
        Err(
            DeskError::ActorInactive(_)
            | DeskError::ActorNotFound(_)
            | DeskError::IneligibleAssignee(_),
        ) => {
            let routed = resolver.resolve(directory, ticket.category, None)?;
            debug!(
                ticket = %ticket.id,
                former = %ticket.original_assignee,
                assignee = %routed.actor,
                "original assignee unavailable, rerouted on reopen"
            );
            Ok(routed.actor)
        }
        Err(other) => Err(other),
    }
}

fn load_ticket(conn: &Connection, id: &TicketId) -> Result<Ticket, DeskError> {
    tickets::get_ticket(conn, id)?.ok_or_else(|| DeskError::TicketNotFound(id.clone()))
}

fn active_actor(conn: &Connection, id: &ActorId) -> Result<Actor, DeskError> {
    let actor = actors::get_actor(conn, id)?.ok_or_else(|| DeskError::ActorNotFound(id.clone()))?;
    if actor.active {
        Ok(actor)
    } else {
        Err(DeskError::ActorInactive(id.clone()))
    }
}

/// Build the conflict error from the row that won the race.
fn conflict_on(conn: &Connection, id: &TicketId) -> Result<DeskError, DeskError> {
    let current = load_ticket(conn, id)?;
    Ok(DeskError::Conflict {
        ticket_id: current.id,
        status: current.status,
        current_version: current.version,
    })
}

/// Log a failed operation at the severity its kind calls for.
fn observe<T>(operation: &'static str, result: Result<T, DeskError>) -> Result<T, DeskError> {
    if let Err(err) = &result {
        let code = err.code().code();
        match err.kind() {
            ErrorKind::Resource | ErrorKind::Storage => {
                error!(operation, code, error = %err, "operation failed");
            }
            ErrorKind::Conflict => warn!(operation, code, error = %err, "operation conflicted"),
            ErrorKind::Validation | ErrorKind::State => {
                debug!(operation, code, error = %err, "operation rejected");
            }
        }
    }
    result
}
