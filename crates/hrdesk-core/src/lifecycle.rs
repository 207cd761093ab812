//! Ticket lifecycle state machine.
//!
//! [`apply`] is a pure function: it validates a [`Command`] against the
//! current [`Ticket`] and returns the next ticket value together with the
//! workload change and conversation entries that must be committed with it.
//! Persistence, version checks, and retries live in [`crate::desk`].
//!
//! Transition summary:
//!
//! | command            | actor              | from                         | to        |
//! |--------------------|--------------------|------------------------------|-----------|
//! | `SetStatus`        | HR or creator      | open, in progress, pending   | any but escalated |
//! | `Escalate`         | HR or creator      | anything but resolved/closed | escalated |
//! | `Resolve`          | HR                 | anything but resolved/closed | resolved  |
//! | `Confirm`          | creator (non-HR)   | resolved                     | closed    |
//! | `Reopen`           | creator (non-HR)   | resolved, closed             | reopened  |
//! | `ClosePermanently` | HR                 | anything                     | closed (terminal) |
//! | `Reassign`         | HR                 | anything                     | unchanged |
//!
//! A permanently closed ticket rejects every command.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{ActorRequirement, Rejection};
use crate::escalation::EscalationPolicy;
use crate::model::actor::{Actor, ActorId};
use crate::model::message::NewMessage;
use crate::model::ticket::{AssigneeRef, ResolutionStatus, Status, Ticket};

/// Time and count limits applied to reopen requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub reopen_window: TimeDelta,
    /// Stamped onto tickets at creation.
    pub max_reopen_allowed: u32,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            reopen_window: TimeDelta::days(3),
            max_reopen_allowed: ResolutionStatus::DEFAULT_MAX_REOPEN,
        }
    }
}

/// Requested lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetStatus { to: Status, reason: Option<String> },
    Escalate { reason: String },
    Resolve { comment: Option<String> },
    Confirm,
    Reopen { reason: String },
    ClosePermanently { reason: Option<String> },
    Reassign { to: ActorId },
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetStatus { .. } => "set_status",
            Self::Escalate { .. } => "escalate",
            Self::Resolve { .. } => "resolve",
            Self::Confirm => "confirm",
            Self::Reopen { .. } => "reopen",
            Self::ClosePermanently { .. } => "close_permanently",
            Self::Reassign { .. } => "reassign",
        }
    }

    const fn requirement(&self) -> ActorRequirement {
        match self {
            Self::SetStatus { .. } | Self::Escalate { .. } => ActorRequirement::HrOrCreator,
            Self::Resolve { .. } | Self::ClosePermanently { .. } | Self::Reassign { .. } => {
                ActorRequirement::HrStaff
            }
            Self::Confirm | Self::Reopen { .. } => ActorRequirement::CreatorEmployee,
        }
    }
}

/// Inputs to [`apply`] that are not part of the ticket itself.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub actor: &'a Actor,
    pub now: DateTime<Utc>,
    pub policy: &'a LifecyclePolicy,
    /// Where a reopened ticket is routed; defaults to the original assignee.
    pub reopen_assignee: Option<&'a ActorId>,
}

/// Move of one ticket's workload charge between actors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadChange {
    pub release: Option<ActorId>,
    pub charge: Option<ActorId>,
}

impl WorkloadChange {
    /// Compare who is charged before and after a write.
    #[must_use]
    pub fn between(before: &Ticket, after: &Ticket) -> Self {
        let old = before.workload_holder();
        let new = after.workload_holder();
        if old == new {
            Self::default()
        } else {
            Self {
                release: old.cloned(),
                charge: new.cloned(),
            }
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.release.is_none() && self.charge.is_none()
    }
}

/// Everything a successful transition commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub ticket: Ticket,
    pub workload: WorkloadChange,
    pub messages: Vec<NewMessage>,
}

/// Reopen deadline in force for `ticket`.
///
/// Records written before the deadline was stored explicitly fall back to
/// `resolved_at + window`. Derived on read only; never written back.
#[must_use]
pub fn effective_reopen_deadline(
    ticket: &Ticket,
    policy: &LifecyclePolicy,
) -> Option<DateTime<Utc>> {
    ticket
        .resolution
        .reopen_deadline
        .or_else(|| ticket.resolved_at.map(|at| at + policy.reopen_window))
}

/// Validate `command` against `ticket` and compute the resulting state.
///
/// # Errors
///
/// Returns the first guard that refuses the transition.
pub fn apply(ticket: &Ticket, command: &Command, ctx: &Context<'_>) -> Result<Transition, Rejection> {
    check_actor(ticket, ctx.actor, command.requirement())?;
    if let Command::Reopen { reason } = command {
        if reason.trim().is_empty() {
            return Err(Rejection::ReasonRequired);
        }
    }
    if ticket.is_terminal() {
        return Err(Rejection::PermanentlyClosed);
    }

    let mut next = ticket.clone();
    let actor = &ctx.actor.id;
    let body = match command {
        Command::SetStatus { to, reason } => {
            set_status(&mut next, *to, ctx)?;
            with_note(
                format!("Status changed from {} to {to} by {actor}", ticket.status),
                reason.as_deref(),
            )
        }
        Command::Escalate { reason } => {
            let policy = EscalationPolicy;
            if !policy.can_escalate(ticket) {
                return Err(Rejection::AlreadyTerminal);
            }
            next.escalation_level = policy.next_level(ticket);
            next.status = Status::Escalated;
            with_note(
                format!("Escalated to level {} by {actor}", next.escalation_level),
                Some(reason.as_str()),
            )
        }
        Command::Resolve { comment } => {
            if matches!(ticket.status, Status::Resolved | Status::Closed) {
                return Err(Rejection::InvalidTransition {
                    to: Some(Status::Resolved),
                });
            }
            next.status = Status::Resolved;
            next.resolution.employee_confirmed = false;
            stamp_resolution(&mut next, ctx);
            with_note(format!("Resolved by {actor}"), comment.as_deref())
        }
        Command::Confirm => {
            if ticket.status != Status::Resolved {
                return Err(Rejection::NotResolved);
            }
            next.status = Status::Closed;
            next.resolution.employee_confirmed = true;
            format!("Resolution confirmed by {actor}")
        }
        Command::Reopen { reason } => {
            reopen(&mut next, ctx)?;
            with_note(
                format!(
                    "Reopened by {actor} ({} of {})",
                    next.resolution.reopen_count, next.resolution.max_reopen_allowed
                ),
                Some(reason.as_str()),
            )
        }
        Command::ClosePermanently { reason } => {
            next.status = Status::Closed;
            next.resolution.permanently_closed_by_hr = true;
            if next.resolved_at.is_none() {
                next.resolved_at = Some(ctx.now);
                next.resolution.reopen_deadline = None;
            }
            with_note(format!("Permanently closed by {actor}"), reason.as_deref())
        }
        Command::Reassign { to } => {
            if ticket.assigned_to.actor() == Some(to) {
                return Err(Rejection::InvalidTransition { to: None });
            }
            next.assigned_to = AssigneeRef::present(to.clone());
            next.is_manually_assigned = true;
            format!("Reassigned from {} to {to} by {actor}", ticket.assigned_to)
        }
    };

    if ctx.actor.role.is_hr() && next.responded_at.is_none() {
        next.responded_at = Some(ctx.now);
    }
    next.updated_at = ctx.now;

    Ok(Transition {
        workload: WorkloadChange::between(ticket, &next),
        ticket: next,
        messages: vec![NewMessage::system(body)],
    })
}

fn check_actor(ticket: &Ticket, actor: &Actor, required: ActorRequirement) -> Result<(), Rejection> {
    let is_creator = actor.id == ticket.created_by;
    let allowed = match required {
        ActorRequirement::HrStaff => actor.role.is_hr(),
        ActorRequirement::HrOrCreator => actor.role.is_hr() || is_creator,
        ActorRequirement::CreatorEmployee => is_creator && !actor.role.is_hr(),
    };
    if allowed {
        Ok(())
    } else {
        Err(Rejection::WrongActorRole {
            required,
            role: actor.role,
        })
    }
}

fn set_status(next: &mut Ticket, to: Status, ctx: &Context<'_>) -> Result<(), Rejection> {
    let from = next.status;
    if !from.accepts_status_set() || !to.is_settable_target() || to == from {
        return Err(Rejection::InvalidTransition { to: Some(to) });
    }
    next.status = to;
    match to {
        Status::Resolved => stamp_resolution(next, ctx),
        Status::Closed if next.resolved_at.is_none() => stamp_resolution(next, ctx),
        _ => {}
    }
    Ok(())
}

/// Record a resolution at `now`. A stored deadline is kept only while it
/// still lies ahead, so the deadline never precedes `resolved_at`.
fn stamp_resolution(next: &mut Ticket, ctx: &Context<'_>) {
    next.resolved_at = Some(ctx.now);
    next.resolution.reopen_deadline = match next.resolution.reopen_deadline {
        Some(deadline) if deadline >= ctx.now => Some(deadline),
        _ => Some(ctx.now + ctx.policy.reopen_window),
    };
}

fn reopen(next: &mut Ticket, ctx: &Context<'_>) -> Result<(), Rejection> {
    if !matches!(next.status, Status::Resolved | Status::Closed) {
        return Err(Rejection::NotResolved);
    }
    let Some(deadline) = effective_reopen_deadline(next, ctx.policy) else {
        return Err(Rejection::NotResolved);
    };
    if ctx.now > deadline {
        return Err(Rejection::DeadlinePassed { deadline });
    }
    let resolution = &next.resolution;
    if resolution.reopen_count >= resolution.max_reopen_allowed {
        return Err(Rejection::ReopenLimitExceeded {
            count: resolution.reopen_count,
            max: resolution.max_reopen_allowed,
        });
    }

    next.status = Status::Reopened;
    next.resolution.reopen_count += 1;
    next.resolution.employee_confirmed = false;
    // The next resolution opens a fresh window.
    next.resolution.reopen_deadline = None;
    let assignee = ctx
        .reopen_assignee
        .unwrap_or(&next.original_assignee)
        .clone();
    next.assigned_to = AssigneeRef::present(assignee);
    Ok(())
}

fn with_note(head: String, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{head}: {note}"),
        None => head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::actor::Role;
    use crate::testing::{actor, employee, hr, sample_ticket, t0};

    fn run(ticket: &Ticket, command: Command, who: &Actor, now: DateTime<Utc>) -> Result<Transition, Rejection> {
        let policy = LifecyclePolicy::default();
        let ctx = Context {
            actor: who,
            now,
            policy: &policy,
            reopen_assignee: None,
        };
        apply(ticket, &command, &ctx)
    }

    fn resolved_at(at: DateTime<Utc>) -> Ticket {
        run(&sample_ticket(), Command::Resolve { comment: None }, &hr(), at)
            .unwrap()
            .ticket
    }

    fn reopen_cmd() -> Command {
        Command::Reopen {
            reason: "balance still wrong".to_string(),
        }
    }

    #[test]
    fn resolve_then_confirm_closes() {
        let resolved = resolved_at(t0());
        assert_eq!(resolved.status, Status::Resolved);
        assert_eq!(resolved.resolved_at, Some(t0()));
        assert_eq!(
            resolved.resolution.reopen_deadline,
            Some(t0() + TimeDelta::days(3))
        );

        let closed = run(&resolved, Command::Confirm, &employee(), t0()).unwrap();
        assert_eq!(closed.ticket.status, Status::Closed);
        assert!(closed.ticket.resolution.employee_confirmed);
    }

    #[test]
    fn second_confirm_is_not_resolved() {
        let resolved = resolved_at(t0());
        let closed = run(&resolved, Command::Confirm, &employee(), t0())
            .unwrap()
            .ticket;
        assert_eq!(
            run(&closed, Command::Confirm, &employee(), t0()).unwrap_err(),
            Rejection::NotResolved
        );
    }

    #[test]
    fn resolve_requires_hr() {
        let err = run(&sample_ticket(), Command::Resolve { comment: None }, &employee(), t0())
            .unwrap_err();
        assert!(matches!(
            err,
            Rejection::WrongActorRole {
                required: ActorRequirement::HrStaff,
                role: Role::Employee
            }
        ));
    }

    #[test]
    fn confirm_and_reopen_require_non_hr_creator() {
        let resolved = resolved_at(t0());
        let stranger = actor("emp-zed", Role::Employee);
        for who in [hr(), stranger] {
            assert!(matches!(
                run(&resolved, Command::Confirm, &who, t0()),
                Err(Rejection::WrongActorRole { .. })
            ));
            assert!(matches!(
                run(&resolved, reopen_cmd(), &who, t0()),
                Err(Rejection::WrongActorRole { .. })
            ));
        }
    }

    #[test]
    fn reopen_deadline_boundary() {
        let resolved = resolved_at(t0());
        let deadline = t0() + TimeDelta::days(3);

        let late = run(&resolved, reopen_cmd(), &employee(), deadline + TimeDelta::seconds(1));
        assert_eq!(late.unwrap_err(), Rejection::DeadlinePassed { deadline });

        let on_time = run(&resolved, reopen_cmd(), &employee(), deadline - TimeDelta::seconds(1))
            .unwrap();
        assert_eq!(on_time.ticket.status, Status::Reopened);
        assert_eq!(on_time.ticket.resolution.reopen_count, 1);
        assert_eq!(on_time.ticket.resolution.reopen_deadline, None);
    }

    #[test]
    fn legacy_tickets_derive_deadline_from_resolution() {
        let mut legacy = resolved_at(t0());
        legacy.resolution.reopen_deadline = None;
        let policy = LifecyclePolicy::default();
        assert_eq!(
            effective_reopen_deadline(&legacy, &policy),
            Some(t0() + TimeDelta::days(3))
        );
        assert!(matches!(
            run(&legacy, reopen_cmd(), &employee(), t0() + TimeDelta::days(4)),
            Err(Rejection::DeadlinePassed { .. })
        ));
        // Deriving the deadline leaves the stored record untouched.
        assert_eq!(legacy.resolution.reopen_deadline, None);
    }

    #[test]
    fn reopen_limit_is_enforced() {
        let mut ticket = sample_ticket();
        let mut now = t0();
        for round in 1..=3 {
            ticket = run(&ticket, Command::Resolve { comment: None }, &hr(), now)
                .unwrap()
                .ticket;
            now += TimeDelta::hours(1);
            ticket = run(&ticket, reopen_cmd(), &employee(), now).unwrap().ticket;
            assert_eq!(ticket.resolution.reopen_count, round);
        }
        ticket = run(&ticket, Command::Resolve { comment: None }, &hr(), now)
            .unwrap()
            .ticket;
        assert_eq!(
            run(&ticket, reopen_cmd(), &employee(), now).unwrap_err(),
            Rejection::ReopenLimitExceeded { count: 3, max: 3 }
        );
    }

    #[test]
    fn reopen_requires_reason() {
        let resolved = resolved_at(t0());
        let cmd = Command::Reopen {
            reason: "   ".to_string(),
        };
        assert_eq!(
            run(&resolved, cmd, &employee(), t0()).unwrap_err(),
            Rejection::ReasonRequired
        );
    }

    #[test]
    fn reopen_of_open_ticket_is_not_resolved() {
        assert_eq!(
            run(&sample_ticket(), reopen_cmd(), &employee(), t0()).unwrap_err(),
            Rejection::NotResolved
        );
    }

    #[test]
    fn reopen_routes_back_to_original_assignee() {
        let mut resolved = resolved_at(t0());
        resolved.assigned_to = AssigneeRef::present(ActorId::new_unchecked("hr-temp"));
        let out = run(&resolved, reopen_cmd(), &employee(), t0()).unwrap();
        assert_eq!(out.ticket.assigned_to, AssigneeRef::present(hr().id));
        assert_eq!(out.workload.charge, Some(hr().id));
        assert_eq!(out.workload.release, None);
    }

    #[test]
    fn reopen_uses_supplied_assignee() {
        let resolved = resolved_at(t0());
        let fallback = ActorId::new_unchecked("hr-mina");
        let policy = LifecyclePolicy::default();
        let who = employee();
        let ctx = Context {
            actor: &who,
            now: t0(),
            policy: &policy,
            reopen_assignee: Some(&fallback),
        };
        let out = apply(&resolved, &reopen_cmd(), &ctx).unwrap();
        assert_eq!(out.ticket.assigned_to, AssigneeRef::present(fallback));
    }

    #[test]
    fn permanent_closure_blocks_everything() {
        let closed = run(
            &sample_ticket(),
            Command::ClosePermanently { reason: None },
            &hr(),
            t0(),
        )
        .unwrap()
        .ticket;
        assert!(closed.is_terminal());
        assert_eq!(closed.status, Status::Closed);
        assert!(closed.resolved_at.is_some());

        let attempts = [
            (Command::SetStatus { to: Status::Open, reason: None }, hr()),
            (Command::Escalate { reason: "x".to_string() }, employee()),
            (Command::Resolve { comment: None }, hr()),
            (Command::Confirm, employee()),
            (reopen_cmd(), employee()),
            (Command::ClosePermanently { reason: None }, hr()),
            (Command::Reassign { to: ActorId::new_unchecked("hr-mina") }, hr()),
        ];
        for (command, who) in attempts {
            assert_eq!(
                run(&closed, command.clone(), &who, t0()).unwrap_err(),
                Rejection::PermanentlyClosed,
                "{} slipped through",
                command.name()
            );
        }
    }

    #[test]
    fn escalate_increments_level_and_keeps_assignee() {
        let out = run(
            &sample_ticket(),
            Command::Escalate { reason: "no reply for a week".to_string() },
            &employee(),
            t0(),
        )
        .unwrap();
        assert_eq!(out.ticket.status, Status::Escalated);
        assert_eq!(out.ticket.escalation_level, 1);
        assert_eq!(out.ticket.assigned_to, sample_ticket().assigned_to);
        assert!(out.workload.is_empty());
        assert!(out.messages[0].body.contains("no reply for a week"));
    }

    #[test]
    fn escalate_resolved_is_already_terminal() {
        let resolved = resolved_at(t0());
        assert_eq!(
            run(&resolved, Command::Escalate { reason: "x".to_string() }, &employee(), t0())
                .unwrap_err(),
            Rejection::AlreadyTerminal
        );
    }

    #[test]
    fn set_status_is_permissive_from_open_states() {
        for to in [Status::InProgress, Status::Pending, Status::Resolved, Status::Closed, Status::Reopened] {
            let out = run(
                &sample_ticket(),
                Command::SetStatus { to, reason: None },
                &hr(),
                t0(),
            )
            .unwrap();
            assert_eq!(out.ticket.status, to);
            if matches!(to, Status::Resolved | Status::Closed) {
                assert_eq!(out.ticket.resolved_at, Some(t0()));
                assert_eq!(out.workload.release, Some(hr().id));
            }
        }
    }

    #[test]
    fn set_status_rejections() {
        let open = sample_ticket();
        for to in [Status::Open, Status::Escalated] {
            assert_eq!(
                run(&open, Command::SetStatus { to, reason: None }, &hr(), t0()).unwrap_err(),
                Rejection::InvalidTransition { to: Some(to) }
            );
        }
        let resolved = resolved_at(t0());
        assert!(matches!(
            run(&resolved, Command::SetStatus { to: Status::Open, reason: None }, &hr(), t0()),
            Err(Rejection::InvalidTransition { .. })
        ));
        let stranger = actor("emp-zed", Role::Employee);
        assert!(matches!(
            run(&open, Command::SetStatus { to: Status::Pending, reason: None }, &stranger, t0()),
            Err(Rejection::WrongActorRole { .. })
        ));
    }

    #[test]
    fn first_hr_action_sets_responded_at() {
        let later = t0() + TimeDelta::hours(2);
        let by_employee = run(
            &sample_ticket(),
            Command::SetStatus { to: Status::Pending, reason: None },
            &employee(),
            later,
        )
        .unwrap();
        assert_eq!(by_employee.ticket.responded_at, None);

        let by_hr = run(&by_employee.ticket, Command::SetStatus { to: Status::InProgress, reason: None }, &hr(), later)
            .unwrap();
        assert_eq!(by_hr.ticket.responded_at, Some(later));
        assert_eq!(by_hr.ticket.updated_at, later);
    }

    #[test]
    fn reassign_transfers_workload() {
        let target = ActorId::new_unchecked("hr-mina");
        let out = run(
            &sample_ticket(),
            Command::Reassign { to: target.clone() },
            &hr(),
            t0(),
        )
        .unwrap();
        assert_eq!(out.workload.release, Some(hr().id));
        assert_eq!(out.workload.charge, Some(target));
        assert!(out.ticket.is_manually_assigned);

        assert_eq!(
            run(&sample_ticket(), Command::Reassign { to: hr().id }, &hr(), t0()).unwrap_err(),
            Rejection::InvalidTransition { to: None }
        );
    }

    #[test]
    fn resolution_never_predates_stale_deadline() {
        let mut ticket = sample_ticket();
        ticket.resolution.reopen_deadline = Some(t0() - TimeDelta::days(10));
        let out = run(&ticket, Command::Resolve { comment: None }, &hr(), t0()).unwrap();
        let deadline = out.ticket.resolution.reopen_deadline.unwrap();
        assert!(deadline >= out.ticket.resolved_at.unwrap());
    }
}
