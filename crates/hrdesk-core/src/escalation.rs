//! When a ticket may be escalated and what escalation does to it.
//!
//! Escalation raises urgency only. Moving the ticket to a higher tier is an
//! explicit reassignment, so the assignee is never touched here.

use crate::model::ticket::{Status, Ticket};

#[derive(Debug, Clone, Copy, Default)]
pub struct EscalationPolicy;

impl EscalationPolicy {
    /// True unless the ticket is resolved or closed.
    #[must_use]
    pub const fn can_escalate(self, ticket: &Ticket) -> bool {
        !matches!(ticket.status, Status::Resolved | Status::Closed)
    }

    /// Level after one more escalation.
    #[must_use]
    pub const fn next_level(self, ticket: &Ticket) -> u32 {
        ticket.escalation_level.saturating_add(1)
    }
}
