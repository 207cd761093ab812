//! Shared fixtures for unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::actor::{Actor, ActorId, Role};
use crate::model::category::Category;
use crate::model::ticket::{AssigneeRef, Priority, ResolutionStatus, Status, Ticket, TicketId};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn actor(id: &str, role: Role) -> Actor {
    Actor::new(ActorId::new_unchecked(id), id, role)
}

pub fn employee() -> Actor {
    actor("emp-ana", Role::Employee)
}

pub fn hr() -> Actor {
    actor("hr-kofi", Role::HrExecutive)
}

/// An open leave ticket created by [`employee`] and assigned to [`hr`].
pub fn sample_ticket() -> Ticket {
    Ticket {
        id: TicketId::new_unchecked("tk-fixture01"),
        category: Category::LeaveIssue,
        subcategory: None,
        priority: Priority::Medium,
        description: "Leave balance shows zero after carry-over".to_string(),
        status: Status::Open,
        resolution: ResolutionStatus::default(),
        escalation_level: 0,
        created_by: employee().id,
        assigned_to: AssigneeRef::present(hr().id),
        original_assignee: hr().id,
        is_manually_assigned: false,
        is_confidential: false,
        created_at: t0(),
        resolved_at: None,
        responded_at: None,
        updated_at: t0(),
        version: 1,
    }
}
