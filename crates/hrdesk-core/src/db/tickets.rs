//! Ticket rows and the compare-and-swap write path.
//!
//! All reads return typed [`Ticket`]s. Writes after creation go through
//! [`update_ticket`], which only succeeds when the stored `version` still
//! matches what the caller read.

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use super::{from_us, opt_from_us, parse_stored, to_count, to_us};
use crate::error::DeskError;
use crate::model::actor::ActorId;
use crate::model::category::Category;
use crate::model::ticket::{AssigneeRef, ResolutionStatus, Status, Ticket, TicketId};

const TICKET_COLUMNS: &str = "ticket_id, category, subcategory, priority, description, status, \
     escalation_level, created_by, assignee_id, assignee_tombstoned, original_assignee_id, \
     is_manually_assigned, is_confidential, employee_confirmed, permanently_closed, \
     reopen_deadline_us, reopen_count, max_reopen_allowed, created_at_us, resolved_at_us, \
     responded_at_us, updated_at_us, version";

/// Filter for [`list_tickets`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<Status>,
    /// Live assignee; tombstoned assignments never match.
    pub assignee: Option<ActorId>,
    pub created_by: Option<ActorId>,
    pub category: Option<Category>,
    pub limit: Option<u32>,
}

/// Insert a freshly created ticket.
///
/// # Errors
///
/// Returns [`DeskError::Store`] if the insert fails.
pub fn insert_ticket(conn: &Connection, ticket: &Ticket) -> Result<(), DeskError> {
    let (assignee, tombstoned) = assignee_columns(&ticket.assigned_to);
    conn.execute(
        &format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
            )"
        ),
        params![
            ticket.id.as_str(),
            ticket.category.key(),
            ticket.subcategory,
            ticket.priority.as_str(),
            ticket.description,
            ticket.status.as_str(),
            ticket.escalation_level,
            ticket.created_by.as_str(),
            assignee,
            tombstoned,
            ticket.original_assignee.as_str(),
            ticket.is_manually_assigned,
            ticket.is_confidential,
            ticket.resolution.employee_confirmed,
            ticket.resolution.permanently_closed_by_hr,
            ticket.resolution.reopen_deadline.map(to_us),
            ticket.resolution.reopen_count,
            ticket.resolution.max_reopen_allowed,
            to_us(ticket.created_at),
            ticket.resolved_at.map(to_us),
            ticket.responded_at.map(to_us),
            to_us(ticket.updated_at),
            version_param(ticket.version)?,
        ],
    )?;
    Ok(())
}

/// Write `ticket` if the stored row is still at `expected_version`.
///
/// The stored version becomes `expected_version + 1`. Returns `false` when
/// another writer got there first; nothing is written in that case.
///
/// # Errors
///
/// Returns [`DeskError::Store`] if the update fails.
pub fn update_ticket(
    conn: &Connection,
    ticket: &Ticket,
    expected_version: u64,
) -> Result<bool, DeskError> {
    let (assignee, tombstoned) = assignee_columns(&ticket.assigned_to);
    let changed = conn.execute(
        "UPDATE tickets SET
            priority = ?3,
            status = ?4,
            escalation_level = ?5,
            assignee_id = ?6,
            assignee_tombstoned = ?7,
            is_manually_assigned = ?8,
            employee_confirmed = ?9,
            permanently_closed = ?10,
            reopen_deadline_us = ?11,
            reopen_count = ?12,
            resolved_at_us = ?13,
            responded_at_us = ?14,
            updated_at_us = ?15,
            version = version + 1
         WHERE ticket_id = ?1 AND version = ?2",
        params![
            ticket.id.as_str(),
            version_param(expected_version)?,
            ticket.priority.as_str(),
            ticket.status.as_str(),
            ticket.escalation_level,
            assignee,
            tombstoned,
            ticket.is_manually_assigned,
            ticket.resolution.employee_confirmed,
            ticket.resolution.permanently_closed_by_hr,
            ticket.resolution.reopen_deadline.map(to_us),
            ticket.resolution.reopen_count,
            ticket.resolved_at.map(to_us),
            ticket.responded_at.map(to_us),
            to_us(ticket.updated_at),
        ],
    )?;
    Ok(changed == 1)
}

/// Fetch one ticket by id.
///
/// # Errors
///
/// Returns [`DeskError::Store`] on query failure or
/// [`DeskError::CorruptRecord`] if a stored value is unreadable.
pub fn get_ticket(conn: &Connection, id: &TicketId) -> Result<Option<Ticket>, DeskError> {
    let row = conn
        .query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
            [id.as_str()],
            raw_ticket,
        )
        .optional()?;
    row.map(RawTicket::into_ticket).transpose()
}

/// Tickets matching `filter`, most recently updated first, ties by id.
///
/// # Errors
///
/// Returns [`DeskError::Store`] on query failure or
/// [`DeskError::CorruptRecord`] if a stored value is unreadable.
pub fn list_tickets(conn: &Connection, filter: &TicketFilter) -> Result<Vec<Ticket>, DeskError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_values: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        param_values.push(status.as_str().to_string());
        conditions.push(format!("status = ?{}", param_values.len()));
    }

    if let Some(ref assignee) = filter.assignee {
        param_values.push(assignee.as_str().to_string());
        conditions.push(format!(
            "assignee_id = ?{} AND assignee_tombstoned = 0",
            param_values.len()
        ));
    }

    if let Some(ref creator) = filter.created_by {
        param_values.push(creator.as_str().to_string());
        conditions.push(format!("created_by = ?{}", param_values.len()));
    }

    if let Some(category) = filter.category {
        param_values.push(category.key().to_string());
        conditions.push(format!("category = ?{}", param_values.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let limit_clause = filter
        .limit
        .map_or_else(String::new, |limit| format!(" LIMIT {limit}"));

    let sql = format!(
        "SELECT {TICKET_COLUMNS} FROM tickets{where_clause} \
         ORDER BY updated_at_us DESC, ticket_id ASC{limit_clause}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(param_values.iter()), raw_ticket)?;

    let mut tickets = Vec::new();
    for row in rows {
        tickets.push(row?.into_ticket()?);
    }
    Ok(tickets)
}

/// Next value of the store-wide ticket sequence, used to seed ids.
///
/// # Errors
///
/// Returns [`DeskError::Store`] if the counter cannot be advanced.
pub fn next_ticket_seq(conn: &Connection) -> Result<i64, DeskError> {
    conn.execute(
        "UPDATE store_meta SET ticket_seq = ticket_seq + 1 WHERE id = 1",
        [],
    )?;
    let seq = conn.query_row("SELECT ticket_seq FROM store_meta WHERE id = 1", [], |row| {
        row.get(0)
    })?;
    Ok(seq)
}

fn assignee_columns(assignee: &AssigneeRef) -> (&str, bool) {
    match assignee {
        AssigneeRef::Present { actor } => (actor.as_str(), false),
        AssigneeRef::Tombstone { former } => (former.as_str(), true),
    }
}

fn version_param(version: u64) -> Result<i64, DeskError> {
    i64::try_from(version).map_err(|_| DeskError::CorruptRecord {
        field: "ticket version",
        value: version.to_string(),
    })
}

struct RawTicket {
    id: String,
    category: String,
    subcategory: Option<String>,
    priority: String,
    description: String,
    status: String,
    escalation_level: i64,
    created_by: String,
    assignee: String,
    assignee_tombstoned: bool,
    original_assignee: String,
    is_manually_assigned: bool,
    is_confidential: bool,
    employee_confirmed: bool,
    permanently_closed: bool,
    reopen_deadline_us: Option<i64>,
    reopen_count: i64,
    max_reopen_allowed: i64,
    created_at_us: i64,
    resolved_at_us: Option<i64>,
    responded_at_us: Option<i64>,
    updated_at_us: i64,
    version: i64,
}

fn raw_ticket(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTicket> {
    Ok(RawTicket {
        id: row.get(0)?,
        category: row.get(1)?,
        subcategory: row.get(2)?,
        priority: row.get(3)?,
        description: row.get(4)?,
        status: row.get(5)?,
        escalation_level: row.get(6)?,
        created_by: row.get(7)?,
        assignee: row.get(8)?,
        assignee_tombstoned: row.get(9)?,
        original_assignee: row.get(10)?,
        is_manually_assigned: row.get(11)?,
        is_confidential: row.get(12)?,
        employee_confirmed: row.get(13)?,
        permanently_closed: row.get(14)?,
        reopen_deadline_us: row.get(15)?,
        reopen_count: row.get(16)?,
        max_reopen_allowed: row.get(17)?,
        created_at_us: row.get(18)?,
        resolved_at_us: row.get(19)?,
        responded_at_us: row.get(20)?,
        updated_at_us: row.get(21)?,
        version: row.get(22)?,
    })
}

impl RawTicket {
    fn into_ticket(self) -> Result<Ticket, DeskError> {
        let assignee = ActorId::new_unchecked(self.assignee);
        let assigned_to = if self.assignee_tombstoned {
            AssigneeRef::Tombstone { former: assignee }
        } else {
            AssigneeRef::present(assignee)
        };
        let version = u64::try_from(self.version).map_err(|_| DeskError::CorruptRecord {
            field: "ticket version",
            value: self.version.to_string(),
        })?;

        Ok(Ticket {
            id: TicketId::new_unchecked(self.id),
            category: parse_stored("ticket category", self.category)?,
            subcategory: self.subcategory,
            priority: parse_stored("ticket priority", self.priority)?,
            description: self.description,
            status: parse_stored("ticket status", self.status)?,
            resolution: ResolutionStatus {
                employee_confirmed: self.employee_confirmed,
                permanently_closed_by_hr: self.permanently_closed,
                reopen_deadline: opt_from_us("reopen_deadline", self.reopen_deadline_us)?,
                reopen_count: to_count("reopen_count", self.reopen_count)?,
                max_reopen_allowed: to_count("max_reopen_allowed", self.max_reopen_allowed)?,
            },
            escalation_level: to_count("escalation_level", self.escalation_level)?,
            created_by: ActorId::new_unchecked(self.created_by),
            assigned_to,
            original_assignee: ActorId::new_unchecked(self.original_assignee),
            is_manually_assigned: self.is_manually_assigned,
            is_confidential: self.is_confidential,
            created_at: from_us("created_at", self.created_at_us)?,
            resolved_at: opt_from_us("resolved_at", self.resolved_at_us)?,
            responded_at: opt_from_us("responded_at", self.responded_at_us)?,
            updated_at: from_us("updated_at", self.updated_at_us)?,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{TicketFilter, get_ticket, insert_ticket, list_tickets, next_ticket_seq, update_ticket};
    use crate::db::actors::upsert_actor;
    use crate::db::open_in_memory;
    use crate::model::category::Category;
    use crate::model::ticket::{AssigneeRef, Status, Ticket, TicketId};
    use crate::testing::{employee, hr, sample_ticket, t0};
    use chrono::TimeDelta;
    use rusqlite::Connection;

    fn seeded() -> Connection {
        let conn = open_in_memory().expect("store");
        upsert_actor(&conn, &employee(), t0()).expect("employee");
        upsert_actor(&conn, &hr(), t0()).expect("hr");
        conn
    }

    fn ticket(id: &str, minutes: i64) -> Ticket {
        let mut ticket = sample_ticket();
        ticket.id = TicketId::new_unchecked(id);
        ticket.updated_at = t0() + TimeDelta::minutes(minutes);
        ticket
    }

    #[test]
    fn insert_then_get_roundtrips_every_field() {
        let conn = seeded();
        let mut original = sample_ticket();
        original.subcategory = Some("carry-over".to_string());
        original.resolution.reopen_deadline = Some(t0() + TimeDelta::days(3));
        original.resolved_at = Some(t0());
        original.status = Status::Resolved;
        original.is_confidential = true;
        insert_ticket(&conn, &original).expect("insert");

        let loaded = get_ticket(&conn, &original.id).expect("query").expect("present");
        assert_eq!(loaded, original);
    }

    #[test]
    fn update_bumps_version_only_on_match() {
        let conn = seeded();
        let original = sample_ticket();
        insert_ticket(&conn, &original).expect("insert");

        let mut next = original.clone();
        next.status = Status::InProgress;
        assert!(update_ticket(&conn, &next, 1).expect("first write"));
        assert!(!update_ticket(&conn, &next, 1).expect("stale write"));

        let loaded = get_ticket(&conn, &original.id).expect("query").expect("present");
        assert_eq!(loaded.status, Status::InProgress);
        assert_eq!(loaded.version, 2);
    }

    #[test]
    fn tombstones_roundtrip() {
        let conn = seeded();
        let mut original = sample_ticket();
        original.assigned_to = AssigneeRef::Tombstone { former: hr().id };
        insert_ticket(&conn, &original).expect("insert");

        let loaded = get_ticket(&conn, &original.id).expect("query").expect("present");
        assert!(loaded.assigned_to.is_tombstone());

        let assigned = TicketFilter {
            assignee: Some(hr().id),
            ..TicketFilter::default()
        };
        assert!(list_tickets(&conn, &assigned).expect("list").is_empty());
    }

    #[test]
    fn list_orders_by_updated_then_id() {
        let conn = seeded();
        insert_ticket(&conn, &ticket("tk-b", 5)).expect("insert");
        insert_ticket(&conn, &ticket("tk-a", 5)).expect("insert");
        insert_ticket(&conn, &ticket("tk-c", 9)).expect("insert");

        let ids: Vec<String> = list_tickets(&conn, &TicketFilter::default())
            .expect("list")
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, ["tk-c", "tk-a", "tk-b"]);
    }

    #[test]
    fn list_filters_combine() {
        let conn = seeded();
        let mut payroll = ticket("tk-pay", 1);
        payroll.category = Category::PayrollSalary;
        insert_ticket(&conn, &payroll).expect("insert");
        let mut closed = ticket("tk-done", 2);
        closed.status = Status::Closed;
        closed.resolved_at = Some(t0());
        insert_ticket(&conn, &closed).expect("insert");

        let filter = TicketFilter {
            status: Some(Status::Open),
            category: Some(Category::PayrollSalary),
            created_by: Some(employee().id),
            ..TicketFilter::default()
        };
        let found = list_tickets(&conn, &filter).expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "tk-pay");

        let limited = TicketFilter {
            limit: Some(1),
            ..TicketFilter::default()
        };
        assert_eq!(list_tickets(&conn, &limited).expect("list").len(), 1);
    }

    #[test]
    fn ticket_sequence_is_monotonic() {
        let conn = seeded();
        let first = next_ticket_seq(&conn).expect("seq");
        let second = next_ticket_seq(&conn).expect("seq");
        assert_eq!(second, first + 1);
    }

    #[test]
    fn unreadable_status_is_corruption() {
        let conn = seeded();
        insert_ticket(&conn, &sample_ticket()).expect("insert");
        conn.execute_batch("PRAGMA ignore_check_constraints = ON; UPDATE tickets SET status = 'lost';")
            .expect("force bad status");

        let err = get_ticket(&conn, &sample_ticket().id).expect_err("corrupt row");
        assert!(err.to_string().contains("ticket status"));
    }
}
