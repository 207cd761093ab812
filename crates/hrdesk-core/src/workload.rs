//! Per-actor open-ticket counters.
//!
//! Counters live in the `workload` table and move in the same transaction
//! as the ticket write that changes who holds a ticket. [`WorkloadIndex::recount`]
//! derives the same numbers from `tickets` so drift can be detected and
//! repaired.

use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::db::{parse_stored, to_count};
use crate::error::DeskError;
use crate::lifecycle::WorkloadChange;
use crate::model::actor::{ActorId, Role};
use crate::model::ticket::Status;

/// One active actor's current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadSnapshot {
    pub actor_id: ActorId,
    pub role: Role,
    pub open_ticket_count: u32,
}

/// A counter that disagrees with the ticket table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadDrift {
    pub actor_id: ActorId,
    pub recorded: u32,
    pub actual: u32,
}

/// Counter operations over one connection or transaction.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadIndex<'c> {
    conn: &'c Connection,
}

impl<'c> WorkloadIndex<'c> {
    #[must_use]
    pub const fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Recorded open-ticket count for `actor`; zero when never charged.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] on query failure.
    pub fn count(&self, actor: &ActorId) -> Result<u32, DeskError> {
        let raw: i64 = self.conn.query_row(
            "SELECT COALESCE(
                (SELECT open_tickets FROM workload WHERE actor_id = ?1), 0
            )",
            [actor.as_str()],
            |row| row.get(0),
        )?;
        to_count("open_tickets", raw)
    }

    /// Charge one ticket to `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] if the write fails.
    pub fn increment(&self, actor: &ActorId) -> Result<(), DeskError> {
        self.conn.execute(
            "INSERT INTO workload (actor_id, open_tickets) VALUES (?1, 1)
             ON CONFLICT(actor_id) DO UPDATE SET open_tickets = open_tickets + 1",
            [actor.as_str()],
        )?;
        Ok(())
    }

    /// Release one ticket from `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::WorkloadUnderflow`] if the counter is already
    /// zero, or [`DeskError::Store`] if the write fails.
    pub fn decrement(&self, actor: &ActorId) -> Result<(), DeskError> {
        let changed = self.conn.execute(
            "UPDATE workload SET open_tickets = open_tickets - 1
             WHERE actor_id = ?1 AND open_tickets > 0",
            [actor.as_str()],
        )?;
        if changed == 0 {
            return Err(DeskError::WorkloadUnderflow(actor.clone()));
        }
        Ok(())
    }

    /// Apply a release/charge pair computed by a transition.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::increment`] and [`Self::decrement`] failures.
    pub fn apply(&self, change: &WorkloadChange) -> Result<(), DeskError> {
        if let Some(actor) = &change.release {
            self.decrement(actor)?;
        }
        if let Some(actor) = &change.charge {
            self.increment(actor)?;
        }
        Ok(())
    }

    /// Drop an actor's counter entirely.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] if the write fails.
    pub fn clear(&self, actor: &ActorId) -> Result<(), DeskError> {
        self.conn
            .execute("DELETE FROM workload WHERE actor_id = ?1", [actor.as_str()])?;
        Ok(())
    }

    /// Active actors holding any of `roles`, with their counts, ordered by id.
    ///
    /// Actors never charged a ticket report zero.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] on query failure.
    pub fn snapshot(&self, roles: &BTreeSet<Role>) -> Result<Vec<WorkloadSnapshot>, DeskError> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = numbered_placeholders(1, roles.len());
        let sql = format!(
            "SELECT a.actor_id, a.role, COALESCE(w.open_tickets, 0)
             FROM actors a
             LEFT JOIN workload w ON w.actor_id = a.actor_id
             WHERE a.active = 1 AND a.role IN ({placeholders})
             ORDER BY a.actor_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(roles.iter().map(|r| r.as_str())), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (actor_id, role, count) = row?;
            snapshots.push(WorkloadSnapshot {
                actor_id: ActorId::new_unchecked(actor_id),
                role: parse_stored("actor role", role)?,
                open_ticket_count: to_count("open_tickets", count)?,
            });
        }
        Ok(snapshots)
    }

    /// Count open tickets per active, live assignee straight from `tickets`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] on query failure.
    pub fn recount(&self) -> Result<BTreeMap<ActorId, u32>, DeskError> {
        let open: Vec<&str> = Status::ALL
            .iter()
            .filter(|status| status.counts_toward_workload())
            .map(|status| status.as_str())
            .collect();
        let sql = format!(
            "SELECT t.assignee_id, COUNT(*)
             FROM tickets t
             INNER JOIN actors a ON a.actor_id = t.assignee_id AND a.active = 1
             WHERE t.assignee_tombstoned = 0 AND t.status IN ({})
             GROUP BY t.assignee_id",
            numbered_placeholders(1, open.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(open), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (actor_id, count) = row?;
            counts.insert(
                ActorId::new_unchecked(actor_id),
                to_count("open_tickets", count)?,
            );
        }
        Ok(counts)
    }

    /// Every actor whose recorded counter disagrees with [`Self::recount`].
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] on query failure.
    pub fn drift(&self) -> Result<Vec<WorkloadDrift>, DeskError> {
        let actual = self.recount()?;
        let recorded = self.recorded()?;

        let actors: BTreeSet<&ActorId> = actual.keys().chain(recorded.keys()).collect();
        let drift = actors
            .into_iter()
            .filter_map(|actor_id| {
                let recorded = recorded.get(actor_id).copied().unwrap_or(0);
                let actual = actual.get(actor_id).copied().unwrap_or(0);
                (recorded != actual).then(|| WorkloadDrift {
                    actor_id: actor_id.clone(),
                    recorded,
                    actual,
                })
            })
            .collect();
        Ok(drift)
    }

    /// Replace every counter with the recounted value.
    ///
    /// Run inside a transaction; returns the number of counters written.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] if any write fails.
    pub fn rebuild(&self) -> Result<usize, DeskError> {
        let counts = self.recount()?;
        self.conn.execute("DELETE FROM workload", [])?;
        let mut stmt = self
            .conn
            .prepare("INSERT INTO workload (actor_id, open_tickets) VALUES (?1, ?2)")?;
        for (actor_id, count) in &counts {
            stmt.execute(params![actor_id.as_str(), count])?;
        }
        Ok(counts.len())
    }

    fn recorded(&self) -> Result<BTreeMap<ActorId, u32>, DeskError> {
        let mut stmt = self
            .conn
            .prepare("SELECT actor_id, open_tickets FROM workload")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = BTreeMap::new();
        for row in rows {
            let (actor_id, count) = row?;
            counts.insert(
                ActorId::new_unchecked(actor_id),
                to_count("open_tickets", count)?,
            );
        }
        Ok(counts)
    }
}

fn numbered_placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("?{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
