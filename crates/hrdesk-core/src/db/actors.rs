//! Actor directory rows.
//!
//! Actors are deactivated, never deleted: tickets and messages keep
//! foreign keys to every actor that ever touched them.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::{parse_stored, to_us};
use crate::error::DeskError;
use crate::model::actor::{Actor, ActorId};

/// Insert `actor`, or refresh its name and role if it already exists.
///
/// The stored row is always active afterwards, whatever `actor.active`
/// says: re-registering reactivates, and deactivation only happens through
/// [`deactivate_actor`].
///
/// # Errors
///
/// Returns [`DeskError::Store`] if the write fails.
pub fn upsert_actor(conn: &Connection, actor: &Actor, now: DateTime<Utc>) -> Result<(), DeskError> {
    conn.execute(
        "INSERT INTO actors (actor_id, name, role, active, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, 1, ?4, ?4)
         ON CONFLICT(actor_id) DO UPDATE SET
            name = excluded.name,
            role = excluded.role,
            active = 1,
            updated_at_us = excluded.updated_at_us",
        params![actor.id.as_str(), actor.name, actor.role.as_str(), to_us(now)],
    )?;
    Ok(())
}

/// Fetch one actor, active or not.
///
/// # Errors
///
/// Returns [`DeskError::Store`] on query failure or
/// [`DeskError::CorruptRecord`] if the stored role is unreadable.
pub fn get_actor(conn: &Connection, id: &ActorId) -> Result<Option<Actor>, DeskError> {
    let row = conn
        .query_row(
            "SELECT actor_id, name, role, active FROM actors WHERE actor_id = ?1",
            [id.as_str()],
            raw_actor,
        )
        .optional()?;
    row.map(RawActor::into_actor).transpose()
}

/// Every known actor ordered by id.
///
/// # Errors
///
/// Returns [`DeskError::Store`] on query failure.
pub fn list_actors(conn: &Connection, include_inactive: bool) -> Result<Vec<Actor>, DeskError> {
    let mut stmt = conn.prepare(
        "SELECT actor_id, name, role, active FROM actors
         WHERE active = 1 OR ?1
         ORDER BY actor_id ASC",
    )?;
    let rows = stmt.query_map([include_inactive], raw_actor)?;
    let mut actors = Vec::new();
    for row in rows {
        actors.push(row?.into_actor()?);
    }
    Ok(actors)
}

/// Mark an actor inactive. Returns `false` if it was already inactive.
///
/// # Errors
///
/// Returns [`DeskError::Store`] if the write fails.
pub fn deactivate_actor(
    conn: &Connection,
    id: &ActorId,
    now: DateTime<Utc>,
) -> Result<bool, DeskError> {
    let changed = conn.execute(
        "UPDATE actors SET active = 0, updated_at_us = ?2
         WHERE actor_id = ?1 AND active = 1",
        params![id.as_str(), to_us(now)],
    )?;
    Ok(changed == 1)
}

struct RawActor {
    id: String,
    name: String,
    role: String,
    active: bool,
}

fn raw_actor(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawActor> {
    Ok(RawActor {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        active: row.get(3)?,
    })
}

impl RawActor {
    fn into_actor(self) -> Result<Actor, DeskError> {
        Ok(Actor {
            id: ActorId::new_unchecked(self.id),
            name: self.name,
            role: parse_stored("actor role", self.role)?,
            active: self.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{deactivate_actor, get_actor, list_actors, upsert_actor};
    use crate::db::open_in_memory;
    use crate::model::actor::Role;
    use crate::testing::{actor, employee, hr, t0};

    #[test]
    fn upsert_then_get() {
        let conn = open_in_memory().expect("store");
        upsert_actor(&conn, &hr(), t0()).expect("insert");

        let loaded = get_actor(&conn, &hr().id).expect("query").expect("present");
        assert_eq!(loaded, hr());
    }

    #[test]
    fn upsert_updates_role() {
        let conn = open_in_memory().expect("store");
        upsert_actor(&conn, &hr(), t0()).expect("insert");
        let promoted = actor("hr-kofi", Role::HrManager);
        upsert_actor(&conn, &promoted, t0()).expect("update");

        let loaded = get_actor(&conn, &hr().id).expect("query").expect("present");
        assert_eq!(loaded.role, Role::HrManager);
    }

    #[test]
    fn deactivation_is_soft() {
        let conn = open_in_memory().expect("store");
        upsert_actor(&conn, &hr(), t0()).expect("insert");
        upsert_actor(&conn, &employee(), t0()).expect("insert");

        assert!(deactivate_actor(&conn, &hr().id, t0()).expect("deactivate"));
        assert!(!deactivate_actor(&conn, &hr().id, t0()).expect("second deactivate"));

        let loaded = get_actor(&conn, &hr().id).expect("query").expect("row kept");
        assert!(!loaded.active);

        let active = list_actors(&conn, false).expect("list");
        assert_eq!(active, vec![employee()]);
        assert_eq!(list_actors(&conn, true).expect("list all").len(), 2);
    }

    #[test]
    fn upsert_never_deactivates() {
        let conn = open_in_memory().expect("store");
        upsert_actor(&conn, &hr(), t0()).expect("insert");
        let mut stale = hr();
        stale.active = false;
        upsert_actor(&conn, &stale, t0()).expect("update");
        assert!(get_actor(&conn, &hr().id).expect("query").expect("present").active);

        deactivate_actor(&conn, &hr().id, t0()).expect("deactivate");
        upsert_actor(&conn, &stale, t0()).expect("re-register");
        assert!(get_actor(&conn, &hr().id).expect("query").expect("present").active);
    }

    #[test]
    fn missing_actor_is_none() {
        let conn = open_in_memory().expect("store");
        assert!(get_actor(&conn, &hr().id).expect("query").is_none());
    }
}
