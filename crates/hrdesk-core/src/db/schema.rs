//! Canonical SQLite schema for the ticket store.
//!
//! - `actors` mirrors the external user store: id, role, active flag
//! - `tickets` holds one row per ticket with its full lifecycle state and a
//!   `version` column used for optimistic concurrency
//! - `ticket_messages` is the append-only conversation log
//! - `workload` holds per-actor open-ticket counters, written in the same
//!   transaction as the ticket change that moves them
//! - `store_meta` tracks schema version and the ticket id sequence

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS actors (
    actor_id TEXT PRIMARY KEY CHECK (length(trim(actor_id)) > 0),
    name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN (
        'employee', 'team_lead', 'hr_executive', 'hr_manager',
        'hr_business_partner', 'talent_acquisition', 'hr_operations'
    )),
    active INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1)),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    subcategory TEXT,
    priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high', 'critical')),
    description TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN (
        'open', 'in_progress', 'pending', 'resolved', 'closed', 'escalated', 'reopened'
    )),
    escalation_level INTEGER NOT NULL DEFAULT 0 CHECK (escalation_level >= 0),
    created_by TEXT NOT NULL REFERENCES actors(actor_id),
    assignee_id TEXT NOT NULL REFERENCES actors(actor_id),
    assignee_tombstoned INTEGER NOT NULL DEFAULT 0 CHECK (assignee_tombstoned IN (0, 1)),
    original_assignee_id TEXT NOT NULL REFERENCES actors(actor_id),
    is_manually_assigned INTEGER NOT NULL DEFAULT 0 CHECK (is_manually_assigned IN (0, 1)),
    is_confidential INTEGER NOT NULL DEFAULT 0 CHECK (is_confidential IN (0, 1)),
    employee_confirmed INTEGER NOT NULL DEFAULT 0 CHECK (employee_confirmed IN (0, 1)),
    permanently_closed INTEGER NOT NULL DEFAULT 0 CHECK (permanently_closed IN (0, 1)),
    reopen_deadline_us INTEGER,
    reopen_count INTEGER NOT NULL DEFAULT 0 CHECK (reopen_count >= 0),
    max_reopen_allowed INTEGER NOT NULL DEFAULT 3 CHECK (max_reopen_allowed >= 0),
    created_at_us INTEGER NOT NULL,
    resolved_at_us INTEGER,
    responded_at_us INTEGER,
    updated_at_us INTEGER NOT NULL,
    version INTEGER NOT NULL DEFAULT 1 CHECK (version >= 1),
    CHECK (ticket_id LIKE 'tk-%'),
    CHECK (reopen_count <= max_reopen_allowed),
    CHECK (status NOT IN ('resolved', 'closed') OR resolved_at_us IS NOT NULL),
    CHECK (reopen_deadline_us IS NULL OR resolved_at_us IS NULL
           OR reopen_deadline_us >= resolved_at_us),
    CHECK (permanently_closed = 0 OR status = 'closed')
);

CREATE TABLE IF NOT EXISTS ticket_messages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id),
    author_id TEXT REFERENCES actors(actor_id),
    body TEXT NOT NULL CHECK (length(trim(body)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS workload (
    actor_id TEXT PRIMARY KEY REFERENCES actors(actor_id),
    open_tickets INTEGER NOT NULL DEFAULT 0 CHECK (open_tickets >= 0)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    ticket_seq INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, ticket_seq) VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes and append-only guards on the log.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_tickets_assignee_status
    ON tickets(assignee_id, assignee_tombstoned, status);

CREATE INDEX IF NOT EXISTS idx_tickets_creator_updated
    ON tickets(created_by, updated_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_tickets_status_updated
    ON tickets(status, updated_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_ticket_messages_ticket_seq
    ON ticket_messages(ticket_id, seq);

CREATE INDEX IF NOT EXISTS idx_actors_role_active
    ON actors(role, active, actor_id);

CREATE TRIGGER IF NOT EXISTS ticket_messages_no_update
BEFORE UPDATE ON ticket_messages
BEGIN
    SELECT RAISE(ABORT, 'ticket_messages is append-only');
END;

CREATE TRIGGER IF NOT EXISTS ticket_messages_no_delete
BEFORE DELETE ON ticket_messages
BEGIN
    SELECT RAISE(ABORT, 'ticket_messages is append-only');
END;

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by routing and listing query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tickets_assignee_status",
    "idx_tickets_creator_updated",
    "idx_tickets_status_updated",
    "idx_ticket_messages_ticket_seq",
    "idx_actors_role_active",
];
