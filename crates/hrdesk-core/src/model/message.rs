use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::actor::ActorId;
use super::ticket::TicketId;

/// Who wrote a conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Author {
    Actor { id: ActorId },
    /// Entries generated by the lifecycle engine itself.
    System,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor { id } => write!(f, "{id}"),
            Self::System => f.write_str("system"),
        }
    }
}

/// One entry in a ticket's append-only thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub seq: i64,
    pub ticket_id: TicketId,
    pub author: Author,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A message waiting to be appended alongside a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub author: Author,
    pub body: String,
}

impl NewMessage {
    #[must_use]
    pub fn system(body: impl Into<String>) -> Self {
        Self {
            author: Author::System,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn from_actor(id: ActorId, body: impl Into<String>) -> Self {
        Self {
            author: Author::Actor { id },
            body: body.into(),
        }
    }
}
