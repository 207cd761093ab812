//! Append-only per-ticket message thread.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::db::{from_us, to_us};
use crate::error::DeskError;
use crate::model::actor::ActorId;
use crate::model::message::{Author, Message, NewMessage};
use crate::model::ticket::TicketId;

/// Message log operations over one connection or transaction.
#[derive(Debug, Clone, Copy)]
pub struct ConversationLog<'c> {
    conn: &'c Connection,
}

impl<'c> ConversationLog<'c> {
    #[must_use]
    pub const fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Append one entry and return it with its assigned sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidValue`] for a blank body, or
    /// [`DeskError::Store`] if the insert fails.
    pub fn append(
        &self,
        ticket_id: &TicketId,
        message: &NewMessage,
        at: DateTime<Utc>,
    ) -> Result<Message, DeskError> {
        let body = message.body.trim();
        if body.is_empty() {
            return Err(DeskError::InvalidValue {
                expected: "message body",
                got: message.body.clone(),
            });
        }
        let author_id = match &message.author {
            Author::Actor { id } => Some(id.as_str()),
            Author::System => None,
        };
        self.conn.execute(
            "INSERT INTO ticket_messages (ticket_id, author_id, body, created_at_us)
             VALUES (?1, ?2, ?3, ?4)",
            params![ticket_id.as_str(), author_id, body, to_us(at)],
        )?;
        Ok(Message {
            seq: self.conn.last_insert_rowid(),
            ticket_id: ticket_id.clone(),
            author: message.author.clone(),
            body: body.to_string(),
            created_at: at,
        })
    }

    /// Full thread for a ticket in append order.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Store`] on query failure.
    pub fn thread(&self, ticket_id: &TicketId) -> Result<Vec<Message>, DeskError> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, author_id, body, created_at_us
             FROM ticket_messages
             WHERE ticket_id = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map([ticket_id.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (seq, author_id, body, created_at_us) = row?;
            let author = author_id.map_or(Author::System, |id| Author::Actor {
                id: ActorId::new_unchecked(id),
            });
            messages.push(Message {
                seq,
                ticket_id: ticket_id.clone(),
                author,
                body,
                created_at: from_us("message created_at", created_at_us)?,
            });
        }
        Ok(messages)
    }
}
