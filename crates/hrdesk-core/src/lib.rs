//! hrdesk-core library.
//!
//! HR helpdesk engine: category routing, workload-balanced assignment, the
//! ticket lifecycle state machine, and the SQLite store behind them.
//! [`desk::Desk`] is the entry point for every operation.
//!
//! # Conventions
//!
//! - **Errors**: Library operations return `Result<T, DeskError>`; opening a
//!   store or loading config returns `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).
//! - **Time**: Stored as integer microseconds, exposed as `DateTime<Utc>`.

pub mod assignment;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod db;
pub mod desk;
pub mod error;
pub mod escalation;
pub mod lifecycle;
pub mod model;
pub mod routing;
pub mod workload;

#[cfg(test)]
mod testing;

pub use desk::{Desk, NewTicket, TicketFilter};
pub use error::DeskError;
