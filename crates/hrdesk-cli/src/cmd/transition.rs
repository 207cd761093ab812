//! Lifecycle commands: `status`, `resolve`, `confirm`, `reopen`, `escalate`,
//! `close`, and `assign`.
//!
//! Each maps onto one [`Command`] and goes through [`Desk::transition`], so
//! `--expect-version` works the same way everywhere.
//!
//! [`Desk::transition`]: hrdesk_core::Desk::transition

use crate::actor;
use crate::cmd::show::{TicketView, write_ticket_row};
use crate::output::{OutputMode, render_mode};
use clap::Args;
use hrdesk_core::lifecycle::Command;
use hrdesk_core::model::actor::ActorId;
use hrdesk_core::model::ticket::Status;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct Target {
    pub id: String,

    /// Fail instead of retrying if the ticket is no longer at this version.
    #[arg(long, value_name = "VERSION")]
    pub expect_version: Option<u64>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: Target,

    /// open, in_progress, pending, resolved, closed, reopened.
    pub status: String,

    #[arg(short, long)]
    pub reason: Option<String>,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub target: Target,

    /// Resolution note for the creator.
    #[arg(short, long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    #[command(flatten)]
    pub target: Target,
}

#[derive(Args, Debug)]
pub struct ReopenArgs {
    #[command(flatten)]
    pub target: Target,

    #[arg(short, long)]
    pub reason: String,
}

#[derive(Args, Debug)]
pub struct EscalateArgs {
    #[command(flatten)]
    pub target: Target,

    #[arg(short, long)]
    pub reason: String,
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    #[command(flatten)]
    pub target: Target,

    #[arg(short, long)]
    pub reason: Option<String>,
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    #[command(flatten)]
    pub target: Target,

    /// HR actor to take the ticket over.
    pub to: String,
}

/// A parsed lifecycle request ready for the desk.
#[derive(Debug)]
pub struct Request<'a> {
    pub target: &'a Target,
    pub command: Command,
}

impl StatusArgs {
    pub fn request(&self) -> anyhow::Result<Request<'_>> {
        Ok(Request {
            target: &self.target,
            command: Command::SetStatus {
                to: self.status.parse::<Status>()?,
                reason: self.reason.clone(),
            },
        })
    }
}

impl ResolveArgs {
    pub fn request(&self) -> Request<'_> {
        Request {
            target: &self.target,
            command: Command::Resolve {
                comment: self.comment.clone(),
            },
        }
    }
}

impl ConfirmArgs {
    pub const fn request(&self) -> Request<'_> {
        Request {
            target: &self.target,
            command: Command::Confirm,
        }
    }
}

impl ReopenArgs {
    pub fn request(&self) -> Request<'_> {
        Request {
            target: &self.target,
            command: Command::Reopen {
                reason: self.reason.clone(),
            },
        }
    }
}

impl EscalateArgs {
    pub fn request(&self) -> Request<'_> {
        Request {
            target: &self.target,
            command: Command::Escalate {
                reason: self.reason.clone(),
            },
        }
    }
}

impl CloseArgs {
    pub fn request(&self) -> Request<'_> {
        Request {
            target: &self.target,
            command: Command::ClosePermanently {
                reason: self.reason.clone(),
            },
        }
    }
}

impl AssignArgs {
    pub fn request(&self) -> anyhow::Result<Request<'_>> {
        Ok(Request {
            target: &self.target,
            command: Command::Reassign {
                to: ActorId::parse(&self.to)?,
            },
        })
    }
}

pub fn run_transition(
    request: Request<'_>,
    actor_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let actor = actor::require_actor(actor_flag)?;
    let mut desk = super::open_desk(project_root)?;
    let id = super::parse_ticket_id(&request.target.id)?;
    let name = request.command.name();
    let ticket = desk.transition(&id, &actor, request.command, request.target.expect_version)?;
    let view = TicketView {
        effective_reopen_deadline: desk.effective_reopen_deadline(&ticket),
        ticket: &ticket,
        thread: None,
    };
    render_mode(
        output,
        &view,
        |v, w| write_ticket_row(w, v.ticket),
        |v, w| {
            let t = v.ticket;
            writeln!(
                w,
                "✓ {name}: {} is {} (assigned to {}, v{})",
                t.id, t.status, t.assigned_to, t.version
            )
        },
    )
}
