//! `hd show`: full details for one ticket.

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use chrono::{DateTime, Utc};
use clap::Args;
use hrdesk_core::model::message::Message;
use hrdesk_core::model::ticket::Ticket;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: String,

    /// Include the conversation thread.
    #[arg(long)]
    pub thread: bool,
}

/// A ticket plus the values derived from it on read.
#[derive(Debug, Serialize)]
pub struct TicketView<'a> {
    #[serde(flatten)]
    pub ticket: &'a Ticket,
    pub effective_reopen_deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<&'a [Message]>,
}

fn stamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// One tab-separated row: id, status, category, priority, assignee, version.
pub fn write_ticket_row(w: &mut dyn Write, ticket: &Ticket) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\tv{}",
        ticket.id,
        ticket.status,
        ticket.category.key(),
        ticket.priority,
        ticket.assigned_to,
        ticket.version
    )
}

pub fn write_ticket_pretty(w: &mut dyn Write, view: &TicketView<'_>) -> io::Result<()> {
    let t = view.ticket;
    pretty_section(w, &format!("{}  [{}]", t.id, t.status))?;
    pretty_kv(w, "Category", t.category.label())?;
    if let Some(sub) = &t.subcategory {
        pretty_kv(w, "Subcategory", sub)?;
    }
    pretty_kv(w, "Priority", t.priority.as_str())?;
    pretty_kv(w, "Created by", t.created_by.as_str())?;
    let how = if t.is_manually_assigned { "manual" } else { "workload" };
    pretty_kv(w, "Assigned to", format!("{} ({how})", t.assigned_to))?;
    if t.is_confidential {
        pretty_kv(w, "Visibility", "confidential")?;
    }
    if t.escalation_level > 0 {
        pretty_kv(w, "Escalation", format!("level {}", t.escalation_level))?;
    }
    pretty_kv(w, "Created", stamp(Some(t.created_at)))?;
    pretty_kv(w, "Responded", stamp(t.responded_at))?;
    pretty_kv(w, "Resolved", stamp(t.resolved_at))?;
    let res = &t.resolution;
    pretty_kv(
        w,
        "Reopens",
        format!("{} of {}", res.reopen_count, res.max_reopen_allowed),
    )?;
    if view.ticket.resolved_at.is_some() {
        pretty_kv(w, "Reopen until", stamp(view.effective_reopen_deadline))?;
    }
    if res.permanently_closed_by_hr {
        pretty_kv(w, "Closed", "permanently, by HR")?;
    } else if res.employee_confirmed {
        pretty_kv(w, "Closed", "confirmed by creator")?;
    }
    pretty_kv(w, "Version", t.version.to_string())?;
    writeln!(w)?;
    writeln!(w, "{}", t.description)?;
    if let Some(thread) = view.thread {
        writeln!(w)?;
        super::comment::write_thread_pretty(w, thread)?;
    }
    Ok(())
}

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let desk = super::open_desk(project_root)?;
    let id = super::parse_ticket_id(&args.id)?;
    let ticket = desk.get_ticket(&id)?;
    let thread = if args.thread {
        Some(desk.conversation(&id)?)
    } else {
        None
    };
    let view = TicketView {
        effective_reopen_deadline: desk.effective_reopen_deadline(&ticket),
        ticket: &ticket,
        thread: thread.as_deref(),
    };
    render_mode(
        output,
        &view,
        |v, w| {
            write_ticket_row(w, v.ticket)?;
            if let Some(thread) = v.thread {
                super::comment::write_thread_rows(w, thread)?;
            }
            Ok(())
        },
        |v, w| write_ticket_pretty(w, v),
    )
}
