//! `hd list`: list tickets with filtering.

use crate::cmd::show::write_ticket_row;
use crate::output::{OutputMode, pretty_rule, render_mode};
use clap::Args;
use hrdesk_core::TicketFilter;
use hrdesk_core::model::actor::ActorId;
use hrdesk_core::model::category::Category;
use hrdesk_core::model::ticket::Status;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// open, in_progress, pending, resolved, closed, escalated, reopened.
    #[arg(short, long)]
    pub status: Option<String>,

    #[arg(short, long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub created_by: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    /// Maximum tickets to show.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: u32,
}

impl ListArgs {
    fn to_filter(&self) -> anyhow::Result<TicketFilter> {
        Ok(TicketFilter {
            status: self.status.as_deref().map(str::parse::<Status>).transpose()?,
            assignee: self.assignee.as_deref().map(ActorId::parse).transpose()?,
            created_by: self.created_by.as_deref().map(ActorId::parse).transpose()?,
            category: self
                .category
                .as_deref()
                .map(str::parse::<Category>)
                .transpose()?,
            limit: Some(self.limit),
        })
    }
}

pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let filter = args.to_filter()?;
    let desk = super::open_desk(project_root)?;
    let tickets = desk.list_tickets(&filter)?;
    render_mode(
        output,
        &tickets,
        |tickets, w| {
            for t in tickets {
                write_ticket_row(w, t)?;
            }
            Ok(())
        },
        |tickets, w| {
            if tickets.is_empty() {
                return writeln!(w, "No tickets found.");
            }
            writeln!(
                w,
                "{:<14} {:<12} {:<24} {:<9} ASSIGNEE",
                "ID", "STATUS", "CATEGORY", "PRIORITY"
            )?;
            pretty_rule(w)?;
            for t in tickets {
                writeln!(
                    w,
                    "{:<14} {:<12} {:<24} {:<9} {}",
                    t.id.as_str(),
                    t.status.as_str(),
                    t.category.key(),
                    t.priority.as_str(),
                    t.assigned_to
                )?;
            }
            Ok(())
        },
    )
}
