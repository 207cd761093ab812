//! `hd create`: open a ticket on behalf of the acting employee.

use crate::actor;
use crate::cmd::show::{TicketView, write_ticket_row};
use crate::output::{OutputMode, render_mode};
use clap::Args;
use hrdesk_core::NewTicket;
use hrdesk_core::model::actor::ActorId;
use hrdesk_core::model::category::Category;
use hrdesk_core::model::ticket::Priority;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// What the problem is.
    pub description: String,

    /// Category key or label, e.g. `payroll_salary` or "Payroll / Salary Issue".
    #[arg(short, long)]
    pub category: String,

    #[arg(long)]
    pub subcategory: Option<String>,

    /// low, medium, high, critical.
    #[arg(short, long, default_value = "medium")]
    pub priority: String,

    /// Assign directly instead of routing by workload.
    #[arg(long)]
    pub assignee: Option<String>,
}

impl CreateArgs {
    fn to_request(&self, created_by: ActorId) -> anyhow::Result<NewTicket> {
        let category: Category = self.category.parse()?;
        let mut request = NewTicket::new(category, created_by, self.description.clone());
        request.priority = self.priority.parse::<Priority>()?;
        request.subcategory = self
            .subcategory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        request.assignee = self.assignee.as_deref().map(ActorId::parse).transpose()?;
        Ok(request)
    }
}

pub fn run_create(
    args: &CreateArgs,
    actor_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let creator = actor::require_actor(actor_flag)?;
    let request = args.to_request(creator)?;
    let mut desk = super::open_desk(project_root)?;
    let ticket = desk.create_ticket(request)?;
    let view = TicketView {
        effective_reopen_deadline: None,
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
                "✓ {} opened in {} and assigned to {}",
                t.id,
                t.category.label(),
                t.assigned_to
            )
        },
    )
}
