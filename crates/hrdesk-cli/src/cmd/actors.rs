//! `hd actor`: manage the people the desk knows about.

use crate::output::{OutputMode, pretty_rule, render, render_mode};
use clap::{Args, Subcommand};
use hrdesk_core::model::actor::{Actor, ActorId, Role};
use std::io::Write;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum ActorCommand {
    /// Register an actor, or update the name and role of an existing one.
    Add(AddArgs),
    /// Deactivate an actor and orphan the tickets assigned to them.
    Remove(RemoveArgs),
    /// List registered actors.
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub id: String,

    /// Display name (defaults to the id).
    #[arg(long)]
    pub name: Option<String>,

    /// employee, team_lead, hr_executive, hr_manager, hr_business_partner,
    /// talent_acquisition, hr_operations.
    #[arg(long)]
    pub role: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include deactivated actors.
    #[arg(long)]
    pub all: bool,
}

pub fn run_actor(
    command: &ActorCommand,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut desk = super::open_desk(project_root)?;
    match command {
        ActorCommand::Add(args) => {
            let id = ActorId::parse(&args.id)?;
            let role: Role = args.role.parse()?;
            let name = args.name.clone().unwrap_or_else(|| id.to_string());
            let actor = Actor::new(id, name, role);
            desk.register_actor(&actor)?;
            render(output, &actor, |a, w| {
                writeln!(w, "✓ registered {} ({}) as {}", a.id, a.name, a.role)
            })
        }
        ActorCommand::Remove(args) => {
            let id = ActorId::parse(&args.id)?;
            let removal = desk.remove_actor(&id)?;
            render(output, &removal, |r, w| {
                writeln!(w, "✓ removed {}", r.actor)?;
                if !r.orphaned.is_empty() {
                    writeln!(w, "  awaiting reassignment:")?;
                    for ticket in &r.orphaned {
                        writeln!(w, "    {ticket}")?;
                    }
                }
                Ok(())
            })
        }
        ActorCommand::List(args) => {
            let actors = desk.list_actors(args.all)?;
            render_mode(
                output,
                &actors,
                |actors, w| {
                    for a in actors {
                        writeln!(w, "{}\t{}\t{}\t{}", a.id, a.role, a.active, a.name)?;
                    }
                    Ok(())
                },
                |actors, w| {
                    writeln!(w, "{:<20} {:<22} {:<8} NAME", "ID", "ROLE", "ACTIVE")?;
                    pretty_rule(w)?;
                    for a in actors {
                        let active = if a.active { "yes" } else { "no" };
                        writeln!(
                            w,
                            "{:<20} {:<22} {:<8} {}",
                            a.id.as_str(),
                            a.role.as_str(),
                            active,
                            a.name
                        )?;
                    }
                    Ok(())
                },
            )
        }
    }
}
