//! `hd workload`: open-ticket counts per HR actor, with drift checks.

use crate::output::{OutputMode, pretty_rule, render, render_mode};
use clap::Args;
use hrdesk_core::model::actor::Role;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct WorkloadArgs {
    /// Only show these roles (repeatable). Defaults to every routable role.
    #[arg(short, long)]
    pub role: Vec<String>,

    /// Compare counters against a recount of the tickets.
    #[arg(long, conflicts_with = "rebuild")]
    pub verify: bool,

    /// Rewrite counters from a recount of the tickets.
    #[arg(long)]
    pub rebuild: bool,
}

#[derive(Debug, Serialize)]
struct RebuildOutput {
    counters: usize,
}

pub fn run_workload(
    args: &WorkloadArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let mut desk = super::open_desk(project_root)?;

    if args.rebuild {
        let counters = desk.rebuild_workload()?;
        return render(output, &RebuildOutput { counters }, |r, w| {
            writeln!(w, "✓ rebuilt {} workload counters", r.counters)
        });
    }

    if args.verify {
        let drift = desk.verify_workload()?;
        render(output, &drift, |drift, w| {
            if drift.is_empty() {
                return writeln!(w, "✓ workload counters match the tickets");
            }
            for row in drift {
                writeln!(
                    w,
                    "drift: {} recorded {} actual {}",
                    row.actor_id, row.recorded, row.actual
                )?;
            }
            Ok(())
        })?;
        if !drift.is_empty() {
            anyhow::bail!(
                "{} workload counters out of sync; run `hd workload --rebuild`",
                drift.len()
            );
        }
        return Ok(());
    }

    let roles = args
        .role
        .iter()
        .map(|r| r.parse::<Role>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    let rows = desk.get_workload(&roles)?;
    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(w, "{}\t{}\t{}", row.actor_id, row.role, row.open_ticket_count)?;
            }
            Ok(())
        },
        |rows, w| {
            writeln!(w, "{:<20} {:<22} OPEN", "ACTOR", "ROLE")?;
            pretty_rule(w)?;
            for row in rows {
                writeln!(
                    w,
                    "{:<20} {:<22} {}",
                    row.actor_id.as_str(),
                    row.role.as_str(),
                    row.open_ticket_count
                )?;
            }
            Ok(())
        },
    )
}
