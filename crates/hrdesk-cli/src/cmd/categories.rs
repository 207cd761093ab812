//! `hd categories`: the category catalog and who it routes to.

use crate::output::{OutputMode, pretty_rule, render_mode};
use hrdesk_core::model::actor::Role;
use hrdesk_core::routing::RoutingTable;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct CategoryRow {
    key: &'static str,
    label: &'static str,
    roles: Vec<Role>,
    confidential: bool,
}

fn rows(routing: &RoutingTable) -> Vec<CategoryRow> {
    routing
        .iter()
        .map(|(category, entry)| CategoryRow {
            key: category.key(),
            label: category.label(),
            roles: entry.roles.iter().copied().collect(),
            confidential: entry.confidential,
        })
        .collect()
}

fn role_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn run_categories(output: OutputMode) -> anyhow::Result<()> {
    let rows = rows(&RoutingTable::standard());
    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(w, "{}\t{}\t{}", row.key, role_list(&row.roles), row.confidential)?;
            }
            Ok(())
        },
        |rows, w| {
            writeln!(w, "{:<24} {:<36} ROUTED TO", "KEY", "CATEGORY")?;
            pretty_rule(w)?;
            for row in rows {
                let lock = if row.confidential { " (confidential)" } else { "" };
                writeln!(
                    w,
                    "{:<24} {:<36} {}{lock}",
                    row.key,
                    row.label,
                    role_list(&row.roles)
                )?;
            }
            Ok(())
        },
    )
}
