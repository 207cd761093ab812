use anyhow::{Context as _, Result};
use clap::Args;
use hrdesk_core::Desk;
use hrdesk_core::config::{DESK_DIR, STORE_FILE};
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` even if `.hrdesk/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[reopen]\n\
    # Hours after resolution during which the creator may reopen.\n\
    window_hours = 72\n\
    max_reopens = 3\n\
    \n\
    [store]\n\
    busy_timeout_ms = 5000\n";

const GITIGNORE: &str = "desk.db\ndesk.db-wal\ndesk.db-shm\n";

/// Execute `hd init`. Creates the workspace skeleton:
///
/// ```text
/// .hrdesk/
///   config.toml   (reopen policy, store settings)
///   desk.db       (ticket store, migrated to the latest schema)
///   .gitignore
/// ```
///
/// # Errors
///
/// Returns an error if `.hrdesk/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, project_root: &Path, quiet: bool) -> Result<()> {
    let desk_dir = project_root.join(DESK_DIR);

    if desk_dir.exists() && !args.force {
        anyhow::bail!("{DESK_DIR}/ already exists. Use `hd init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&desk_dir)
        .with_context(|| format!("Failed to create {}", desk_dir.display()))?;

    let config_path = desk_dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = desk_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    // Opening runs the migrations.
    Desk::open(project_root)?;
    tracing::info!(path = %desk_dir.display(), "desk initialized");

    if quiet {
        return Ok(());
    }
    println!("✓ Initialized {DESK_DIR}/ helpdesk.");
    println!();
    println!("  Store:  {DESK_DIR}/{STORE_FILE}");
    println!("  Config: {DESK_DIR}/config.toml");
    println!();
    println!("Next steps:");
    println!("  Register people:");
    println!("    hd actor add emp-ana --role employee");
    println!("    hd actor add hr-kofi --role hr_executive");
    println!("  Then act as one of them:");
    println!("    export HRDESK_ACTOR=emp-ana");
    println!("    hd create --category leave_issue \"Leave balance is wrong\"");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrdesk_core::config::load_project_config;

    #[test]
    fn init_writes_skeleton_and_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        run_init(&InitArgs { force: false }, dir.path(), true).expect("init");

        let desk_dir = dir.path().join(DESK_DIR);
        assert!(desk_dir.join(STORE_FILE).is_file());
        assert!(desk_dir.join(".gitignore").is_file());

        let cfg = load_project_config(dir.path()).expect("config parses");
        assert_eq!(cfg.reopen.window_hours, 72);
        assert_eq!(cfg.reopen.max_reopens, 3);
    }

    #[test]
    fn second_init_needs_force() {
        let dir = tempfile::tempdir().expect("temp dir");
        run_init(&InitArgs { force: false }, dir.path(), true).expect("init");

        let err = run_init(&InitArgs { force: false }, dir.path(), true).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        run_init(&InitArgs { force: true }, dir.path(), true).expect("forced init");
    }
}
