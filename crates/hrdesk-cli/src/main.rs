#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use hrdesk_core::config;
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hd: HR helpdesk ticketing",
    long_about = None
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Act as this actor (overrides HRDESK_ACTOR and ACTOR).
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn actor_flag(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// `--json` > `FORMAT` > user config > TTY detection.
    fn output_mode(&self, cwd: &Path) -> OutputMode {
        let root = cmd::find_desk_root(cwd).unwrap_or_else(|| cwd.to_path_buf());
        match config::resolve_config(&root, self.json) {
            Ok(cfg) => OutputMode::from_resolved(&cfg.resolved_output),
            Err(_) if self.json => OutputMode::Json,
            Err(_) => OutputMode::Text,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a helpdesk",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    hd init"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Setup", about = "Manage actors")]
    Actor {
        #[command(subcommand)]
        command: cmd::actors::ActorCommand,
    },

    #[command(next_help_heading = "Setup", about = "List ticket categories and routing")]
    Categories,

    #[command(
        next_help_heading = "Tickets",
        about = "Open a ticket",
        long_about = "Open a ticket as the acting employee. The assignee is picked by \
                      workload among the roles the category routes to.",
        after_help = "EXAMPLES:\n    hd create --category payroll_salary \"Salary credited short\"\n\n    \
                      # Skip workload routing\n    hd create -c leave_issue --assignee hr-kofi \"Leave stuck\""
    )]
    Create(cmd::create::CreateArgs),

    #[command(next_help_heading = "Read", about = "Show one ticket")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets",
        after_help = "EXAMPLES:\n    hd list --status open --assignee hr-kofi\n\n    hd list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Read", about = "Show a ticket's conversation")]
    Thread(cmd::comment::ThreadArgs),

    #[command(next_help_heading = "Lifecycle", about = "Set a ticket's status")]
    Status(cmd::transition::StatusArgs),

    #[command(next_help_heading = "Lifecycle", about = "Resolve a ticket (HR)")]
    Resolve(cmd::transition::ResolveArgs),

    #[command(next_help_heading = "Lifecycle", about = "Confirm a resolution (creator)")]
    Confirm(cmd::transition::ConfirmArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Reopen a resolved ticket (creator)",
        after_help = "EXAMPLES:\n    hd reopen tk-1a2b3c4d5e --reason \"Still not paid\""
    )]
    Reopen(cmd::transition::ReopenArgs),

    #[command(next_help_heading = "Lifecycle", about = "Escalate a ticket")]
    Escalate(cmd::transition::EscalateArgs),

    #[command(next_help_heading = "Lifecycle", about = "Close a ticket permanently (HR)")]
    Close(cmd::transition::CloseArgs),

    #[command(next_help_heading = "Lifecycle", about = "Reassign a ticket (HR)")]
    Assign(cmd::transition::AssignArgs),

    #[command(next_help_heading = "Lifecycle", about = "Add a message to a ticket")]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Show workload per HR actor",
        after_help = "EXAMPLES:\n    hd workload --role hr_manager\n\n    hd workload --verify\n\n    hd workload --rebuild"
    )]
    Workload(cmd::workload::WorkloadArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HRDESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "hrdesk=debug,hd=debug,info"
        } else {
            "hrdesk=info,warn"
        })
    });

    let format = env::var("HRDESK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, cwd: &Path, output: OutputMode) -> anyhow::Result<()> {
    let actor = cli.actor_flag();
    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, cwd, cli.quiet),
        Commands::Actor { command } => cmd::actors::run_actor(command, output, cwd),
        Commands::Categories => cmd::categories::run_categories(output),
        Commands::Create(args) => cmd::create::run_create(args, actor, output, cwd),
        Commands::Show(args) => cmd::show::run_show(args, output, cwd),
        Commands::List(args) => cmd::list::run_list(args, output, cwd),
        Commands::Thread(args) => cmd::comment::run_thread(args, output, cwd),
        Commands::Status(args) => {
            cmd::transition::run_transition(args.request()?, actor, output, cwd)
        }
        Commands::Resolve(args) => {
            cmd::transition::run_transition(args.request(), actor, output, cwd)
        }
        Commands::Confirm(args) => {
            cmd::transition::run_transition(args.request(), actor, output, cwd)
        }
        Commands::Reopen(args) => {
            cmd::transition::run_transition(args.request(), actor, output, cwd)
        }
        Commands::Escalate(args) => {
            cmd::transition::run_transition(args.request(), actor, output, cwd)
        }
        Commands::Close(args) => {
            cmd::transition::run_transition(args.request(), actor, output, cwd)
        }
        Commands::Assign(args) => {
            cmd::transition::run_transition(args.request()?, actor, output, cwd)
        }
        Commands::Comment(args) => cmd::comment::run_comment(args, actor, output, cwd),
        Commands::Workload(args) => cmd::workload::run_workload(args, output, cwd),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: cannot read working directory: {err}");
            return ExitCode::FAILURE;
        }
    };
    let output = cli.output_mode(&cwd);
    debug!(?output, command = ?cli.command, "dispatching");

    match run(&cli, &cwd, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["hd", "list", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn actor_flag_parsed() {
        let cli = Cli::parse_from(["hd", "--actor", "hr-kofi", "resolve", "tk-abc"]);
        assert_eq!(cli.actor_flag(), Some("hr-kofi"));
    }

    #[test]
    fn actor_flag_none_by_default() {
        let cli = Cli::parse_from(["hd", "list"]);
        assert!(cli.actor_flag().is_none());
    }

    #[test]
    fn quiet_and_verbose_flags_parsed() {
        let cli = Cli::parse_from(["hd", "-q", "-v", "init"]);
        assert!(cli.quiet);
        assert!(cli.verbose);
    }

    #[test]
    fn actor_subcommands_parse() {
        let cli = Cli::parse_from(["hd", "actor", "add", "hr-kofi", "--role", "hr_executive"]);
        assert!(matches!(
            cli.command,
            Commands::Actor {
                command: cmd::actors::ActorCommand::Add(_)
            }
        ));
    }

    #[test]
    fn workload_verify_conflicts_with_rebuild() {
        assert!(Cli::try_parse_from(["hd", "workload", "--verify", "--rebuild"]).is_err());
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["hd", "init"],
            vec!["hd", "actor", "add", "emp-ana", "--role", "employee"],
            vec!["hd", "actor", "remove", "emp-ana"],
            vec!["hd", "actor", "list", "--all"],
            vec!["hd", "categories"],
            vec!["hd", "create", "-c", "leave_issue", "Leave stuck"],
            vec!["hd", "show", "tk-abc", "--thread"],
            vec!["hd", "list"],
            vec!["hd", "thread", "tk-abc"],
            vec!["hd", "status", "tk-abc", "pending"],
            vec!["hd", "resolve", "tk-abc", "-c", "done"],
            vec!["hd", "confirm", "tk-abc"],
            vec!["hd", "reopen", "tk-abc", "-r", "again"],
            vec!["hd", "escalate", "tk-abc", "-r", "slow"],
            vec!["hd", "close", "tk-abc"],
            vec!["hd", "assign", "tk-abc", "hr-mei"],
            vec!["hd", "comment", "tk-abc", "any news?"],
            vec!["hd", "workload", "--verify"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "Failed to parse: {args:?}: {:?}", result.err());
        }
    }
}
