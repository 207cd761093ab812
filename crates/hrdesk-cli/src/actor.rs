//! Acting identity resolution for CLI commands.
//!
//! The resolution chain: `--actor` flag > `HRDESK_ACTOR` env > `ACTOR` env.
//! Commands that change a ticket need an identity; read-only commands do not.

use hrdesk_core::model::actor::ActorId;
use std::env;

/// Errors from actor resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorResolutionError {
    pub message: String,
    /// Machine error code.
    pub code: &'static str,
}

impl std::fmt::Display for ActorResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActorResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

fn resolve_actor_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(actor) = cli_flag.filter(|a| !a.is_empty()) {
        return Some(actor.to_string());
    }
    env.get("HRDESK_ACTOR").or_else(|| env.get("ACTOR"))
}

fn require_actor_with(
    cli_flag: Option<&str>,
    env: &dyn EnvReader,
) -> Result<ActorId, ActorResolutionError> {
    let raw = resolve_actor_with(cli_flag, env).ok_or_else(|| ActorResolutionError {
        message: "Actor identity required for this command. \
                  Set --actor, HRDESK_ACTOR, or ACTOR environment variable."
            .to_string(),
        code: "missing_actor",
    })?;
    ActorId::parse(&raw).map_err(|e| ActorResolutionError {
        message: e.to_string(),
        code: "invalid_actor",
    })
}

/// Resolve and validate the acting identity.
pub fn require_actor(cli_flag: Option<&str>) -> Result<ActorId, ActorResolutionError> {
    require_actor_with(cli_flag, &RealEnv)
}
