use std::fmt;

use crate::model::actor::{ActorId, Role};
use crate::model::ticket::{Status, TicketId};

/// Machine-readable error codes for client-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UnknownCategory,
    InvalidEnumValue,
    WrongActorRole,
    IneligibleAssignee,
    ReasonRequired,
    RoleStrandsTickets,
    InvalidTransition,
    NotResolved,
    DeadlinePassed,
    ReopenLimitExceeded,
    PermanentlyClosed,
    AlreadyTerminal,
    NoEligibleActor,
    TicketNotFound,
    ActorNotFound,
    ActorInactive,
    VersionConflict,
    StoreFailure,
    WorkloadDrift,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UnknownCategory => "E1101",
            Self::InvalidEnumValue => "E1102",
            Self::WrongActorRole => "E1103",
            Self::IneligibleAssignee => "E1104",
            Self::ReasonRequired => "E1105",
            Self::RoleStrandsTickets => "E1106",
            Self::InvalidTransition => "E2001",
            Self::NotResolved => "E2002",
            Self::DeadlinePassed => "E2003",
            Self::ReopenLimitExceeded => "E2004",
            Self::PermanentlyClosed => "E2005",
            Self::AlreadyTerminal => "E2006",
            Self::NoEligibleActor => "E3001",
            Self::TicketNotFound => "E3002",
            Self::ActorNotFound => "E3003",
            Self::ActorInactive => "E3004",
            Self::VersionConflict => "E5001",
            Self::StoreFailure => "E5002",
            Self::WorkloadDrift => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Helpdesk not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownCategory => "Unknown ticket category",
            Self::InvalidEnumValue => "Invalid status/priority/role value",
            Self::WrongActorRole => "Actor role not permitted for this operation",
            Self::IneligibleAssignee => "Assignee does not hold a routable HR role",
            Self::ReasonRequired => "A reason is required",
            Self::RoleStrandsTickets => "Role change would strand open tickets",
            Self::InvalidTransition => "Invalid status transition",
            Self::NotResolved => "Ticket is not resolved",
            Self::DeadlinePassed => "Reopen deadline has passed",
            Self::ReopenLimitExceeded => "Reopen limit exceeded",
            Self::PermanentlyClosed => "Ticket is permanently closed",
            Self::AlreadyTerminal => "Ticket is already resolved or closed",
            Self::NoEligibleActor => "No eligible HR staff for category",
            Self::TicketNotFound => "Ticket not found",
            Self::ActorNotFound => "Actor not found",
            Self::ActorInactive => "Actor is no longer active",
            Self::VersionConflict => "Concurrent update conflict",
            Self::StoreFailure => "Ticket store failure",
            Self::WorkloadDrift => "Workload counters out of sync",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and clients.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `hd init` to initialize this helpdesk."),
            Self::ConfigParseError => Some("Fix syntax in .hrdesk/config.toml and retry."),
            Self::UnknownCategory => Some("Run `hd categories` to list the supported categories."),
            Self::InvalidEnumValue => Some("Use one of the documented status/priority/role values."),
            Self::WrongActorRole => Some("Act as the ticket creator or an HR staff member."),
            Self::IneligibleAssignee => Some("Pick an active actor holding an HR role."),
            Self::ReasonRequired => Some("Provide a non-empty reason."),
            Self::RoleStrandsTickets => {
                Some("Reassign the actor's open tickets with `hd assign`, then change the role.")
            }
            Self::InvalidTransition => {
                Some("Status can only be set on open, in-progress, or pending tickets.")
            }
            Self::NotResolved => Some("Only resolved tickets can be confirmed or reopened."),
            Self::DeadlinePassed => Some("Create a new ticket instead of reopening this one."),
            Self::ReopenLimitExceeded => Some("Create a new ticket referencing this one."),
            Self::PermanentlyClosed | Self::AlreadyTerminal | Self::TicketNotFound => None,
            Self::NoEligibleActor => {
                Some("Register an active HR actor holding one of the routed roles.")
            }
            Self::ActorNotFound => Some("Register the actor with `hd actor add`."),
            Self::ActorInactive => Some("Reassign the work to an active actor."),
            Self::VersionConflict => Some("Re-read the ticket and retry the operation."),
            Self::StoreFailure => Some("Check disk space and write permissions, then retry."),
            Self::WorkloadDrift => Some("Run `hd workload --rebuild` to recount from tickets."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Broad error families; drives log severity and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was impossible. Never retried.
    Validation,
    /// A business rule rejected the transition. Surfaced verbatim.
    State,
    /// An operational condition needing administrator attention.
    Resource,
    /// Lost an optimistic-lock race. Safe to retry once.
    Conflict,
    /// The underlying store failed.
    Storage,
}

/// Which actor an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRequirement {
    /// Any active HR staff member.
    HrStaff,
    /// HR staff or the ticket creator.
    HrOrCreator,
    /// The ticket creator acting as a non-HR employee.
    CreatorEmployee,
}

impl fmt::Display for ActorRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HrStaff => "HR staff",
            Self::HrOrCreator => "HR staff or the ticket creator",
            Self::CreatorEmployee => "the ticket creator (non-HR)",
        })
    }
}

/// A lifecycle guard that refused a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidTransition { to: Option<Status> },
    NotResolved,
    DeadlinePassed { deadline: chrono::DateTime<chrono::Utc> },
    ReopenLimitExceeded { count: u32, max: u32 },
    PermanentlyClosed,
    AlreadyTerminal,
    WrongActorRole { required: ActorRequirement, role: Role },
    ReasonRequired,
}

impl Rejection {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::NotResolved => ErrorCode::NotResolved,
            Self::DeadlinePassed { .. } => ErrorCode::DeadlinePassed,
            Self::ReopenLimitExceeded { .. } => ErrorCode::ReopenLimitExceeded,
            Self::PermanentlyClosed => ErrorCode::PermanentlyClosed,
            Self::AlreadyTerminal => ErrorCode::AlreadyTerminal,
            Self::WrongActorRole { .. } => ErrorCode::WrongActorRole,
            Self::ReasonRequired => ErrorCode::ReasonRequired,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongActorRole { .. } | Self::ReasonRequired => ErrorKind::Validation,
            _ => ErrorKind::State,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { to: Some(to) } => write!(f, "cannot move to {to}"),
            Self::InvalidTransition { to: None } => f.write_str("transition not allowed"),
            Self::NotResolved => f.write_str("ticket is not resolved"),
            Self::DeadlinePassed { deadline } => {
                write!(f, "reopen deadline passed at {}", deadline.to_rfc3339())
            }
            Self::ReopenLimitExceeded { count, max } => {
                write!(f, "reopened {count} of {max} allowed times")
            }
            Self::PermanentlyClosed => f.write_str("ticket was permanently closed by HR"),
            Self::AlreadyTerminal => f.write_str("ticket is already resolved or closed"),
            Self::WrongActorRole { required, role } => {
                write!(f, "requires {required}, actor is {role}")
            }
            Self::ReasonRequired => f.write_str("a non-empty reason is required"),
        }
    }
}

/// Errors surfaced by the helpdesk engine.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("unknown ticket category '{0}'")]
    UnknownCategory(String),

    #[error("invalid {expected}: '{got}'")]
    InvalidValue { expected: &'static str, got: String },

    #[error("no active actor holds any of [{}] for category '{category}'", roles_list(.roles))]
    NoEligibleActor { category: String, roles: Vec<Role> },

    #[error("actor '{0}' cannot be assigned tickets: no routable HR role")]
    IneligibleAssignee(ActorId),

    #[error("ticket '{0}' not found")]
    TicketNotFound(TicketId),

    #[error("actor '{0}' not found")]
    ActorNotFound(ActorId),

    #[error("actor '{0}' is inactive")]
    ActorInactive(ActorId),

    /// The new role cannot hold tickets but the actor still has open ones.
    #[error("actor '{actor}' still holds {} open tickets; role {role} cannot hold tickets", .tickets.len())]
    RoleStrandsTickets {
        actor: ActorId,
        role: Role,
        tickets: Vec<TicketId>,
    },

    /// A lifecycle guard rejected the operation.
    #[error("ticket '{ticket_id}' ({status}): {rejection}")]
    Rejected {
        ticket_id: TicketId,
        status: Status,
        rejection: Rejection,
    },

    /// The ticket changed underneath the caller.
    #[error("ticket '{ticket_id}' changed concurrently (now v{current_version}, {status})")]
    Conflict {
        ticket_id: TicketId,
        status: Status,
        current_version: u64,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("store holds an unreadable {field}: '{value}'")]
    CorruptRecord { field: &'static str, value: String },

    #[error("workload counter for '{0}' would drop below zero")]
    WorkloadUnderflow(ActorId),
}

fn roles_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DeskError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownCategory(_) => ErrorCode::UnknownCategory,
            Self::InvalidValue { .. } => ErrorCode::InvalidEnumValue,
            Self::NoEligibleActor { .. } => ErrorCode::NoEligibleActor,
            Self::IneligibleAssignee(_) => ErrorCode::IneligibleAssignee,
            Self::TicketNotFound(_) => ErrorCode::TicketNotFound,
            Self::ActorNotFound(_) => ErrorCode::ActorNotFound,
            Self::ActorInactive(_) => ErrorCode::ActorInactive,
            Self::RoleStrandsTickets { .. } => ErrorCode::RoleStrandsTickets,
            Self::Rejected { rejection, .. } => rejection.code(),
            Self::Conflict { .. } => ErrorCode::VersionConflict,
            Self::Store(_) | Self::CorruptRecord { .. } => ErrorCode::StoreFailure,
            Self::WorkloadUnderflow(_) => ErrorCode::WorkloadDrift,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCategory(_)
            | Self::InvalidValue { .. }
            | Self::IneligibleAssignee(_)
            | Self::ActorInactive(_)
            | Self::RoleStrandsTickets { .. } => ErrorKind::Validation,
            Self::Rejected { rejection, .. } => rejection.kind(),
            Self::NoEligibleActor { .. } | Self::TicketNotFound(_) | Self::ActorNotFound(_) => {
                ErrorKind::Resource
            }
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Store(_) | Self::CorruptRecord { .. } | Self::WorkloadUnderflow(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// The guard rejection carried by this error, if any.
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected { rejection, .. } => Some(rejection),
            _ => None,
        }
    }

    /// Optional remediation hint for operators and clients.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
