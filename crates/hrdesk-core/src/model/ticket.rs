use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::actor::ActorId;
use super::category::Category;
use super::normalize;
use crate::error::DeskError;

/// Opaque ticket identifier (`tk-` prefix).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub const PREFIX: &'static str = "tk-";

    /// # Errors
    ///
    /// Returns [`DeskError::InvalidValue`] if `raw` lacks the `tk-` prefix or
    /// contains anything but lowercase alphanumerics after it.
    pub fn parse(raw: &str) -> Result<Self, DeskError> {
        let trimmed = raw.trim();
        let valid = trimmed.strip_prefix(Self::PREFIX).is_some_and(|rest| {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        });
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(DeskError::InvalidValue {
                expected: "ticket id",
                got: raw.to_string(),
            })
        }
    }

    #[must_use]
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Derive a fresh id from a seed that is unique per creation.
    #[must_use]
    pub fn derive(seed: &str) -> Self {
        let digest = blake3::hash(seed.as_bytes()).to_hex();
        Self(format!("{}{}", Self::PREFIX, &digest[..10]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Primary lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Pending,
    Resolved,
    Closed,
    Escalated,
    Reopened,
}

impl Status {
    pub const ALL: [Self; 7] = [
        Self::Open,
        Self::InProgress,
        Self::Pending,
        Self::Resolved,
        Self::Closed,
        Self::Escalated,
        Self::Reopened,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Escalated => "escalated",
            Self::Reopened => "reopened",
        }
    }

    /// Whether a ticket in this state charges its assignee's workload.
    #[must_use]
    pub const fn counts_toward_workload(self) -> bool {
        !matches!(self, Self::Resolved | Self::Closed)
    }

    /// States a free-form `set_status` may start from.
    #[must_use]
    pub const fn accepts_status_set(self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::Pending)
    }

    /// States a free-form `set_status` may land on.
    #[must_use]
    pub const fn is_settable_target(self) -> bool {
        !matches!(self, Self::Escalated)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DeskError::InvalidValue {
                expected: "status",
                got: s.to_string(),
            })
    }
}

/// Informational urgency; never consulted by lifecycle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(DeskError::InvalidValue {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

/// Who a ticket is assigned to.
///
/// A removed actor leaves a `Tombstone` behind instead of a dangling id, so
/// "assigned to someone who no longer exists" can never be mistaken for a
/// live assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssigneeRef {
    Present { actor: ActorId },
    Tombstone { former: ActorId },
}

impl AssigneeRef {
    #[must_use]
    pub const fn present(actor: ActorId) -> Self {
        Self::Present { actor }
    }

    /// The live assignee, if any.
    #[must_use]
    pub const fn actor(&self) -> Option<&ActorId> {
        match self {
            Self::Present { actor } => Some(actor),
            Self::Tombstone { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone { .. })
    }
}

impl fmt::Display for AssigneeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present { actor } => write!(f, "{actor}"),
            Self::Tombstone { former } => write!(f, "{former} (removed)"),
        }
    }
}

/// Confirmation and reopen bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStatus {
    pub employee_confirmed: bool,
    pub permanently_closed_by_hr: bool,
    pub reopen_deadline: Option<DateTime<Utc>>,
    pub reopen_count: u32,
    pub max_reopen_allowed: u32,
}

impl ResolutionStatus {
    pub const DEFAULT_MAX_REOPEN: u32 = 3;

    #[must_use]
    pub const fn new(max_reopen_allowed: u32) -> Self {
        Self {
            employee_confirmed: false,
            permanently_closed_by_hr: false,
            reopen_deadline: None,
            reopen_count: 0,
            max_reopen_allowed,
        }
    }
}

impl Default for ResolutionStatus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_REOPEN)
    }
}

/// A support ticket and its full lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub category: Category,
    pub subcategory: Option<String>,
    pub priority: Priority,
    pub description: String,
    pub status: Status,
    pub resolution: ResolutionStatus,
    pub escalation_level: u32,
    pub created_by: ActorId,
    pub assigned_to: AssigneeRef,
    /// Assignee chosen at creation; reopen routes back here.
    pub original_assignee: ActorId,
    pub is_manually_assigned: bool,
    pub is_confidential: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed write; the optimistic-lock token.
    pub version: u64,
}

impl Ticket {
    /// Permanently closed tickets never transition again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.resolution.permanently_closed_by_hr
    }

    /// The actor currently charged with this ticket in the workload index.
    #[must_use]
    pub fn workload_holder(&self) -> Option<&ActorId> {
        if self.status.counts_toward_workload() {
            self.assigned_to.actor()
        } else {
            None
        }
    }
}
