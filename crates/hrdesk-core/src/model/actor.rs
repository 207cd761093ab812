use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::normalize;
use crate::error::DeskError;

/// Opaque reference to a person known to the external user store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Parse an actor id: non-empty, no surrounding whitespace, no control
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidValue`] when the id is malformed.
    pub fn parse(raw: &str) -> Result<Self, DeskError> {
        if raw.is_empty() || raw.trim() != raw || raw.chars().any(char::is_control) {
            return Err(DeskError::InvalidValue {
                expected: "actor id",
                got: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Wrap a value already known to be valid (e.g. read back from the store).
    #[must_use]
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organisational role of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    TeamLead,
    HrExecutive,
    HrManager,
    HrBusinessPartner,
    TalentAcquisition,
    HrOperations,
}

impl Role {
    pub const ALL: [Self; 7] = [
        Self::Employee,
        Self::TeamLead,
        Self::HrExecutive,
        Self::HrManager,
        Self::HrBusinessPartner,
        Self::TalentAcquisition,
        Self::HrOperations,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::TeamLead => "team_lead",
            Self::HrExecutive => "hr_executive",
            Self::HrManager => "hr_manager",
            Self::HrBusinessPartner => "hr_business_partner",
            Self::TalentAcquisition => "talent_acquisition",
            Self::HrOperations => "hr_operations",
        }
    }

    /// Whether the role belongs to the HR function.
    #[must_use]
    pub const fn is_hr(self) -> bool {
        !matches!(self, Self::Employee | Self::TeamLead)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| DeskError::InvalidValue {
                expected: "role",
                got: s.to_string(),
            })
    }
}

/// A person as seen by the helpdesk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub role: Role,
    pub active: bool,
}

impl Actor {
    #[must_use]
    pub fn new(id: ActorId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActorId, Role};
    use std::str::FromStr;

    #[test]
    fn role_parse_accepts_kebab_and_case() {
        assert_eq!(Role::from_str("HR-Manager").unwrap(), Role::HrManager);
        assert_eq!(Role::from_str(" team lead ").unwrap(), Role::TeamLead);
        assert!(Role::from_str("ceo").is_err());
    }

    #[test]
    fn hr_split_is_stable() {
        let hr: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_hr()).collect();
        assert_eq!(hr.len(), 5);
        assert!(!Role::Employee.is_hr());
        assert!(!Role::TeamLead.is_hr());
    }

    #[test]
    fn actor_id_rejects_blank_and_padded() {
        assert!(ActorId::parse("").is_err());
        assert!(ActorId::parse(" alice").is_err());
        assert!(ActorId::parse("al\tice").is_err());
        assert_eq!(ActorId::parse("alice").unwrap().as_str(), "alice");
    }
}
