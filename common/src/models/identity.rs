// common/src/models/identity.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Staff roles known to the clinic service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Receptionist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is not one of the known staff roles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    // Exact match only; "Admin" or " admin" are not roles.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated staff member, as returned by `POST /auth/login`.
///
/// The record is persisted verbatim: the role is kept as the raw string the
/// service sent, and any fields this client does not know about are carried
/// along in `extra` so a reload sees exactly what the service issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Staff member identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Raw role string; see [`Identity::role`]
    pub role: String,
    /// Opaque bearer credential proving a prior successful login
    #[serde(alias = "token")]
    pub credential: String,
    /// Unrecognised fields, preserved for round-tripping
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(id: u64, name: impl Into<String>, role: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
            credential: credential.into(),
            extra: Map::new(),
        }
    }

    /// Parsed role, `None` when the service sent a role this client does not know
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    /// A record without a credential cannot authorize anything and is treated as logged out
    pub fn is_complete(&self) -> bool {
        !self.credential.trim().is_empty()
    }
}
