// admin-client/src/policy.rs
//! Role to capability table.
//!
//! This is the only place role checks live: navigation guards, views and the
//! menu all ask [`is_allowed`]. It is a convenience for the UI, not a security
//! boundary; the clinic service enforces the same rules on its side.
use common::{Identity, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::ClientError;

/// Routes and actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    ViewDashboard,
    ViewPatients,
    ViewPatientProfile,
    CreatePatient,
    ViewAppointments,
    CreateAppointment,
    ViewUsers,
    CreateUser,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::ViewDashboard,
        Capability::ViewPatients,
        Capability::ViewPatientProfile,
        Capability::CreatePatient,
        Capability::ViewAppointments,
        Capability::CreateAppointment,
        Capability::ViewUsers,
        Capability::CreateUser,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Capability::ViewDashboard => "dashboard:view",
            Capability::ViewPatients => "patients:view",
            Capability::ViewPatientProfile => "patients:profile",
            Capability::CreatePatient => "patients:create",
            Capability::ViewAppointments => "appointments:view",
            Capability::CreateAppointment => "appointments:create",
            Capability::ViewUsers => "users:view",
            Capability::CreateUser => "users:create",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

const ALL_STAFF: &[Role] = &[Role::Admin, Role::Doctor, Role::Receptionist];
const FRONT_DESK: &[Role] = &[Role::Admin, Role::Receptionist];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

const POLICY: &[(Capability, &[Role])] = &[
    (Capability::ViewDashboard, ALL_STAFF),
    (Capability::ViewPatients, ALL_STAFF),
    (Capability::ViewPatientProfile, ALL_STAFF),
    (Capability::CreatePatient, ALL_STAFF),
    (Capability::ViewAppointments, ALL_STAFF),
    (Capability::CreateAppointment, FRONT_DESK),
    (Capability::ViewUsers, ADMIN_ONLY),
    (Capability::CreateUser, ADMIN_ONLY),
];

/// Whether a known role holds a capability. Missing table rows deny.
pub fn permits(role: Role, capability: Capability) -> bool {
    POLICY
        .iter()
        .find(|(cap, _)| *cap == capability)
        .map(|(_, roles)| roles.contains(&role))
        .unwrap_or(false)
}

/// Whether a raw role string holds a capability. Unknown or empty roles deny.
pub fn is_allowed(role: &str, capability: Capability) -> bool {
    role.parse::<Role>()
        .map(|role| permits(role, capability))
        .unwrap_or(false)
}

/// Everything a role may do, recomputed on every call
pub fn capabilities(role: &str) -> BTreeSet<Capability> {
    Capability::ALL
        .iter()
        .copied()
        .filter(|cap| is_allowed(role, *cap))
        .collect()
}

/// Veto an action locally, before any request is issued
pub fn authorize(identity: Option<&Identity>, capability: Capability) -> Result<(), ClientError> {
    match identity {
        Some(identity) if is_allowed(&identity.role, capability) => Ok(()),
        Some(identity) => Err(ClientError::AuthorizationDenied {
            role: identity.role.clone(),
            capability,
        }),
        None => Err(ClientError::AuthorizationDenied {
            role: String::new(),
            capability,
        }),
    }
}
