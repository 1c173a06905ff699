// admin-client/src/views/mod.rs
//! Headless view-models.
//!
//! Each view is an actor owning its own state. Results of network calls are
//! applied from the actor's context, so stopping a view (see [`Unmount`])
//! drops whatever it still had in flight and nothing lands on released state.
use actix::fut;
use actix::prelude::*;
use common::Identity;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::notification::NotificationHandle;
use crate::policy::{self, Capability};
use crate::session::SessionStore;

pub mod appointments;
pub mod dashboard;
pub mod login;
pub mod patients;
pub mod users;

pub use appointments::{AppointmentRow, AppointmentsState, AppointmentsView, CreateAppointment, GetAppointments, LoadAppointments};
pub use dashboard::{DashboardState, DashboardView, GetDashboard, LoadDashboard};
pub use login::{GetLogin, LoginState, LoginView, SubmitLogin};
pub use patients::{CreatePatient, GetPatients, LoadPatientProfile, LoadPatients, PatientsState, PatientsView};
pub use users::{CreateUser, GetUsers, LoadUsers, UsersState, UsersView};

/// Stop a view; anything it still awaits is discarded
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unmount;

/// Immediately-failed response for a local veto
pub(crate) fn refuse<A: Actor, T: 'static>(error: ClientError) -> ResponseActFuture<A, Result<T, ClientError>> {
    Box::pin(fut::ready(Err(error)))
}

/// What every view is handed instead of reaching for globals
#[derive(Clone)]
pub struct ViewContext {
    pub api: ApiClient,
    pub notifications: NotificationHandle,
}

impl ViewContext {
    pub fn new(api: ApiClient, notifications: NotificationHandle) -> Self {
        Self { api, notifications }
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session().get()
    }

    /// Local veto, checked before any request goes out
    pub fn authorize(&self, capability: Capability) -> Result<(), ClientError> {
        let identity = self.identity();
        policy::authorize(identity.as_ref(), capability).map_err(|e| {
            tracing::info!("{}", e);
            e
        })
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.identity()
            .map(|identity| policy::is_allowed(&identity.role, capability))
            .unwrap_or(false)
    }

    /// Failure policy shared by the views.
    ///
    /// A 401/403 ends the session; request and network failures are also
    /// pushed as an error notification. Local failures stay inline.
    pub fn report_failure(&self, error: &ClientError) {
        if error.is_authorization_failure() {
            tracing::warn!("Service rejected the stored credential; clearing session");
            self.session().clear();
        }
        if !error.is_local() {
            self.notifications.error(error.to_string());
        }
    }
}
