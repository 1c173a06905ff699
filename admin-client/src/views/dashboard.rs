// admin-client/src/views/dashboard.rs
use actix::prelude::*;
use common::{Appointment, DashboardData, DashboardStats};

use super::{refuse, Unmount, ViewContext};
use crate::error::ClientError;
use crate::policy::Capability;

pub const LOAD_FAILED: &str = "Failed to load dashboard data";

/// Dashboard as last loaded. Appointments keep the status the service stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub loading: bool,
    pub error: Option<String>,
    pub stats: DashboardStats,
    pub today_appointments: Vec<Appointment>,
}

#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct LoadDashboard;

#[derive(Message)]
#[rtype(result = "DashboardState")]
pub struct GetDashboard;

pub struct DashboardView {
    context: ViewContext,
    state: DashboardState,
}

impl DashboardView {
    pub fn new(context: ViewContext) -> Self {
        Self {
            context,
            state: DashboardState::default(),
        }
    }

    fn apply(&mut self, result: Result<DashboardData, ClientError>) -> Result<(), ClientError> {
        self.state.loading = false;
        match result {
            Ok(data) => {
                tracing::debug!("Dashboard loaded, {} appointments today", data.today_appointments.len());
                self.state.stats = data.stats;
                self.state.today_appointments = data.today_appointments;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Dashboard load failed: {}", e);
                self.state.error = Some(LOAD_FAILED.to_string());
                self.context.report_failure(&e);
                Err(e)
            }
        }
    }
}

impl Actor for DashboardView {
    type Context = Context<Self>;
}

impl Handler<LoadDashboard> for DashboardView {
    type Result = ResponseActFuture<Self, Result<(), ClientError>>;

    fn handle(&mut self, _msg: LoadDashboard, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::ViewDashboard) {
            return refuse(e);
        }

        self.state.loading = true;
        self.state.error = None;
        let api = self.context.api.clone();

        Box::pin(
            async move { api.get::<DashboardData>("/dashboard").await }
                .into_actor(self)
                .map(|result, act, _ctx| act.apply(result)),
        )
    }
}

impl Handler<GetDashboard> for DashboardView {
    type Result = MessageResult<GetDashboard>;

    fn handle(&mut self, _msg: GetDashboard, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Unmount> for DashboardView {
    type Result = ();

    fn handle(&mut self, _msg: Unmount, ctx: &mut Self::Context) {
        ctx.stop();
    }
}
