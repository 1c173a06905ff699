// admin-client/src/shell.rs
use actix::prelude::*;
use common::Identity;
use std::time::Duration;

use crate::guards::{MenuEntry, Navigation, Navigator, Route};
use crate::session::{SessionChanged, SessionWatcher, StopWatching, SubscriptionId};
use crate::views::{AppointmentsView, DashboardView, LoginView, PatientsView, Unmount, UsersView, ViewContext};

/// The view currently on screen
#[derive(Clone)]
pub enum MountedView {
    Login(Addr<LoginView>),
    Dashboard(Addr<DashboardView>),
    Patients(Addr<PatientsView>),
    PatientProfile { id: u64, view: Addr<PatientsView> },
    Appointments(Addr<AppointmentsView>),
    Users(Addr<UsersView>),
}

impl MountedView {
    fn mount(route: Route, context: &ViewContext) -> Self {
        let context = context.clone();
        match route {
            Route::Login => MountedView::Login(LoginView::new(context).start()),
            Route::Dashboard => MountedView::Dashboard(DashboardView::new(context).start()),
            Route::Patients => MountedView::Patients(PatientsView::new(context).start()),
            Route::PatientProfile(id) => MountedView::PatientProfile {
                id,
                view: PatientsView::new(context).start(),
            },
            Route::Appointments => MountedView::Appointments(AppointmentsView::new(context).start()),
            Route::Users => MountedView::Users(UsersView::new(context).start()),
        }
    }

    pub fn route(&self) -> Route {
        match self {
            MountedView::Login(_) => Route::Login,
            MountedView::Dashboard(_) => Route::Dashboard,
            MountedView::Patients(_) => Route::Patients,
            MountedView::PatientProfile { id, .. } => Route::PatientProfile(*id),
            MountedView::Appointments(_) => Route::Appointments,
            MountedView::Users(_) => Route::Users,
        }
    }

    fn unmount(&self) {
        match self {
            MountedView::Login(addr) => addr.do_send(Unmount),
            MountedView::Dashboard(addr) => addr.do_send(Unmount),
            MountedView::Patients(addr) => addr.do_send(Unmount),
            MountedView::PatientProfile { view, .. } => view.do_send(Unmount),
            MountedView::Appointments(addr) => addr.do_send(Unmount),
            MountedView::Users(addr) => addr.do_send(Unmount),
        }
    }
}

// Messages for the shell

#[derive(Message)]
#[rtype(result = "Navigation")]
pub struct Navigate(pub Route);

#[derive(Message)]
#[rtype(result = "Option<Navigation>")]
pub struct Back;

#[derive(Message)]
#[rtype(result = "Option<MountedView>")]
pub struct CurrentView;

#[derive(Message)]
#[rtype(result = "Vec<MenuEntry>")]
pub struct GetMenu;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Logout;

/// Root UI context: owns navigation, the mounted view and the session
/// subscription, and re-runs the guards whenever the session changes.
pub struct Shell {
    context: ViewContext,
    navigator: Navigator,
    mounted: Option<MountedView>,
    /// Who the mounted view was loaded for
    mounted_for: Option<Identity>,
    subscription: Option<SubscriptionId>,
    watch_interval: Option<Duration>,
    watcher: Option<Addr<SessionWatcher>>,
}

impl Shell {
    pub fn new(context: ViewContext) -> Self {
        Self {
            context,
            navigator: Navigator::new(),
            mounted: None,
            mounted_for: None,
            subscription: None,
            watch_interval: None,
            watcher: None,
        }
    }

    /// Also poll the session storage for changes made by other processes
    pub fn watching(mut self, interval: Duration) -> Self {
        self.watch_interval = Some(interval);
        self
    }

    /// Mount the view for `route` unless it is already on screen for `identity`.
    ///
    /// The login view holds nothing per user and stays mounted while its own
    /// submission changes the session.
    fn show(&mut self, route: Route, identity: Option<Identity>) {
        let same_route = self.mounted.as_ref().map(MountedView::route) == Some(route);
        if same_route && (route == Route::Login || self.mounted_for == identity) {
            self.mounted_for = identity;
            return;
        }
        if let Some(previous) = self.mounted.take() {
            previous.unmount();
        }
        tracing::debug!("Mounting view for {}", route);
        self.mounted = Some(MountedView::mount(route, &self.context));
        self.mounted_for = identity;
    }
}

impl Actor for Shell {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let id = self.context.session().subscribe(ctx.address().recipient());
        self.subscription = Some(id);

        if let Some(interval) = self.watch_interval {
            let watcher = SessionWatcher::new(self.context.session().clone(), interval).start();
            self.watcher = Some(watcher);
        }
        tracing::info!("Shell started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(id) = self.subscription.take() {
            self.context.session().unsubscribe(id);
        }
        if let Some(watcher) = self.watcher.take() {
            watcher.do_send(StopWatching);
        }
        if let Some(view) = self.mounted.take() {
            view.unmount();
        }
        tracing::info!("Shell stopped");
    }
}

impl Handler<Navigate> for Shell {
    type Result = MessageResult<Navigate>;

    fn handle(&mut self, msg: Navigate, _ctx: &mut Self::Context) -> Self::Result {
        let identity = self.context.identity();
        let outcome = self.navigator.navigate(msg.0, identity.as_ref());
        self.show(outcome.route(), identity);
        MessageResult(outcome)
    }
}

impl Handler<Back> for Shell {
    type Result = MessageResult<Back>;

    fn handle(&mut self, _msg: Back, _ctx: &mut Self::Context) -> Self::Result {
        let identity = self.context.identity();
        let outcome = self.navigator.back(identity.as_ref());
        if let Some(outcome) = &outcome {
            self.show(outcome.route(), identity);
        }
        MessageResult(outcome)
    }
}

impl Handler<CurrentView> for Shell {
    type Result = MessageResult<CurrentView>;

    fn handle(&mut self, _msg: CurrentView, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.mounted.clone())
    }
}

impl Handler<GetMenu> for Shell {
    type Result = MessageResult<GetMenu>;

    fn handle(&mut self, _msg: GetMenu, _ctx: &mut Self::Context) -> Self::Result {
        let identity = self.context.identity();
        MessageResult(Navigator::menu(identity.as_ref()))
    }
}

impl Handler<Logout> for Shell {
    type Result = ();

    fn handle(&mut self, _msg: Logout, _ctx: &mut Self::Context) {
        // The session change signal moves us off guarded routes
        self.context.session().clear();
    }
}

impl Handler<SessionChanged> for Shell {
    type Result = ();

    fn handle(&mut self, msg: SessionChanged, _ctx: &mut Self::Context) {
        let identity = self.context.identity();
        tracing::debug!("Session changed ({:?}), re-checking current route", msg.origin);

        if let Some(outcome) = self.navigator.revalidate(identity.as_ref()) {
            if let Navigation::Redirected { from, to } = outcome {
                tracing::info!("Session change moved {} to {}", from, to);
            }
            self.show(outcome.route(), identity);
        }
    }
}
