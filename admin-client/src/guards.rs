// admin-client/src/guards.rs
//! Navigation guards and the history-keeping navigator.
//!
//! Guards are pure decisions over the identity read from the session store at
//! the moment of navigation. They keep no state; the [`Navigator`] re-runs
//! them on every navigation and whenever the session changes.
use common::Identity;
use std::fmt;
use std::str::FromStr;

use crate::policy::{self, Capability};

/// Client routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Patients,
    PatientProfile(u64),
    Appointments,
    Users,
}

impl Route {
    /// Where guards send traffic that is authenticated but not permitted
    pub const LANDING: Route = Route::Dashboard;

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Patients => "/patients".to_string(),
            Route::PatientProfile(id) => format!("/patients/{}", id),
            Route::Appointments => "/appointments".to_string(),
            Route::Users => "/users".to_string(),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Dashboard),
            ["login"] => Some(Route::Login),
            ["patients"] => Some(Route::Patients),
            ["patients", id] => id.parse().ok().map(Route::PatientProfile),
            ["appointments"] => Some(Route::Appointments),
            ["users"] => Some(Route::Users),
            _ => None,
        }
    }

    /// Capability needed to render the route; `None` for the login page
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Route::Login => None,
            Route::Dashboard => Some(Capability::ViewDashboard),
            Route::Patients => Some(Capability::ViewPatients),
            Route::PatientProfile(_) => Some(Capability::ViewPatientProfile),
            Route::Appointments => Some(Capability::ViewAppointments),
            Route::Users => Some(Capability::ViewUsers),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::Patients => "Patients",
            Route::PatientProfile(_) => "Patient",
            Route::Appointments => "Appointments",
            Route::Users => "Users",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no route matches '{0}'")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s).ok_or_else(|| UnknownRoute(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect { to: Route, replace: bool },
}

pub trait Guard {
    fn check(&self, identity: Option<&Identity>) -> GuardDecision;
}

/// Identity present, else back to the login page
#[derive(Debug, Clone, Copy)]
pub struct RequireAuthenticated;

impl Guard for RequireAuthenticated {
    fn check(&self, identity: Option<&Identity>) -> GuardDecision {
        match identity {
            Some(_) => GuardDecision::Allow,
            None => GuardDecision::Redirect {
                to: Route::Login,
                replace: true,
            },
        }
    }
}

/// Identity present and permitted, else to the landing page
#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    pub capability: Capability,
}

impl Guard for RequireRole {
    fn check(&self, identity: Option<&Identity>) -> GuardDecision {
        match identity {
            Some(identity) if policy::is_allowed(&identity.role, self.capability) => GuardDecision::Allow,
            _ => GuardDecision::Redirect {
                to: Route::LANDING,
                replace: true,
            },
        }
    }
}

/// Run the guards protecting `route`, authentication first
pub fn evaluate(route: Route, identity: Option<&Identity>) -> GuardDecision {
    let Some(capability) = route.required_capability() else {
        return GuardDecision::Allow;
    };

    match RequireAuthenticated.check(identity) {
        GuardDecision::Allow => RequireRole { capability }.check(identity),
        redirect => redirect,
    }
}

/// Follow redirects to the route that actually renders.
///
/// A redirect that leads back to a route already visited falls back to the
/// login page; this happens when an identity's role permits nothing.
fn resolve(route: Route, identity: Option<&Identity>) -> Route {
    let mut visited = vec![route];
    let mut current = route;

    loop {
        match evaluate(current, identity) {
            GuardDecision::Allow => return current,
            GuardDecision::Redirect { to, .. } => {
                if visited.contains(&to) {
                    tracing::warn!("Redirect loop at {}; falling back to {}", to, Route::Login);
                    return Route::Login;
                }
                visited.push(to);
                current = to;
            }
        }
    }
}

/// Outcome of a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Rendered(Route),
    Redirected { from: Route, to: Route },
}

impl Navigation {
    /// The route that ends up on screen
    pub fn route(&self) -> Route {
        match self {
            Navigation::Rendered(route) => *route,
            Navigation::Redirected { to, .. } => *to,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Navigation::Redirected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub route: Route,
}

const MENU: [Route; 4] = [Route::Dashboard, Route::Patients, Route::Appointments, Route::Users];

/// History stack with guarded transitions.
///
/// A redirected navigation replaces the entry it was aiming for, so going
/// back never lands on a page the guards refused.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }

    /// Push `route`, or whatever the guards redirect it to
    pub fn navigate(&mut self, route: Route, identity: Option<&Identity>) -> Navigation {
        let outcome = self.outcome(route, identity);
        self.history.push(outcome.route());
        outcome
    }

    /// Re-run the guards on the current route, e.g. after a session change.
    ///
    /// Returns `None` when nothing has been navigated to yet.
    pub fn revalidate(&mut self, identity: Option<&Identity>) -> Option<Navigation> {
        let current = self.current()?;
        let outcome = self.outcome(current, identity);
        if let Some(top) = self.history.last_mut() {
            *top = outcome.route();
        }
        Some(outcome)
    }

    /// Pop the current entry and re-enter the previous one through the guards
    pub fn back(&mut self, identity: Option<&Identity>) -> Option<Navigation> {
        if self.history.len() < 2 {
            return None;
        }
        self.history.pop();
        self.revalidate(identity)
    }

    /// Entries the identity may open
    pub fn menu(identity: Option<&Identity>) -> Vec<MenuEntry> {
        let Some(identity) = identity else {
            return Vec::new();
        };

        MENU.iter()
            .filter(|route| {
                route
                    .required_capability()
                    .map(|cap| policy::is_allowed(&identity.role, cap))
                    .unwrap_or(true)
            })
            .map(|route| MenuEntry {
                label: route.title(),
                route: *route,
            })
            .collect()
    }

    fn outcome(&self, route: Route, identity: Option<&Identity>) -> Navigation {
        let landed = resolve(route, identity);
        if landed == route {
            Navigation::Rendered(route)
        } else {
            tracing::info!("Navigation to {} redirected to {}", route, landed);
            Navigation::Redirected { from: route, to: landed }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::identity;
    use rstest::rstest;

    #[rstest]
    #[case("/", Some(Route::Dashboard))]
    #[case("", Some(Route::Dashboard))]
    #[case("/login", Some(Route::Login))]
    #[case("/patients/", Some(Route::Patients))]
    #[case("/patients/42", Some(Route::PatientProfile(42)))]
    #[case("/patients/abc", None)]
    #[case("/appointments", Some(Route::Appointments))]
    #[case("/users", Some(Route::Users))]
    #[case("/settings", None)]
    fn test_parse(#[case] path: &str, #[case] expected: Option<Route>) {
        assert_eq!(Route::parse(path), expected);
        if let Some(route) = expected {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn test_login_is_never_guarded() {
        assert_eq!(evaluate(Route::Login, None), GuardDecision::Allow);
        assert_eq!(evaluate(Route::Login, Some(&identity("nurse"))), GuardDecision::Allow);
    }

    #[test]
    fn test_anonymous_goes_to_login() {
        for route in MENU {
            assert_eq!(
                evaluate(route, None),
                GuardDecision::Redirect { to: Route::Login, replace: true }
            );
        }
    }

    #[rstest]
    #[case("admin", Route::Users, GuardDecision::Allow)]
    #[case("doctor", Route::Users, GuardDecision::Redirect { to: Route::Dashboard, replace: true })]
    #[case("receptionist", Route::Users, GuardDecision::Redirect { to: Route::Dashboard, replace: true })]
    #[case("doctor", Route::Appointments, GuardDecision::Allow)]
    #[case("receptionist", Route::PatientProfile(3), GuardDecision::Allow)]
    fn test_role_guard(#[case] role: &str, #[case] route: Route, #[case] expected: GuardDecision) {
        assert_eq!(evaluate(route, Some(&identity(role))), expected);
    }

    #[test]
    fn test_receptionist_redirected_from_users() {
        let mut nav = Navigator::new();
        let receptionist = identity("receptionist");

        nav.navigate(Route::Patients, Some(&receptionist));
        let outcome = nav.navigate(Route::Users, Some(&receptionist));

        assert_eq!(outcome, Navigation::Redirected { from: Route::Users, to: Route::Dashboard });
        assert_eq!(nav.history(), &[Route::Patients, Route::Dashboard]);
    }

    #[test]
    fn test_unknown_role_ends_on_login() {
        let mut nav = Navigator::new();
        let outcome = nav.navigate(Route::Appointments, Some(&identity("nurse")));
        assert_eq!(outcome.route(), Route::Login);
        assert!(Navigator::menu(Some(&identity("nurse"))).is_empty());
    }

    #[test]
    fn test_revalidate_after_logout() {
        let mut nav = Navigator::new();
        assert_eq!(nav.revalidate(None), None);

        let admin = identity("admin");
        nav.navigate(Route::Dashboard, Some(&admin));
        nav.navigate(Route::Users, Some(&admin));
        assert_eq!(nav.revalidate(Some(&admin)), Some(Navigation::Rendered(Route::Users)));

        let outcome = nav.revalidate(None);
        assert_eq!(outcome, Some(Navigation::Redirected { from: Route::Users, to: Route::Login }));
        assert_eq!(nav.history(), &[Route::Dashboard, Route::Login]);
    }

    #[test]
    fn test_back_cannot_return_to_refused_page() {
        let mut nav = Navigator::new();
        let admin = identity("admin");
        nav.navigate(Route::Users, Some(&admin));
        nav.navigate(Route::Patients, Some(&admin));

        // Demoted while on the patients page
        let doctor = identity("doctor");
        let outcome = nav.back(Some(&doctor));
        assert_eq!(outcome, Some(Navigation::Redirected { from: Route::Users, to: Route::Dashboard }));
        assert_eq!(nav.back(Some(&doctor)), None);
    }

    #[test]
    fn test_menu_follows_policy() {
        let labels = |role: &str| -> Vec<&'static str> {
            Navigator::menu(Some(&identity(role))).iter().map(|e| e.label).collect()
        };

        assert_eq!(labels("admin"), vec!["Dashboard", "Patients", "Appointments", "Users"]);
        assert_eq!(labels("doctor"), vec!["Dashboard", "Patients", "Appointments"]);
        assert_eq!(labels("receptionist"), vec!["Dashboard", "Patients", "Appointments"]);
        assert!(Navigator::menu(None).is_empty());
    }
}
