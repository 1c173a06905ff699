// admin-client/src/cli.rs
//! Terminal front-end. Every command is a navigation through the [`Shell`].
use actix::prelude::*;
use clap::{Parser, Subcommand};
use common::{local_now, Config};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::guards::{Navigation, Navigator, Route};
use crate::notification::NotificationHandle;
use crate::render;
use crate::session::{FileStorage, SessionStore};
use crate::shell::{MountedView, Navigate, Shell};
use crate::validation::{NewAppointmentForm, NewPatientForm, NewUserForm};
use crate::views::{
    CreateAppointment, CreatePatient, CreateUser, GetAppointments, GetDashboard, GetPatients, GetUsers,
    LoadAppointments, LoadDashboard, LoadPatientProfile, LoadPatients, LoadUsers, SubmitLogin, ViewContext,
};

#[derive(Parser, Debug)]
#[command(name = "clinic-admin", author, version, about = "Clinic administration from the terminal", long_about = None)]
pub struct Cli {
    /// Base URL of the clinic service
    #[arg(long)]
    pub api_url: Option<String>,

    /// File holding the persisted session
    #[arg(long, value_name = "FILE")]
    pub session_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log at debug level
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange credentials for a session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in staff member and what they may do
    Whoami,
    /// Totals and today's appointments
    Dashboard,
    Patients {
        #[command(subcommand)]
        action: Option<PatientsCommand>,
    },
    Appointments {
        #[command(subcommand)]
        action: Option<AppointmentsCommand>,
    },
    /// Staff administration (admin only)
    Users {
        #[command(subcommand)]
        action: Option<UsersCommand>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PatientsCommand {
    List,
    Show {
        id: u64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date_of_birth: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AppointmentsCommand {
    List,
    Create {
        #[arg(long)]
        patient_id: u64,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: String,
        #[arg(long, value_name = "HH:mm")]
        time: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: String,
    },
}

impl Cli {
    /// Command-line flags win over configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(file) = &self.session_file {
            config.session.file = file.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = Some(timeout);
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("redirected from {from} to {to}")]
    Redirected { from: Route, to: Route },
    #[error("not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("view unavailable: {0}")]
    Mailbox(#[from] MailboxError),
    #[error("{0} did not mount the expected view")]
    UnexpectedView(Route),
}

impl CommandError {
    /// 2 when the client refused locally, 1 when the service or transport failed
    pub fn exit_status(&self) -> u8 {
        match self {
            CommandError::Redirected { .. } | CommandError::NotLoggedIn => 2,
            CommandError::Client(e) if e.is_local() => 2,
            _ => 1,
        }
    }
}

/// Run one command against the configured service
pub async fn run(cli: Cli, config: Config) -> ExitCode {
    let storage = Arc::new(FileStorage::new(&config.session.file));
    let session = SessionStore::with_key(storage, config.session.key.clone());

    let api = match ApiClient::from_config(&config, session) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("invalid api_base_url '{}': {}", config.api_base_url, e);
            return ExitCode::from(2);
        }
    };

    let notifications = NotificationHandle::start(config.notification_ttl());
    let context = ViewContext::new(api, notifications.clone());
    let shell = shell_for(&config, context.clone()).start();

    let result = execute(&shell, &context, cli.command).await;

    if let Some(notification) = notifications.current().await {
        eprintln!("{}", render::notification(&notification));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let CommandError::Client(ClientError::Validation(errors)) = &e {
                eprint!("{}", render::validation(errors));
            } else {
                eprintln!("{}", e);
            }
            ExitCode::from(e.exit_status())
        }
    }
}

/// Shell that also follows session changes made by other processes
pub fn shell_for(config: &Config, context: ViewContext) -> Shell {
    Shell::new(context).watching(config.session_poll_interval())
}

async fn open(shell: &Addr<Shell>, route: Route) -> Result<MountedView, CommandError> {
    match shell.send(Navigate(route)).await? {
        Navigation::Rendered(_) => {}
        Navigation::Redirected { from, to } => return Err(CommandError::Redirected { from, to }),
    }

    shell
        .send(crate::shell::CurrentView)
        .await?
        .ok_or(CommandError::UnexpectedView(route))
}

pub async fn execute(shell: &Addr<Shell>, context: &ViewContext, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Login { email, password } => {
            let MountedView::Login(view) = open(shell, Route::Login).await? else {
                return Err(CommandError::UnexpectedView(Route::Login));
            };
            let identity = view.send(SubmitLogin { email, password }).await??;
            print!("{}", render::identity(&identity));
            Ok(())
        }

        Command::Logout => {
            shell.send(crate::shell::Logout).await?;
            println!("Logged out");
            Ok(())
        }

        Command::Whoami => {
            let identity = context.identity().ok_or(CommandError::NotLoggedIn)?;
            print!("{}", render::identity(&identity));
            println!("Menu: {}", render::menu(&Navigator::menu(Some(&identity))));
            Ok(())
        }

        Command::Dashboard => {
            let MountedView::Dashboard(view) = open(shell, Route::Dashboard).await? else {
                return Err(CommandError::UnexpectedView(Route::Dashboard));
            };
            let loaded = view.send(LoadDashboard).await?;
            let state = view.send(GetDashboard).await?;
            print!("{}", render::dashboard(&state));
            loaded.map_err(Into::into)
        }

        Command::Patients { action } => patients(shell, action.unwrap_or(PatientsCommand::List)).await,
        Command::Appointments { action } => appointments(shell, action.unwrap_or(AppointmentsCommand::List)).await,
        Command::Users { action } => users(shell, action.unwrap_or(UsersCommand::List)).await,
    }
}

async fn patients(shell: &Addr<Shell>, action: PatientsCommand) -> Result<(), CommandError> {
    match action {
        PatientsCommand::List => {
            let MountedView::Patients(view) = open(shell, Route::Patients).await? else {
                return Err(CommandError::UnexpectedView(Route::Patients));
            };
            let loaded = view.send(LoadPatients).await?;
            let state = view.send(GetPatients).await?;
            if loaded.is_ok() {
                print!("{}", render::patients(&state.patients));
            }
            loaded.map_err(Into::into)
        }
        PatientsCommand::Show { id } => {
            let route = Route::PatientProfile(id);
            let MountedView::PatientProfile { view, .. } = open(shell, route).await? else {
                return Err(CommandError::UnexpectedView(route));
            };
            let patient = view.send(LoadPatientProfile { id }).await??;
            print!("{}", render::patient(&patient));
            Ok(())
        }
        PatientsCommand::Create {
            name,
            email,
            phone,
            date_of_birth,
        } => {
            let MountedView::Patients(view) = open(shell, Route::Patients).await? else {
                return Err(CommandError::UnexpectedView(Route::Patients));
            };
            let form = NewPatientForm {
                name,
                email,
                phone,
                date_of_birth,
            };
            let patient = view.send(CreatePatient { form }).await??;
            print!("{}", render::patient(&patient));
            Ok(())
        }
    }
}

async fn appointments(shell: &Addr<Shell>, action: AppointmentsCommand) -> Result<(), CommandError> {
    let MountedView::Appointments(view) = open(shell, Route::Appointments).await? else {
        return Err(CommandError::UnexpectedView(Route::Appointments));
    };

    match action {
        AppointmentsCommand::List => {
            let loaded = view.send(LoadAppointments).await?;
            let state = view.send(GetAppointments).await?;
            // Status is derived here, at render time
            print!("{}", render::appointments(&state, local_now()));
            loaded.map_err(Into::into)
        }
        AppointmentsCommand::Create { patient_id, date, time } => {
            let form = NewAppointmentForm {
                patient_id: Some(patient_id),
                date,
                time,
            };
            view.send(CreateAppointment { form }).await??;
            Ok(())
        }
    }
}

async fn users(shell: &Addr<Shell>, action: UsersCommand) -> Result<(), CommandError> {
    let MountedView::Users(view) = open(shell, Route::Users).await? else {
        return Err(CommandError::UnexpectedView(Route::Users));
    };

    match action {
        UsersCommand::List => {
            let loaded = view.send(LoadUsers).await?;
            let state = view.send(GetUsers).await?;
            if loaded.is_ok() {
                print!("{}", render::users(&state.users));
            }
            loaded.map_err(Into::into)
        }
        UsersCommand::Create {
            name,
            email,
            password,
            role,
        } => {
            let form = NewUserForm {
                name,
                email,
                password,
                role,
            };
            view.send(CreateUser { form }).await??;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::Fixture;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from([
            "clinic-admin",
            "--api-url",
            "http://localhost:9000/api",
            "appointments",
            "create",
            "--patient-id",
            "3",
            "--date",
            "2024-06-01",
            "--time",
            "09:30",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Appointments { action: Some(AppointmentsCommand::Create { patient_id: 3, .. }) }
        ));

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.api_base_url, "http://localhost:9000/api");

        let cli = Cli::try_parse_from(["clinic-admin", "patients"]).unwrap();
        assert!(matches!(cli.command, Command::Patients { action: None }));
        assert!(Cli::try_parse_from(["clinic-admin", "login", "--email", "a@b.co"]).is_err());
    }

    #[actix_rt::test]
    async fn test_denied_command_is_a_redirect() {
        let fx = Fixture::as_role("doctor");
        let shell = Shell::new(fx.context.clone()).start();

        let err = execute(&shell, &fx.context, Command::Users { action: None }).await.unwrap_err();
        assert!(matches!(err, CommandError::Redirected { from: Route::Users, to: Route::Dashboard }));
        assert_eq!(err.exit_status(), 2);
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[actix_rt::test]
    async fn test_doctor_booking_is_denied_locally() {
        let fx = Fixture::as_role("doctor");
        let shell = Shell::new(fx.context.clone()).start();
        let command = Command::Appointments {
            action: Some(AppointmentsCommand::Create {
                patient_id: 1,
                date: "2024-06-01".into(),
                time: "09:00".into(),
            }),
        };

        let err = execute(&shell, &fx.context, command).await.unwrap_err();
        assert!(matches!(err, CommandError::Client(ClientError::AuthorizationDenied { .. })));
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[actix_rt::test]
    async fn test_login_then_whoami() {
        let fx = Fixture::as_role("admin");
        fx.session.clear();
        fx.transport.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({ "id": 9, "name": "Ada", "role": "admin", "token": "tok" }),
        );
        let shell = Shell::new(fx.context.clone()).start();

        let err = execute(&shell, &fx.context, Command::Whoami).await.unwrap_err();
        assert!(matches!(err, CommandError::NotLoggedIn));

        let login = Command::Login {
            email: "ada@clinic.test".into(),
            password: "pw".into(),
        };
        execute(&shell, &fx.context, login).await.unwrap();
        execute(&shell, &fx.context, Command::Whoami).await.unwrap();
        assert_eq!(fx.session.get().map(|i| i.id), Some(9));
    }

    #[actix_rt::test]
    async fn test_configured_shell_follows_other_process() {
        use crate::session::FileStorage;
        use crate::testing::{identity, MockTransport};
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.session.file = dir.path().join("session.json");
        config.session.poll_ms = 50;

        let session = SessionStore::new(Arc::new(FileStorage::new(&config.session.file)));
        let elsewhere = SessionStore::new(Arc::new(FileStorage::new(&config.session.file)));
        session.set(&identity("receptionist")).unwrap();

        let api = ApiClient::new("http://clinic.test/api", MockTransport::new(), session).unwrap();
        let context = ViewContext::new(api, NotificationHandle::start(Duration::from_secs(10)));
        let shell = shell_for(&config, context).start();
        shell.send(Navigate(Route::Patients)).await.unwrap();

        elsewhere.clear();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let current = shell.send(crate::shell::CurrentView).await.unwrap().map(|v| v.route());
        assert_eq!(current, Some(Route::Login));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(CommandError::NotLoggedIn.exit_status(), 2);
        let network = CommandError::Client(ClientError::Network("down".into()));
        assert_eq!(network.exit_status(), 1);
        let invalid = CommandError::Client(ClientError::Validation(Default::default()));
        assert_eq!(invalid.exit_status(), 2);
    }
}
