// admin-client/src/views/patients.rs
use actix::prelude::*;
use common::Patient;

use super::{refuse, Unmount, ViewContext};
use crate::error::ClientError;
use crate::policy::Capability;
use crate::validation::{NewPatientForm, ValidationErrors};

pub const CREATED: &str = "Patient created successfully";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientsState {
    pub loading: bool,
    pub error: Option<String>,
    pub patients: Vec<Patient>,
    /// Profile opened through `/patients/{id}`
    pub selected: Option<Patient>,
    pub can_create: bool,
    pub form_errors: Option<ValidationErrors>,
}

#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct LoadPatients;

#[derive(Message)]
#[rtype(result = "Result<Patient, ClientError>")]
pub struct LoadPatientProfile {
    pub id: u64,
}

#[derive(Message)]
#[rtype(result = "Result<Patient, ClientError>")]
pub struct CreatePatient {
    pub form: NewPatientForm,
}

#[derive(Message)]
#[rtype(result = "PatientsState")]
pub struct GetPatients;

pub struct PatientsView {
    context: ViewContext,
    state: PatientsState,
}

impl PatientsView {
    pub fn new(context: ViewContext) -> Self {
        Self {
            context,
            state: PatientsState::default(),
        }
    }

    fn fail<T>(&mut self, error: ClientError) -> Result<T, ClientError> {
        self.state.error = Some(error.to_string());
        self.context.report_failure(&error);
        Err(error)
    }
}

impl Actor for PatientsView {
    type Context = Context<Self>;
}

impl Handler<LoadPatients> for PatientsView {
    type Result = ResponseActFuture<Self, Result<(), ClientError>>;

    fn handle(&mut self, _msg: LoadPatients, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::ViewPatients) {
            return refuse(e);
        }

        self.state.loading = true;
        self.state.error = None;
        self.state.can_create = self.context.can(Capability::CreatePatient);
        let api = self.context.api.clone();

        Box::pin(
            async move { api.get::<Vec<Patient>>("/patients").await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    act.state.loading = false;
                    match result {
                        Ok(patients) => {
                            act.state.patients = patients;
                            Ok(())
                        }
                        Err(e) => act.fail(e),
                    }
                }),
        )
    }
}

impl Handler<LoadPatientProfile> for PatientsView {
    type Result = ResponseActFuture<Self, Result<Patient, ClientError>>;

    fn handle(&mut self, msg: LoadPatientProfile, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::ViewPatientProfile) {
            return refuse(e);
        }

        self.state.loading = true;
        self.state.error = None;
        let api = self.context.api.clone();
        let path = format!("/patients/{}", msg.id);

        Box::pin(
            async move { api.get::<Patient>(&path).await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    act.state.loading = false;
                    match result {
                        Ok(patient) => {
                            act.state.selected = Some(patient.clone());
                            Ok(patient)
                        }
                        Err(e) => act.fail(e),
                    }
                }),
        )
    }
}

impl Handler<CreatePatient> for PatientsView {
    type Result = ResponseActFuture<Self, Result<Patient, ClientError>>;

    fn handle(&mut self, msg: CreatePatient, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::CreatePatient) {
            return refuse(e);
        }

        let body = match msg.form.validate() {
            Ok(body) => body,
            Err(errors) => {
                self.state.form_errors = Some(errors.clone());
                return refuse(errors.into());
            }
        };
        self.state.form_errors = None;
        let api = self.context.api.clone();

        Box::pin(
            async move { api.post::<Patient, _>("/patients", &body).await }
                .into_actor(self)
                .map(|result, act, _ctx| match result {
                    Ok(patient) => {
                        tracing::info!("Registered patient {}", patient.id);
                        act.context.notifications.success(CREATED);
                        act.state.patients.push(patient.clone());
                        Ok(patient)
                    }
                    Err(e) => {
                        act.context.report_failure(&e);
                        Err(e)
                    }
                }),
        )
    }
}

impl Handler<GetPatients> for PatientsView {
    type Result = MessageResult<GetPatients>;

    fn handle(&mut self, _msg: GetPatients, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Unmount> for PatientsView {
    type Result = ();

    fn handle(&mut self, _msg: Unmount, ctx: &mut Self::Context) {
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use crate::views::test_support::Fixture;
    use reqwest::Method;
    use serde_json::json;

    #[actix_rt::test]
    async fn test_list_and_profile() {
        let fx = Fixture::as_role("doctor");
        fx.transport.respond(Method::GET, "/patients", 200, json!([{ "id": 7, "name": "Cy" }]));
        fx.transport.respond(
            Method::GET,
            "/patients/7",
            200,
            json!({ "id": 7, "name": "Cy", "phone": "555-0100" }),
        );
        let view = PatientsView::new(fx.context.clone()).start();

        view.send(LoadPatients).await.unwrap().unwrap();
        let patient = view.send(LoadPatientProfile { id: 7 }).await.unwrap().unwrap();
        assert_eq!(patient.phone.as_deref(), Some("555-0100"));

        let state = view.send(GetPatients).await.unwrap();
        assert_eq!(state.patients.len(), 1);
        assert_eq!(state.selected, Some(patient));
        assert!(state.can_create);
    }

    #[actix_rt::test]
    async fn test_missing_profile_is_request_error() {
        let fx = Fixture::as_role("receptionist");
        let view = PatientsView::new(fx.context.clone()).start();

        let err = view.send(LoadPatientProfile { id: 99 }).await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "not found");
        assert_eq!(fx.notification().await, Some((NotificationKind::Error, "not found".to_string())));
        assert!(fx.session.is_authenticated());
    }

    #[actix_rt::test]
    async fn test_create_requires_name() {
        let fx = Fixture::as_role("admin");
        let view = PatientsView::new(fx.context.clone()).start();

        let err = view.send(CreatePatient { form: NewPatientForm::default() }).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[actix_rt::test]
    async fn test_create_success() {
        let fx = Fixture::as_role("admin");
        fx.transport.respond(Method::POST, "/patients", 201, json!({ "id": 8, "name": "Dee" }));
        let view = PatientsView::new(fx.context.clone()).start();

        let form = NewPatientForm {
            name: "Dee".into(),
            ..Default::default()
        };
        let patient = view.send(CreatePatient { form }).await.unwrap().unwrap();
        assert_eq!(patient.id, 8);
        assert_eq!(fx.notification().await, Some((NotificationKind::Success, CREATED.to_string())));
    }
}
