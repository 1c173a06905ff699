// admin-client/src/views/appointments.rs
use actix::prelude::*;
use chrono::NaiveDateTime;
use common::{Appointment, EffectiveStatus, Patient};
use serde_json::Value;

use super::{refuse, Unmount, ViewContext};
use crate::error::ClientError;
use crate::policy::Capability;
use crate::status::effective_status;
use crate::validation::{NewAppointmentForm, ValidationErrors};

pub const CREATED: &str = "Appointment created successfully!";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentsState {
    pub loading: bool,
    pub error: Option<String>,
    pub appointments: Vec<Appointment>,
    /// Choices for the booking form
    pub patients: Vec<Patient>,
    pub can_create: bool,
    pub form_errors: Option<ValidationErrors>,
    pub submitting: bool,
}

/// An appointment with its status derived at render time
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRow<'a> {
    pub appointment: &'a Appointment,
    pub status: EffectiveStatus,
}

impl AppointmentsState {
    /// Rows for display; the stored status is never consulted
    pub fn rows(&self, now: NaiveDateTime) -> Vec<AppointmentRow<'_>> {
        self.appointments
            .iter()
            .map(|appointment| AppointmentRow {
                appointment,
                status: effective_status(appointment, now),
            })
            .collect()
    }
}

#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct LoadAppointments;

#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct CreateAppointment {
    pub form: NewAppointmentForm,
}

#[derive(Message)]
#[rtype(result = "AppointmentsState")]
pub struct GetAppointments;

pub struct AppointmentsView {
    context: ViewContext,
    state: AppointmentsState,
}

impl AppointmentsView {
    pub fn new(context: ViewContext) -> Self {
        Self {
            context,
            state: AppointmentsState::default(),
        }
    }
}

impl Actor for AppointmentsView {
    type Context = Context<Self>;
}

impl Handler<LoadAppointments> for AppointmentsView {
    type Result = ResponseActFuture<Self, Result<(), ClientError>>;

    fn handle(&mut self, _msg: LoadAppointments, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::ViewAppointments) {
            return refuse(e);
        }

        self.state.loading = true;
        self.state.error = None;
        self.state.can_create = self.context.can(Capability::CreateAppointment);
        let api = self.context.api.clone();

        // Both calls are in flight together; either may finish first
        let fetch = async move {
            let (appointments, patients) = futures::join!(
                api.get::<Vec<Appointment>>("/appointments"),
                api.get::<Vec<Patient>>("/patients")
            );
            Ok::<_, ClientError>((appointments?, patients?))
        };

        Box::pin(fetch.into_actor(self).map(|result, act, _ctx| {
            act.state.loading = false;
            match result {
                Ok((appointments, patients)) => {
                    tracing::debug!("Loaded {} appointments, {} patients", appointments.len(), patients.len());
                    act.state.appointments = appointments;
                    act.state.patients = patients;
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!("Appointments load failed: {}", e);
                    act.state.error = Some(e.to_string());
                    act.context.report_failure(&e);
                    Err(e)
                }
            }
        }))
    }
}

impl Handler<CreateAppointment> for AppointmentsView {
    type Result = ResponseActFuture<Self, Result<(), ClientError>>;

    fn handle(&mut self, msg: CreateAppointment, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::CreateAppointment) {
            return refuse(e);
        }

        let body = match msg.form.validate() {
            Ok(body) => body,
            Err(errors) => {
                self.state.form_errors = Some(errors.clone());
                return refuse(ClientError::Validation(errors));
            }
        };

        self.state.form_errors = None;
        self.state.submitting = true;
        let api = self.context.api.clone();

        Box::pin(
            async move { api.post::<Value, _>("/appointments", &body).await }
                .into_actor(self)
                .map(|result, act, ctx| {
                    act.state.submitting = false;
                    match result {
                        Ok(_) => {
                            act.context.notifications.success(CREATED);
                            ctx.notify(LoadAppointments);
                            Ok(())
                        }
                        Err(e) => {
                            tracing::warn!("Appointment creation failed: {}", e);
                            act.context.report_failure(&e);
                            Err(e)
                        }
                    }
                }),
        )
    }
}

impl Handler<GetAppointments> for AppointmentsView {
    type Result = MessageResult<GetAppointments>;

    fn handle(&mut self, _msg: GetAppointments, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Unmount> for AppointmentsView {
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
    use chrono::NaiveDate;
    use reqwest::Method;
    use serde_json::json;
    use std::time::Duration;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_hms_opt(14, 30, 0).unwrap()
    }

    fn appointments() -> Value {
        json!([
            { "id": 1, "patient_id": 1, "patient_name": "Ann", "date": "2024-05-09", "time": "23:59", "status": "scheduled" },
            { "id": 2, "patient_id": 2, "patient_name": "Bo", "date": "2024-05-10", "time": "14:30", "status": "scheduled" },
            { "id": 3, "patient_id": 1, "patient_name": "Ann", "date": "2024-05-10T00:00:00.000Z", "time": "14:31", "status": "completed" },
            { "id": 4, "patient_id": 2, "patient_name": "Bo", "date": null, "time": null }
        ])
    }

    #[actix_rt::test]
    async fn test_completion_order_does_not_lose_fields() {
        let fx = Fixture::as_role("receptionist");
        // Issued first, answered last
        fx.transport
            .respond_after(Method::GET, "/appointments", 200, appointments(), Duration::from_millis(60));
        fx.transport
            .respond(Method::GET, "/patients", 200, json!([{ "id": 1, "name": "Ann" }, { "id": 2, "name": "Bo" }]));
        let view = AppointmentsView::new(fx.context.clone()).start();

        view.send(LoadAppointments).await.unwrap().unwrap();
        let state = view.send(GetAppointments).await.unwrap();

        assert_eq!(state.appointments.len(), 4);
        assert_eq!(state.patients.len(), 2);
        assert!(state.can_create);
        assert!(!state.loading);
    }

    #[actix_rt::test]
    async fn test_rows_derive_status_at_render_time() {
        let fx = Fixture::as_role("doctor");
        fx.transport.respond(Method::GET, "/appointments", 200, appointments());
        fx.transport.respond(Method::GET, "/patients", 200, json!([]));
        let view = AppointmentsView::new(fx.context.clone()).start();
        view.send(LoadAppointments).await.unwrap().unwrap();
        let state = view.send(GetAppointments).await.unwrap();

        let statuses: Vec<EffectiveStatus> = state.rows(now()).iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                EffectiveStatus::Completed,
                EffectiveStatus::Completed,
                EffectiveStatus::Pending,
                EffectiveStatus::Pending
            ]
        );
        assert!(!state.can_create);
    }

    #[actix_rt::test]
    async fn test_doctor_cannot_book() {
        let fx = Fixture::as_role("doctor");
        let view = AppointmentsView::new(fx.context.clone()).start();
        let form = NewAppointmentForm {
            patient_id: Some(1),
            date: "2024-06-01".into(),
            time: "09:00".into(),
        };

        let err = view.send(CreateAppointment { form }).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::AuthorizationDenied { capability: Capability::CreateAppointment, .. }));
        assert_eq!(fx.transport.call_count(), 0);
        assert_eq!(fx.notification().await, None);
    }

    #[actix_rt::test]
    async fn test_invalid_form_stays_inline() {
        let fx = Fixture::as_role("receptionist");
        let view = AppointmentsView::new(fx.context.clone()).start();

        let err = view
            .send(CreateAppointment { form: NewAppointmentForm::default() })
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let state = view.send(GetAppointments).await.unwrap();
        let errors = state.form_errors.unwrap();
        assert!(errors.get("patient_id").is_some());
        assert_eq!(fx.transport.call_count(), 0);
        assert_eq!(fx.notification().await, None);
    }

    #[actix_rt::test]
    async fn test_create_notifies_and_reloads() {
        let fx = Fixture::as_role("receptionist");
        fx.transport.respond(Method::POST, "/appointments", 201, json!({ "id": 5 }));
        fx.transport.respond(Method::GET, "/appointments", 200, appointments());
        fx.transport.respond(Method::GET, "/patients", 200, json!([]));
        let view = AppointmentsView::new(fx.context.clone()).start();

        let form = NewAppointmentForm {
            patient_id: Some(2),
            date: "2024-06-01".into(),
            time: "09:00".into(),
        };
        view.send(CreateAppointment { form }).await.unwrap().unwrap();
        assert_eq!(fx.notification().await, Some((NotificationKind::Success, CREATED.to_string())));

        tokio::time::sleep(Duration::from_millis(30)).await;
        let state = view.send(GetAppointments).await.unwrap();
        assert_eq!(state.appointments.len(), 4);
        assert_eq!(
            fx.transport.calls()[0].body,
            Some(json!({ "patient_id": 2, "date": "2024-06-01", "time": "09:00" }))
        );
    }

    #[actix_rt::test]
    async fn test_unmounted_view_discards_late_result() {
        let fx = Fixture::as_role("admin");
        fx.transport
            .fail_after(Method::GET, "/appointments", "connection reset", Duration::from_millis(80));
        fx.transport.respond(Method::GET, "/patients", 200, json!([]));
        let view = AppointmentsView::new(fx.context.clone()).start();

        view.do_send(LoadAppointments);
        tokio::time::sleep(Duration::from_millis(20)).await;
        view.send(Unmount).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!view.connected());
        assert_eq!(fx.notification().await, None);
        assert!(fx.session.is_authenticated());
    }
}
