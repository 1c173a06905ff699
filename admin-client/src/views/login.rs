// admin-client/src/views/login.rs
use actix::prelude::*;
use common::Identity;

use super::{Unmount, ViewContext};
use crate::auth::AuthGateway;
use crate::error::ClientError;

pub const LOGGED_IN: &str = "Login successful!";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginState {
    pub submitting: bool,
    pub error: Option<String>,
}

#[derive(Message)]
#[rtype(result = "Result<Identity, ClientError>")]
pub struct SubmitLogin {
    pub email: String,
    pub password: String,
}

#[derive(Message)]
#[rtype(result = "LoginState")]
pub struct GetLogin;

/// Login form. Failures never touch the session.
pub struct LoginView {
    context: ViewContext,
    auth: AuthGateway,
    state: LoginState,
}

impl LoginView {
    pub fn new(context: ViewContext) -> Self {
        let auth = AuthGateway::new(context.api.clone());
        Self {
            context,
            auth,
            state: LoginState::default(),
        }
    }
}

impl Actor for LoginView {
    type Context = Context<Self>;
}

impl Handler<SubmitLogin> for LoginView {
    type Result = ResponseActFuture<Self, Result<Identity, ClientError>>;

    fn handle(&mut self, msg: SubmitLogin, _ctx: &mut Self::Context) -> Self::Result {
        self.state.submitting = true;
        self.state.error = None;
        let auth = self.auth.clone();

        Box::pin(
            async move { auth.login(&msg.email, &msg.password).await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    act.state.submitting = false;
                    match &result {
                        Ok(_) => act.context.notifications.success(LOGGED_IN),
                        Err(e) => {
                            let message = e.to_string();
                            if !e.is_local() {
                                act.context.notifications.error(message.clone());
                            }
                            act.state.error = Some(message);
                        }
                    }
                    result
                }),
        )
    }
}

impl Handler<GetLogin> for LoginView {
    type Result = MessageResult<GetLogin>;

    fn handle(&mut self, _msg: GetLogin, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Unmount> for LoginView {
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

    fn submit(email: &str, password: &str) -> SubmitLogin {
        SubmitLogin {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_missing_fields_inline_only() {
        let fx = Fixture::as_role("admin");
        let view = LoginView::new(fx.context.clone()).start();

        view.send(submit("", "x")).await.unwrap().unwrap_err();
        let state = view.send(GetLogin).await.unwrap();
        assert_eq!(state.error.as_deref(), Some("Email and password are required"));
        assert_eq!(fx.notification().await, None);
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[actix_rt::test]
    async fn test_rejected_login_keeps_session() {
        let fx = Fixture::as_role("admin");
        fx.transport.respond(Method::POST, "/auth/login", 401, json!({ "message": "invalid credentials" }));
        let view = LoginView::new(fx.context.clone()).start();

        view.send(submit("a@b.co", "bad")).await.unwrap().unwrap_err();
        assert_eq!(
            fx.notification().await,
            Some((NotificationKind::Error, "invalid credentials".to_string()))
        );
        assert!(fx.session.is_authenticated());
    }

    #[actix_rt::test]
    async fn test_success_notifies() {
        let fx = Fixture::as_role("admin");
        fx.session.clear();
        fx.transport.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({ "id": 2, "name": "Doc", "role": "doctor", "token": "tok" }),
        );
        let view = LoginView::new(fx.context.clone()).start();

        let identity = view.send(submit("doc@clinic.test", "pw")).await.unwrap().unwrap();
        assert_eq!(identity.role, "doctor");
        assert_eq!(fx.notification().await, Some((NotificationKind::Success, LOGGED_IN.to_string())));
        assert_eq!(fx.session.get(), Some(identity));
    }
}
