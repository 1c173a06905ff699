// admin-client/src/views/users.rs
use actix::prelude::*;
use common::StaffUser;
use serde_json::Value;

use super::{refuse, Unmount, ViewContext};
use crate::error::ClientError;
use crate::policy::Capability;
use crate::validation::{NewUserForm, ValidationErrors};

pub const CREATED: &str = "User created successfully";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersState {
    pub loading: bool,
    pub error: Option<String>,
    pub users: Vec<StaffUser>,
    pub form_errors: Option<ValidationErrors>,
    /// Why the service refused the last submission
    pub submit_error: Option<String>,
}

#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct LoadUsers;

#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct CreateUser {
    pub form: NewUserForm,
}

#[derive(Message)]
#[rtype(result = "UsersState")]
pub struct GetUsers;

/// Staff administration
pub struct UsersView {
    context: ViewContext,
    state: UsersState,
}

impl UsersView {
    pub fn new(context: ViewContext) -> Self {
        Self {
            context,
            state: UsersState::default(),
        }
    }
}

impl Actor for UsersView {
    type Context = Context<Self>;
}

impl Handler<LoadUsers> for UsersView {
    type Result = ResponseActFuture<Self, Result<(), ClientError>>;

    fn handle(&mut self, _msg: LoadUsers, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::ViewUsers) {
            return refuse(e);
        }

        self.state.loading = true;
        self.state.error = None;
        let api = self.context.api.clone();

        Box::pin(
            async move { api.get::<Vec<StaffUser>>("/users").await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    act.state.loading = false;
                    match result {
                        Ok(users) => {
                            act.state.users = users;
                            Ok(())
                        }
                        Err(e) => {
                            act.state.error = Some(e.to_string());
                            act.context.report_failure(&e);
                            Err(e)
                        }
                    }
                }),
        )
    }
}

impl Handler<CreateUser> for UsersView {
    type Result = ResponseActFuture<Self, Result<(), ClientError>>;

    fn handle(&mut self, msg: CreateUser, _ctx: &mut Self::Context) -> Self::Result {
        if let Err(e) = self.context.authorize(Capability::CreateUser) {
            return refuse(e);
        }

        self.state.submit_error = None;
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
            async move { api.post::<Value, _>("/users", &body).await }
                .into_actor(self)
                .map(|result, act, ctx| match result {
                    Ok(_) => {
                        act.context.notifications.success(CREATED);
                        ctx.notify(LoadUsers);
                        Ok(())
                    }
                    Err(e) => {
                        act.state.submit_error = Some(e.to_string());
                        act.context.report_failure(&e);
                        Err(e)
                    }
                }),
        )
    }
}

impl Handler<GetUsers> for UsersView {
    type Result = MessageResult<GetUsers>;

    fn handle(&mut self, _msg: GetUsers, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Unmount> for UsersView {
    type Result = ();

    fn handle(&mut self, _msg: Unmount, ctx: &mut Self::Context) {
        ctx.stop();
    }
}
