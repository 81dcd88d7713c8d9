//! One binding per REST operation.
//!
//! Each method only describes the call (verb, path, parameters, body,
//! documented errors) and returns a [`Call`] for the caller to await. Errors
//! pass through from the client untouched.

use uuid::Uuid;

use crate::client::{ApiClient, Call};
use crate::http::HttpMethod;
use crate::request::RequestSpec;
use crate::types::{
    LoginForm, Message, Token, UpdatePassword, UserCreate, UserPublic, UserUpdate, UserUpdateMe,
    UsersPublic,
};

pub const DEFAULT_SKIP: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 100;

const LOGIN_ERRORS: &[(u16, &str)] = &[
    (400, "Incorrect email or password"),
    (422, "Validation Error"),
];
const VALIDATION_ERRORS: &[(u16, &str)] = &[(422, "Validation Error")];
const WRITE_ERRORS: &[(u16, &str)] = &[(409, "Conflict"), (422, "Validation Error")];
const PASSWORD_ERRORS: &[(u16, &str)] = &[(400, "Incorrect password"), (422, "Validation Error")];
const BY_ID_ERRORS: &[(u16, &str)] = &[(404, "Not Found"), (422, "Validation Error")];
const UPDATE_BY_ID_ERRORS: &[(u16, &str)] = &[
    (404, "Not Found"),
    (409, "Conflict"),
    (422, "Validation Error"),
];
const ME_ERRORS: &[(u16, &str)] = &[(401, "Not authenticated")];

#[derive(Debug, Clone, Copy)]
pub struct LoginService<'a> {
    client: &'a ApiClient,
}

impl<'a> LoginService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// OAuth2 password grant. Sent without a bearer token.
    pub fn access_token(&self, form: &LoginForm) -> Call<'a, Token> {
        self.client.call(Ok(RequestSpec::new(HttpMethod::Post, "/login/access-token")
            .form(form.to_pairs())
            .unauthenticated()
            .errors(LOGIN_ERRORS)))
    }

    /// Echoes the user the current token belongs to.
    pub fn test_token(&self) -> Call<'a, UserPublic> {
        let spec = RequestSpec::new(HttpMethod::Post, "/login/test-token").errors(ME_ERRORS);
        self.client.call(Ok(spec))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UsersService<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, skip: u64, limit: u64) -> Call<'a, UsersPublic> {
        self.client.call(Ok(RequestSpec::new(HttpMethod::Get, "/users/")
            .query_param("skip", Some(skip))
            .query_param("limit", Some(limit))
            .errors(VALIDATION_ERRORS)))
    }

    pub fn create(&self, user: &UserCreate) -> Call<'a, UserPublic> {
        self.client.call(
            RequestSpec::new(HttpMethod::Post, "/users/")
                .json(user)
                .map(|spec| spec.errors(WRITE_ERRORS)),
        )
    }

    pub fn read_me(&self) -> Call<'a, UserPublic> {
        self.client
            .call(Ok(RequestSpec::new(HttpMethod::Get, "/users/me").errors(ME_ERRORS)))
    }

    pub fn update_me(&self, update: &UserUpdateMe) -> Call<'a, UserPublic> {
        self.client.call(
            RequestSpec::new(HttpMethod::Patch, "/users/me")
                .json(update)
                .map(|spec| spec.errors(WRITE_ERRORS)),
        )
    }

    pub fn update_password_me(&self, body: &UpdatePassword) -> Call<'a, Message> {
        self.client.call(
            RequestSpec::new(HttpMethod::Patch, "/users/me/password")
                .json(body)
                .map(|spec| spec.errors(PASSWORD_ERRORS)),
        )
    }

    pub fn delete_me(&self) -> Call<'a, Message> {
        self.client
            .call(Ok(RequestSpec::new(HttpMethod::Delete, "/users/me").errors(ME_ERRORS)))
    }

    pub fn read_by_id(&self, user_id: Uuid) -> Call<'a, UserPublic> {
        self.client.call(Ok(RequestSpec::new(HttpMethod::Get, "/users/{user_id}")
            .path_param("user_id", user_id)
            .errors(BY_ID_ERRORS)))
    }

    pub fn update(&self, user_id: Uuid, update: &UserUpdate) -> Call<'a, UserPublic> {
        self.client.call(
            RequestSpec::new(HttpMethod::Patch, "/users/{user_id}")
                .path_param("user_id", user_id)
                .json(update)
                .map(|spec| spec.errors(UPDATE_BY_ID_ERRORS)),
        )
    }

    pub fn delete(&self, user_id: Uuid) -> Call<'a, Message> {
        self.client.call(Ok(RequestSpec::new(HttpMethod::Delete, "/users/{user_id}")
            .path_param("user_id", user_id)
            .errors(BY_ID_ERRORS)))
    }
}
