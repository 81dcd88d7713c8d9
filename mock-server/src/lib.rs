//! In-memory stand-in for the admin backend: OAuth2 password login plus the
//! users resource, with the same status codes and `detail` messages.

mod config;
mod error;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{header, request::Parts, StatusCode},
    routing::{get, patch, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub use config::{ConfigError, MockConfig};
pub use error::ApiErr;

const MIN_PASSWORD_LENGTH: usize = 8;
const DEFAULT_LIMIT: u64 = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersPublic {
    pub data: Vec<UserPublic>,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UserUpdateMe {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug)]
struct StoredUser {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    is_active: bool,
    is_superuser: bool,
    // Plain text; this server never leaves a test process.
    password: String,
}

impl StoredUser {
    fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            is_active: self.is_active,
            is_superuser: self.is_superuser,
            full_name: self.full_name.clone(),
        }
    }
}

/// Users in creation order, plus issued bearer tokens.
#[derive(Debug, Default)]
pub struct Store {
    users: Vec<StoredUser>,
    tokens: HashMap<String, Uuid>,
}

impl Store {
    pub fn seeded(config: &MockConfig) -> Self {
        Self {
            users: vec![StoredUser {
                id: Uuid::new_v4(),
                email: config.superuser_email.clone(),
                full_name: None,
                is_active: true,
                is_superuser: true,
                password: config.superuser_password.clone(),
            }],
            tokens: HashMap::new(),
        }
    }

    fn get(&self, id: Uuid) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut StoredUser> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn by_email(&self, email: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.email == email)
    }

    fn email_taken_by_other(&self, email: &str, id: Uuid) -> bool {
        self.by_email(email).is_some_and(|u| u.id != id)
    }

    fn issue_token(&mut self, id: Uuid) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), id);
        token
    }

    /// Removes the user and revokes every token issued to them.
    fn remove(&mut self, id: Uuid) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        self.tokens.retain(|_, owner| *owner != id);
        self.users.len() != before
    }
}

pub type Db = Arc<RwLock<Store>>;

/// The bearer of a valid, active token.
pub struct CurrentUser(StoredUser);

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiErr::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
        let store = db.read().await;
        let user = store
            .tokens
            .get(token)
            .and_then(|id| store.get(*id))
            .cloned()
            .ok_or_else(|| {
                ApiErr::new(StatusCode::UNAUTHORIZED, "Could not validate credentials")
            })?;
        if !user.is_active {
            return Err(ApiErr::new(StatusCode::BAD_REQUEST, "Inactive user"));
        }
        Ok(Self(user))
    }
}

impl CurrentUser {
    fn require_superuser(&self) -> Result<(), ApiErr> {
        if self.0.is_superuser {
            Ok(())
        } else {
            Err(ApiErr::new(
                StatusCode::FORBIDDEN,
                "The user doesn't have enough privileges",
            ))
        }
    }
}

fn check_email(email: &str) -> Result<(), ApiErr> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.contains('@')
    });
    if valid {
        Ok(())
    } else {
        Err(ApiErr::field(
            &["body", "email"],
            "value is not a valid email address",
            "value_error",
        ))
    }
}

fn check_password(password: &str, field: &str) -> Result<(), ApiErr> {
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(ApiErr::field(
            &["body", field],
            "String should have at least 8 characters",
            "string_too_short",
        ))
    }
}

pub fn app() -> Router {
    app_with(&MockConfig::default())
}

pub fn app_with(config: &MockConfig) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded(config)));
    Router::new()
        .route("/login/access-token", post(login_access_token))
        .route("/login/test-token", post(test_token))
        .route("/users/", get(read_users).post(create_user))
        .route("/users/me", get(read_user_me).patch(update_user_me).delete(delete_user_me))
        .route("/users/me/password", patch(update_password_me))
        .route(
            "/users/{user_id}",
            get(read_user_by_id).patch(update_user).delete(delete_user),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, &MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: &MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn login_access_token(
    State(db): State<Db>,
    form: Result<Form<LoginInput>, FormRejection>,
) -> Result<Json<Token>, ApiErr> {
    let Form(form) = form?;
    let mut store = db.write().await;
    let user = store
        .by_email(&form.username)
        .filter(|u| u.password == form.password)
        .cloned()
        .ok_or_else(|| {
            ApiErr::new(StatusCode::BAD_REQUEST, "Incorrect email or password")
        })?;
    if !user.is_active {
        return Err(ApiErr::new(StatusCode::BAD_REQUEST, "Inactive user"));
    }
    let access_token = store.issue_token(user.id);
    info!(email = %user.email, "issued access token");
    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn test_token(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.public())
}

async fn read_users(
    State(db): State<Db>,
    current: CurrentUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<UsersPublic>, ApiErr> {
    current.require_superuser()?;
    let Query(params) = params?;
    let skip = usize::try_from(params.skip.unwrap_or(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(params.limit.unwrap_or(DEFAULT_LIMIT)).unwrap_or(usize::MAX);
    let store = db.read().await;
    Ok(Json(UsersPublic {
        data: store.users.iter().skip(skip).take(limit).map(StoredUser::public).collect(),
        count: store.users.len() as u64,
    }))
}

async fn create_user(
    State(db): State<Db>,
    current: CurrentUser,
    input: Result<Json<UserCreate>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiErr> {
    current.require_superuser()?;
    let Json(input) = input?;
    check_email(&input.email)?;
    check_password(&input.password, "password")?;
    let mut store = db.write().await;
    if store.by_email(&input.email).is_some() {
        return Err(ApiErr::new(
            StatusCode::BAD_REQUEST,
            "The user with this email already exists in the system.",
        ));
    }
    let user = StoredUser {
        id: Uuid::new_v4(),
        email: input.email,
        full_name: input.full_name,
        is_active: input.is_active.unwrap_or(true),
        is_superuser: input.is_superuser.unwrap_or(false),
        password: input.password,
    };
    let public = user.public();
    store.users.push(user);
    info!(id = %public.id, email = %public.email, "created user");
    Ok(Json(public))
}

async fn read_user_me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.public())
}

async fn update_user_me(
    State(db): State<Db>,
    CurrentUser(current): CurrentUser,
    input: Result<Json<UserUpdateMe>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiErr> {
    let Json(input) = input?;
    let mut store = db.write().await;
    if let Some(email) = &input.email {
        check_email(email)?;
        if store.email_taken_by_other(email, current.id) {
            return Err(ApiErr::new(
                StatusCode::CONFLICT,
                "User with this email already exists",
            ));
        }
    }
    let user = store
        .get_mut(current.id)
        .ok_or_else(|| ApiErr::new(StatusCode::NOT_FOUND, "User not found"))?;
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(full_name) = input.full_name {
        user.full_name = Some(full_name);
    }
    Ok(Json(user.public()))
}

async fn update_password_me(
    State(db): State<Db>,
    CurrentUser(current): CurrentUser,
    input: Result<Json<UpdatePassword>, JsonRejection>,
) -> Result<Json<Message>, ApiErr> {
    let Json(input) = input?;
    check_password(&input.new_password, "new_password")?;
    if input.current_password != current.password {
        return Err(ApiErr::new(StatusCode::BAD_REQUEST, "Incorrect password"));
    }
    if input.new_password == input.current_password {
        return Err(ApiErr::new(
            StatusCode::BAD_REQUEST,
            "New password cannot be the same as the current one",
        ));
    }
    let mut store = db.write().await;
    let user = store
        .get_mut(current.id)
        .ok_or_else(|| ApiErr::new(StatusCode::NOT_FOUND, "User not found"))?;
    user.password = input.new_password;
    Ok(Message::new("Password updated successfully"))
}

async fn delete_user_me(
    State(db): State<Db>,
    CurrentUser(current): CurrentUser,
) -> Result<Json<Message>, ApiErr> {
    if current.is_superuser {
        return Err(ApiErr::new(
            StatusCode::FORBIDDEN,
            "Super users are not allowed to delete themselves",
        ));
    }
    db.write().await.remove(current.id);
    info!(id = %current.id, "user deleted own account");
    Ok(Message::new("User deleted successfully"))
}

async fn read_user_by_id(
    State(db): State<Db>,
    CurrentUser(current): CurrentUser,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserPublic>, ApiErr> {
    let Path(user_id) = user_id?;
    if user_id == current.id {
        return Ok(Json(current.public()));
    }
    if !current.is_superuser {
        return Err(ApiErr::new(
            StatusCode::FORBIDDEN,
            "The user doesn't have enough privileges",
        ));
    }
    let store = db.read().await;
    store
        .get(user_id)
        .map(|u| Json(u.public()))
        .ok_or_else(|| ApiErr::new(StatusCode::NOT_FOUND, "User not found"))
}

async fn update_user(
    State(db): State<Db>,
    current: CurrentUser,
    user_id: Result<Path<Uuid>, PathRejection>,
    input: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiErr> {
    current.require_superuser()?;
    let Path(user_id) = user_id?;
    let Json(input) = input?;
    if let Some(email) = &input.email {
        check_email(email)?;
    }
    if let Some(password) = &input.password {
        check_password(password, "password")?;
    }
    let mut store = db.write().await;
    if store.get(user_id).is_none() {
        return Err(ApiErr::new(
            StatusCode::NOT_FOUND,
            "The user with this id does not exist",
        ));
    }
    if let Some(email) = &input.email {
        if store.email_taken_by_other(email, user_id) {
            return Err(ApiErr::new(
                StatusCode::CONFLICT,
                "User with this email already exists",
            ));
        }
    }
    let user = store
        .get_mut(user_id)
        .ok_or_else(|| ApiErr::new(StatusCode::NOT_FOUND, "User not found"))?;
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(password) = input.password {
        user.password = password;
    }
    if let Some(is_active) = input.is_active {
        user.is_active = is_active;
    }
    if let Some(is_superuser) = input.is_superuser {
        user.is_superuser = is_superuser;
    }
    if let Some(full_name) = input.full_name {
        user.full_name = Some(full_name);
    }
    Ok(Json(user.public()))
}

async fn delete_user(
    State(db): State<Db>,
    CurrentUser(current): CurrentUser,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Message>, ApiErr> {
    if !current.is_superuser {
        return Err(ApiErr::new(
            StatusCode::FORBIDDEN,
            "The user doesn't have enough privileges",
        ));
    }
    let Path(user_id) = user_id?;
    if user_id == current.id {
        return Err(ApiErr::new(
            StatusCode::FORBIDDEN,
            "Super users are not allowed to delete themselves",
        ));
    }
    if !db.write().await.remove(user_id) {
        return Err(ApiErr::new(StatusCode::NOT_FOUND, "User not found"));
    }
    info!(id = %user_id, "deleted user");
    Ok(Message::new("User deleted successfully"))
}
