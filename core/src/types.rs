//! Request and response shapes of the user-management API.
//!
//! # Design
//! Response types (`UserPublic`, `UsersPublic`, `Token`, `Message`) never
//! carry a password field; passwords only travel outward in request payloads.
//! Patch payloads skip absent fields when serialized so the server applies
//! only what the caller set.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_token_type() -> String {
    "bearer".to_string()
}

fn default_true() -> bool {
    true
}

/// Bearer credential returned by the password grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

/// A user as the server exposes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UserPublic {
    /// Whether the admin area is visible to this user.
    pub fn is_admin(&self) -> bool {
        self.is_superuser
    }

    /// Name to show in menus: the full name when set, the email otherwise.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// One page of users. `count` is the total number of users on the server,
/// not the length of `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsersPublic {
    pub data: Vec<UserPublic>,
    pub count: u64,
}

/// Payload for creating a user (admin only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UserCreate {
    /// An active, non-superuser account with no full name.
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            is_active: true,
            is_superuser: false,
            full_name: None,
        }
    }
}

/// Admin patch of any user. Only the fields present are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Self-service patch of the current user's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUpdateMe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

/// Plain acknowledgement returned by delete and password endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

/// OAuth2 password-grant form, sent as `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub grant_type: Option<String>,
    pub scope: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl LoginForm {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    /// Flat key/value pairs in wire order. Unset optional fields and an empty
    /// scope are left out.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(6);
        if let Some(grant_type) = &self.grant_type {
            pairs.push(("grant_type".to_string(), grant_type.clone()));
        }
        pairs.push(("username".to_string(), self.username.clone()));
        pairs.push(("password".to_string(), self.password.clone()));
        if !self.scope.is_empty() {
            pairs.push(("scope".to_string(), self.scope.clone()));
        }
        if let Some(client_id) = &self.client_id {
            pairs.push(("client_id".to_string(), client_id.clone()));
        }
        if let Some(client_secret) = &self.client_secret {
            pairs.push(("client_secret".to_string(), client_secret.clone()));
        }
        pairs
    }
}

/// One segment of a validation error location, e.g. `["body", "email"]` or
/// `["body", "items", 0]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LocSegment {
    Index(u64),
    Field(String),
}

/// A single field-level entry of a 422 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    #[serde(default)]
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl ValidationError {
    /// The last named segment of `loc`, which is the offending field.
    pub fn field(&self) -> Option<&str> {
        self.loc.iter().rev().find_map(|segment| match segment {
            LocSegment::Field(name) => Some(name.as_str()),
            LocSegment::Index(_) => None,
        })
    }
}
