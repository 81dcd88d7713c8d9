//! Typed client core for the user-management admin API.
//!
//! # Overview
//! Binds every REST operation of the admin backend (login, user CRUD,
//! self-service profile and password) to a typed call, and owns the
//! authentication lifecycle around them.
//!
//! # Design
//! - `ApiClient` keeps request building and response parsing pure; a
//!   [`Transport`] does the I/O in between, so the core is testable without
//!   a network.
//! - Services only describe calls. Each returns a [`Call`] that is sent when
//!   awaited and can carry a [`CancelToken`].
//! - Error bodies are resolved once into [`ErrorBody`] and classified by
//!   status into distinct [`ApiError`] variants.
//! - [`Session`] is the single writer of the persisted token and cached
//!   user; the client only reads the token through a [`TokenProvider`].
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod notify;
pub mod pagination;
pub mod request;
pub mod services;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{FnToken, StaticToken, StoredToken, TokenProvider};
pub use cancel::{CancelHandle, CancelToken};
pub use client::{ApiClient, Call};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorBody};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use notify::{error_message, handle_error, Notifier, Toast, ToastStatus};
pub use pagination::Pagination;
pub use request::{RequestBody, RequestSpec};
pub use services::{LoginService, UsersService};
pub use session::{LoginOutcome, NavItem, Session, SessionError, SessionSnapshot, SessionStatus};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{
    LocSegment, LoginForm, Message, Token, UpdatePassword, UserCreate, UserPublic, UserUpdate,
    UserUpdateMe, UsersPublic, ValidationError,
};
