//! Turning API errors into something a user can read.
//!
//! Presentation is someone else's job; this module only decides the text
//! and hands a [`Toast`] to whatever implements [`Notifier`]. Cancelled
//! calls are never reported.

use crate::error::{ApiError, ErrorBody};

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub status: ToastStatus,
}

impl Toast {
    pub fn success(description: &str) -> Self {
        Self {
            title: "Success!".to_string(),
            description: description.to_string(),
            status: ToastStatus::Success,
        }
    }

    pub fn error(description: &str) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.to_string(),
            status: ToastStatus::Error,
        }
    }
}

pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Single display string for `err`: the `detail` string, the first
/// validation message, or [`GENERIC_ERROR_MESSAGE`].
pub fn error_message(err: &ApiError) -> String {
    err.body()
        .and_then(ErrorBody::message)
        .unwrap_or(GENERIC_ERROR_MESSAGE)
        .to_string()
}

/// Report `err` through `notifier`. Returns `false` when nothing was shown
/// because the call was cancelled.
pub fn handle_error(err: &ApiError, notifier: &dyn Notifier) -> bool {
    if err.is_cancelled() {
        tracing::debug!("suppressing notification for cancelled request");
        return false;
    }
    notifier.notify(Toast::error(&error_message(err)));
    true
}

pub fn notify_success(notifier: &dyn Notifier, description: &str) {
    notifier.notify(Toast::success(description));
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Toast>>);

    impl Notifier for Recorder {
        fn notify(&self, toast: Toast) {
            self.0.borrow_mut().push(toast);
        }
    }

    fn api_error(status: u16, raw: &str) -> ApiError {
        ApiError::from_status(status, ErrorBody::parse(raw))
    }

    #[test]
    fn first_validation_message_wins() {
        let err = api_error(422, r#"{"detail":[{"msg":"Invalid email"},{"msg":"Too short"}]}"#);
        assert_eq!(error_message(&err), "Invalid email");
    }

    #[test]
    fn detail_string_is_verbatim() {
        let err = api_error(400, r#"{"detail":"Incorrect email or password"}"#);
        assert_eq!(error_message(&err), "Incorrect email or password");
    }

    #[test]
    fn missing_detail_falls_back() {
        assert_eq!(error_message(&api_error(500, "{}")), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message(&api_error(422, r#"{"detail":[]}"#)), GENERIC_ERROR_MESSAGE);
        assert_eq!(
            error_message(&ApiError::Network("reset".to_string())),
            GENERIC_ERROR_MESSAGE
        );
    }

    #[test]
    fn handle_error_emits_error_toast() {
        let recorder = Recorder::default();
        let err = api_error(404, r#"{"detail":"User not found"}"#);
        assert!(handle_error(&err, &recorder));
        assert_eq!(recorder.0.borrow().as_slice(), &[Toast::error("User not found")]);
    }

    #[test]
    fn cancelled_request_is_silent() {
        let recorder = Recorder::default();
        assert!(!handle_error(&ApiError::Cancelled, &recorder));
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn success_toast_shape() {
        let recorder = Recorder::default();
        notify_success(&recorder, "User created successfully.");
        let toasts = recorder.0.borrow();
        assert_eq!(toasts[0].title, "Success!");
        assert_eq!(toasts[0].status, ToastStatus::Success);
    }
}
