//! Client-side form rules, checked before a request is sent.
//!
//! These only spare a round trip; the server validates the same fields and
//! its 422 messages still reach the user through
//! [`error_message`](crate::notify::error_message).

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::types::{LoginForm, UpdatePassword, UserCreate, UserUpdate, UserUpdateMe};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 30;

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const USERNAME_REQUIRED: &str = "Username is required";
pub const INVALID_EMAIL: &str = "Invalid email address";
pub const INVALID_NAME: &str = "Invalid name";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const CONFIRMATION_REQUIRED: &str = "Password confirmation is required";
pub const PASSWORDS_DO_NOT_MATCH: &str = "The passwords do not match";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

pub trait Validate {
    /// All rule violations, in field order. Empty means the form may be sent.
    fn validate(&self) -> Vec<FieldError>;
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn name_regex() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        // Letters, whitespace and Latin-1 Supplement through Latin Extended-A.
        let pattern = format!(r"^[A-Za-z\s\x{{C0}}-\x{{17F}}]{{1,{MAX_NAME_LENGTH}}}$");
        Regex::new(&pattern)
            .unwrap_or_else(|error| panic!("name regex failed to compile: {error}"))
    })
}

/// `local@domain.tld`, case-insensitive, with an alphabetic TLD of at least
/// two letters.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// 1 to 30 letters (ASCII or Latin-1/Latin Extended-A) and whitespace.
pub fn is_valid_name(name: &str) -> bool {
    name_regex().is_match(name)
}

pub fn check_email(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some(EMAIL_REQUIRED)
    } else if !is_valid_email(email) {
        Some(INVALID_EMAIL)
    } else {
        None
    }
}

/// Optional full name: empty passes, anything else must match the name rule.
pub fn check_name(name: &str) -> Option<&'static str> {
    (!name.is_empty() && !is_valid_name(name)).then_some(INVALID_NAME)
}

/// An empty password passes when not `required`; a non-empty one must meet
/// the minimum length either way.
pub fn check_password(password: &str, required: bool) -> Option<&'static str> {
    if password.is_empty() {
        required.then_some(PASSWORD_REQUIRED)
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some(PASSWORD_TOO_SHORT)
    } else {
        None
    }
}

pub fn check_confirmation(
    password: &str,
    confirmation: &str,
    required: bool,
) -> Option<&'static str> {
    if confirmation.is_empty() && required {
        Some(CONFIRMATION_REQUIRED)
    } else if confirmation != password {
        Some(PASSWORDS_DO_NOT_MATCH)
    } else {
        None
    }
}

fn collect(checks: &[(&'static str, Option<&'static str>)]) -> Vec<FieldError> {
    checks
        .iter()
        .filter_map(|&(field, message)| {
            message.map(|message| FieldError { field, message })
        })
        .collect()
}

impl Validate for LoginForm {
    fn validate(&self) -> Vec<FieldError> {
        let username = if self.username.is_empty() {
            Some(USERNAME_REQUIRED)
        } else if !is_valid_email(&self.username) {
            Some(INVALID_EMAIL)
        } else {
            None
        };
        collect(&[
            ("username", username),
            ("password", self.password.is_empty().then_some(PASSWORD_REQUIRED)),
        ])
    }
}

/// Admin "Add User" modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddUserForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl Validate for AddUserForm {
    fn validate(&self) -> Vec<FieldError> {
        collect(&[
            ("email", check_email(&self.email)),
            ("full_name", check_name(&self.full_name)),
            ("password", check_password(&self.password, true)),
            (
                "confirm_password",
                check_confirmation(&self.password, &self.confirm_password, true),
            ),
        ])
    }
}

impl AddUserForm {
    pub fn to_payload(&self) -> UserCreate {
        UserCreate {
            email: self.email.clone(),
            password: self.password.clone(),
            is_active: self.is_active,
            is_superuser: self.is_superuser,
            full_name: non_empty(&self.full_name),
        }
    }
}

/// Admin "Edit User" modal. Password fields are optional; left empty, the
/// password is not changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditUserForm {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl Validate for EditUserForm {
    fn validate(&self) -> Vec<FieldError> {
        collect(&[
            ("email", check_email(&self.email)),
            ("full_name", check_name(&self.full_name)),
            ("password", check_password(&self.password, false)),
            (
                "confirm_password",
                check_confirmation(&self.password, &self.confirm_password, false),
            ),
        ])
    }
}

impl EditUserForm {
    pub fn to_payload(&self) -> UserUpdate {
        UserUpdate {
            email: Some(self.email.clone()),
            is_active: Some(self.is_active),
            is_superuser: Some(self.is_superuser),
            full_name: non_empty(&self.full_name),
            password: non_empty(&self.password),
        }
    }
}

/// "My profile" tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInformationForm {
    pub email: String,
    pub full_name: String,
}

impl Validate for UserInformationForm {
    fn validate(&self) -> Vec<FieldError> {
        collect(&[
            ("full_name", check_name(&self.full_name)),
            ("email", check_email(&self.email)),
        ])
    }
}

impl UserInformationForm {
    pub fn to_payload(&self) -> UserUpdateMe {
        UserUpdateMe {
            email: Some(self.email.clone()),
            full_name: non_empty(&self.full_name),
        }
    }
}

/// "Password" tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Validate for ChangePasswordForm {
    fn validate(&self) -> Vec<FieldError> {
        collect(&[
            ("current_password", check_password(&self.current_password, true)),
            ("new_password", check_password(&self.new_password, true)),
            (
                "confirm_password",
                check_confirmation(&self.new_password, &self.confirm_password, true),
            ),
        ])
    }
}

impl ChangePasswordForm {
    pub fn to_payload(&self) -> UpdatePassword {
        UpdatePassword {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("test@example.com")]
    #[case("user.name@domain.co.uk")]
    #[case("TEST@EXAMPLE.COM")]
    #[case("a+b%c@x-y.io")]
    fn accepts_valid_emails(#[case] email: &str) {
        assert!(is_valid_email(email));
    }

    #[rstest]
    #[case("invalid-email")]
    #[case("@example.com")]
    #[case("test@")]
    #[case("test.example.com")]
    #[case("a@b@c.com")]
    #[case("a@example.c")]
    #[case("a@example.c0m")]
    #[case("a@.com")]
    fn rejects_invalid_emails(#[case] email: &str) {
        assert!(!is_valid_email(email));
    }

    #[rstest]
    #[case("John Doe", true)]
    #[case("José María", true)]
    #[case("Zoë Łukasz", true)]
    #[case("Ǎdam", false)]
    #[case("Anne", true)]
    #[case("John123", false)]
    #[case("user@domain", false)]
    #[case("", false)]
    fn name_rule(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_valid_name(name), expected);
    }

    #[test]
    fn name_longer_than_thirty_chars_is_rejected() {
        assert!(!is_valid_name(&"a".repeat(31)));
        assert!(is_valid_name(&"a".repeat(30)));
    }

    #[test]
    fn password_rules() {
        assert_eq!(check_password("", true), Some(PASSWORD_REQUIRED));
        assert_eq!(check_password("", false), None);
        assert_eq!(check_password("short", false), Some(PASSWORD_TOO_SHORT));
        assert_eq!(check_password("longenough", true), None);
    }

    #[test]
    fn confirmation_rules() {
        assert_eq!(check_confirmation("test1234", "", true), Some(CONFIRMATION_REQUIRED));
        assert_eq!(
            check_confirmation("test1234", "different", true),
            Some(PASSWORDS_DO_NOT_MATCH)
        );
        assert_eq!(check_confirmation("test1234", "test1234", true), None);
        assert_eq!(check_confirmation("", "", false), None);
    }

    #[test]
    fn login_form_requires_both_fields() {
        let errors = LoginForm::new("", "").validate();
        assert_eq!(
            errors,
            vec![
                FieldError { field: "username", message: USERNAME_REQUIRED },
                FieldError { field: "password", message: PASSWORD_REQUIRED },
            ]
        );
        assert!(LoginForm::new("test@example.com", "testpassword").validate().is_empty());
    }

    #[test]
    fn add_user_form_reports_each_field() {
        let form = AddUserForm {
            email: "nope".to_string(),
            full_name: "R2D2".to_string(),
            password: "short".to_string(),
            confirm_password: "other".to_string(),
            ..AddUserForm::default()
        };
        let fields: Vec<_> = form.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "full_name", "password", "confirm_password"]);
    }

    #[test]
    fn add_user_payload_drops_empty_name() {
        let form = AddUserForm {
            email: "new@example.com".to_string(),
            password: "password1".to_string(),
            confirm_password: "password1".to_string(),
            is_active: true,
            ..AddUserForm::default()
        };
        assert!(form.validate().is_empty());
        let payload = form.to_payload();
        assert_eq!(payload.full_name, None);
        assert!(payload.is_active);
    }

    #[test]
    fn edit_user_without_password_keeps_it() {
        let form = EditUserForm {
            email: "x@example.com".to_string(),
            ..EditUserForm::default()
        };
        assert!(form.validate().is_empty());
        assert_eq!(form.to_payload().password, None);
    }

    #[test]
    fn change_password_mismatch() {
        let form = ChangePasswordForm {
            current_password: "oldpassword".to_string(),
            new_password: "newpassword".to_string(),
            confirm_password: "newpasswrd".to_string(),
        };
        assert_eq!(
            form.validate(),
            vec![FieldError { field: "confirm_password", message: PASSWORDS_DO_NOT_MATCH }]
        );
    }
}
