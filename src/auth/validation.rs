//! Login and sign-up form validation

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::Result;
use crate::error::Error;

const MIN_PASSWORD_LEN: usize = 8;
const MIN_USERNAME_LEN: usize = 2;

const MUST_NOT_BE_EMPTY: &str = "Must not be empty";
const INVALID_EMAIL: &str = "Must be a valid email address";
const PASSWORDS_MUST_MATCH: &str = "Passwords must match";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
        )
        .expect("email pattern is valid")
    })
}

/// Whether `email` looks like an email address
pub fn is_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Whitespace-only strings are empty
pub fn is_empty(value: &str) -> bool {
    value.trim().is_empty()
}

/// Field errors collected while validating a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: BTreeMap<&'static str, String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Turn collected errors into an [`Error::Validation`]
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let message = self
            .errors
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::Validation(message))
    }
}

pub fn validate_login(email: &str, password: &str) -> Validation {
    let mut v = Validation::default();

    if is_empty(email) {
        v.reject("email", MUST_NOT_BE_EMPTY);
    } else if !is_email(email) {
        v.reject("email", INVALID_EMAIL);
    }
    if is_empty(password) {
        v.reject("password", MUST_NOT_BE_EMPTY);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        v.reject("password", format!("Must be at least {MIN_PASSWORD_LEN} characters"));
    }

    v
}

pub fn validate_sign_up(email: &str, username: &str, password: &str, confirm_password: &str) -> Validation {
    let mut v = Validation::default();

    if is_empty(email) {
        v.reject("email", MUST_NOT_BE_EMPTY);
    } else if !is_email(email) {
        v.reject("email", INVALID_EMAIL);
    }

    if is_empty(username) {
        v.reject("username", MUST_NOT_BE_EMPTY);
    } else if username.trim().chars().count() < MIN_USERNAME_LEN {
        v.reject("username", format!("Must be at least {MIN_USERNAME_LEN} characters"));
    }

    if is_empty(password) {
        v.reject("password", MUST_NOT_BE_EMPTY);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        v.reject("password", format!("Must be at least {MIN_PASSWORD_LEN} characters"));
    }

    if password != confirm_password {
        v.reject("confirmPassword", PASSWORDS_MUST_MATCH);
    }

    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_email() {
        assert!(is_email("a@b.com"));
        assert!(is_email("first.last@sub.example.org"));
        assert!(is_email("x@[192.168.0.1]"));
        assert!(!is_email("a@b"));
        assert!(!is_email("no-at-sign.com"));
        assert!(!is_email("two@@example.com"));
    }

    #[test]
    fn test_is_empty() {
        assert!(is_empty(""));
        assert!(is_empty("   \t"));
        assert!(!is_empty(" x "));
    }

    #[test]
    fn test_login_validation() {
        assert!(validate_login("a@b.com", "pw123456").is_valid());

        let v = validate_login(" ", "short");
        assert_eq!(v.errors.get("email").map(String::as_str), Some(MUST_NOT_BE_EMPTY));
        assert!(v.errors.contains_key("password"));

        let v = validate_login("alice", "pw123456");
        assert_eq!(v.errors.get("email").map(String::as_str), Some(INVALID_EMAIL));
        assert!(!v.errors.contains_key("password"));
    }

    #[test]
    fn test_sign_up_validation() {
        assert!(validate_sign_up("a@b.com", "al", "pw123456", "pw123456").is_valid());

        let v = validate_sign_up("not-an-email", "a", "pw123456", "pw654321");
        assert_eq!(v.errors.get("email").map(String::as_str), Some(INVALID_EMAIL));
        assert!(v.errors.contains_key("username"));
        assert_eq!(
            v.errors.get("confirmPassword").map(String::as_str),
            Some(PASSWORDS_MUST_MATCH)
        );
    }

    #[test]
    fn test_into_result() {
        assert!(validate_login("a@b.com", "pw123456").into_result().is_ok());
        let err = validate_login("", "").into_result().unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("email")));
    }
}
