//! API handlers and shared request validation.

pub mod health;
pub mod resend_confirmation;
pub mod root;
pub mod types;
pub mod user_login;
pub mod user_register;

use crate::{
    api::error::ApiError,
    identity::Credentials,
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

/// Lightweight email sanity check; the provider does the real validation.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// E.164-style phone number, leading `+` optional.
pub fn valid_phone(phone: &str) -> bool {
    Regex::new(r"^\+?[1-9][0-9]{6,14}$").is_ok_and(|re| re.is_match(phone))
}

/// Trim and lowercase so the provider sees one spelling per address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email/password pair and build provider credentials.
///
/// # Errors
/// Returns `ApiError::Validation` for a malformed email or an empty password.
pub fn credentials(email: &str, password: SecretString) -> Result<Credentials, ApiError> {
    let email = normalize_email(email);

    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }

    if password.expose_secret().is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    Ok(Credentials::new(email, password))
}
