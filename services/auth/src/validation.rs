//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AuthError, AuthResult};

fn invalid(message: &str) -> AuthError {
    AuthError::Validation(message.to_string())
}

/// Validate email
pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(invalid("Email is required"));
    }

    if email.len() > 254 {
        return Err(invalid("Email must be at most 254 characters long"));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(invalid("Invalid email format"));
    }

    Ok(())
}

/// Validate the display name used in emails
pub fn validate_full_name(full_name: &str) -> AuthResult<()> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err(invalid("Full name is required"));
    }

    if trimmed.chars().count() > 128 {
        return Err(invalid("Full name must be at most 128 characters long"));
    }

    Ok(())
}

/// Validate a password chosen at registration
///
/// Strength rules belong to the identity provider; only the length bounds
/// are checked here.
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }

    if password.len() < 8 {
        return Err(invalid("Password must be at least 8 characters long"));
    }

    if password.len() > 128 {
        return Err(invalid("Password must be at most 128 characters long"));
    }

    Ok(())
}

/// Validate a password presented at login
pub fn validate_login_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }

    Ok(())
}
