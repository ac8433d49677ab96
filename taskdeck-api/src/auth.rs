//! Authentication payloads and the user record.
//!
//! Login returns a bearer token plus the user record; registration
//! returns the user record only (the client logs in afterwards).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MIN_PASSWORD_LEN, ValidationError};

/// A user record as returned by the auth endpoints. Never carries
/// credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned user identifier.
    pub id: String,
    /// The user's email address.
    pub email: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password (plaintext over TLS; hashed server-side).
    pub password: String,
}

/// Payload for `POST /api/v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired account email.
    pub email: String,
    /// Desired account password.
    pub password: String,
}

/// Response from `POST /api/v1/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer credential for subsequent requests.
    pub access_token: String,
    /// Always `"Bearer"` (RFC 6750).
    pub token_type: String,
    /// The authenticated user.
    pub user: User,
    /// Token lifetime in seconds, when the server reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Validates an email address for plausibility.
///
/// This is a pre-flight check only; the server performs the
/// authoritative validation.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEmail`] if the address has no `@`
/// or an empty local/domain part.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Validates a password against the minimum length.
///
/// # Errors
///
/// Returns [`ValidationError::PasswordTooShort`] under 8 characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validates a registration form: email, password, and confirmation.
///
/// # Errors
///
/// Returns the first failing check; [`ValidationError::PasswordMismatch`]
/// if the confirmation differs.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_password(password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
