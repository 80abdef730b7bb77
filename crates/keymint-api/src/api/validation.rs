// Input validation for the registration endpoint
//
// Hard limits, not configurable. A failed check short-circuits before any
// store access and surfaces a single generic message.

use crate::error::AuthError;

/// Maximum size for the email field (RFC 5321 path limit).
pub const MAX_EMAIL_BYTES: usize = 254;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Maximum password length accepted at registration.
pub const MAX_PASSWORD_BYTES: usize = 128;

/// Maximum size for the display-name field.
pub const MAX_NAME_BYTES: usize = 256;

/// Generic validation error message returned to clients.
/// Intentionally vague to avoid leaking which field was rejected.
pub const VALIDATION_ERROR_MESSAGE: &str = "invalid registration payload";

/// Validation error - returns a generic message to avoid leaking details
pub struct ValidationError;

impl From<ValidationError> for AuthError {
    fn from(_: ValidationError) -> Self {
        AuthError::Validation(VALIDATION_ERROR_MESSAGE.to_string())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let well_formed = email.len() <= MAX_EMAIL_BYTES
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && domain.contains('.')
        });
    if !well_formed {
        tracing::warn!("registration rejected: malformed email");
        return Err(ValidationError);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_BYTES || password.len() > MAX_PASSWORD_BYTES {
        tracing::warn!("registration rejected: password length out of bounds");
        return Err(ValidationError);
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || name.len() > MAX_NAME_BYTES {
        tracing::warn!("registration rejected: display name out of bounds");
        return Err(ValidationError);
    }
    Ok(())
}

/// Validate all fields of a registration request
pub fn validate_register_input(
    email: &str,
    password: &str,
    name: &str,
) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_password(password)?;
    validate_name(name)?;
    Ok(())
}
