//! Input validation utilities
//!
//! Each validator returns the normalized value on success so callers store
//! exactly what was checked.

/// Longest accepted display name, in characters
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted email address, in characters
pub const MAX_EMAIL_LEN: usize = 254;
/// Longest accepted password, in bytes
pub const MAX_PASSWORD_LEN: usize = 128;

/// Validate a display name
pub fn validate_name(name: &str) -> Result<String, String> {
    let name = name.trim();

    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "Name must be at most {} characters long",
            MAX_NAME_LEN
        ));
    }

    Ok(name.to_string())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<String, String> {
    let email = email.trim();

    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(format!(
            "Email must be at most {} characters long",
            MAX_EMAIL_LEN
        ));
    }

    Ok(email.to_string())
}

/// Validate a password; surrounding whitespace is significant
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(format!("Password must be at most {} bytes long", MAX_PASSWORD_LEN));
    }

    Ok(())
}
