//! Profile field validation and normalization.

/// Lowercase and trim a username or email for comparison and storage.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Validate a username: 3–50 characters of `[A-Za-z0-9_]`.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err("Username must be between 3 and 50 characters".into());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username can only contain letters, numbers, and underscores".into());
    }
    Ok(())
}

/// Validate an email address shape: `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || "Email address is not valid".to_string();
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.split_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() && !domain.ends_with('.') => {
            Ok(())
        }
        _ => Err(invalid()),
    }
}

/// Validate and trim a display name.
pub fn validate_full_name(full_name: &str) -> Result<String, String> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err("Full name cannot be empty".into());
    }
    Ok(trimmed.to_string())
}
