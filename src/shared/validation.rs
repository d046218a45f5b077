//! Input Validation and Sanitization
//!
//! Free text from clients is trimmed, stripped of control characters
//! (newlines and tabs survive) and has `<` / `>` escaped before it is stored.
//! Length limits are counted in characters, not bytes.

use crate::shared::error::SharedError;

/// Clean a piece of free text for storage
pub fn sanitize_text(input: &str) -> String {
    escape_markup(&strip_controls(input))
}

/// Trim and drop control characters other than newline and tab
fn strip_controls(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| matches!(c, '\n' | '\t') || !c.is_control())
        .collect()
}

fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Sanitize a required field and check its length
///
/// The limit applies to what the user typed, before markup is escaped.
pub fn clean_required(field: &str, value: &str, max: usize) -> Result<String, SharedError> {
    let stripped = strip_controls(value);
    if stripped.is_empty() {
        return Err(SharedError::validation(field, format!("{} cannot be empty", field)));
    }
    check_max(field, &stripped, max)?;
    Ok(escape_markup(&stripped))
}

/// Sanitize an optional field; blank input becomes `None`
pub fn clean_optional(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, SharedError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let stripped = strip_controls(raw);
            if stripped.is_empty() {
                return Ok(None);
            }
            check_max(field, &stripped, max)?;
            Ok(Some(escape_markup(&stripped)))
        }
    }
}

fn check_max(field: &str, value: &str, max: usize) -> Result<(), SharedError> {
    if value.chars().count() > max {
        return Err(SharedError::validation(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(())
}

/// Validate username format
///
/// Usernames must be:
/// - 3-30 characters long
/// - Contain only alphanumeric characters and underscores
/// - Start with a letter
pub fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Basic email shape check: one `@` with something on both sides
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Passwords need at least 8 characters
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
}
