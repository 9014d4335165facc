#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;

use crate::domain::models::MirrorError;

/// Derives the storage key for a display name. The result only contains
/// lower case ASCII letters, digits and underscores, and is stable for the same
/// input. Both `.` and `@` become `_at_` so keys match the user documents the
/// desktop app already wrote.
pub fn derive(display_name: &str) -> Result<String, MirrorError> {
    let identity = display_name
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(&['.', '@'][..], "_at_")
        .chars()
        .filter(|c| return c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>();

    if identity.is_empty() {
        return Err(MirrorError::InvalidIdentity(display_name.to_string()));
    }

    return Ok(identity);
}
