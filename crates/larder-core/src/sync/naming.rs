//! Rules for naming the remote sync file

use std::sync::LazyLock;

use regex::Regex;

use crate::error::NameValidationError;

/// Extension every sync file carries
pub const SYNC_FILE_EXTENSION: &str = ".mealsync";

static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|]"#).expect("Invalid regex"));

/// Append the sync file extension unless the name already ends with it.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    if name.ends_with(SYNC_FILE_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{SYNC_FILE_EXTENSION}")
    }
}

/// Check a user-chosen sync file name against the names already present at
/// the sync location.
///
/// Collisions compare normalized names exactly (case-sensitive).
pub fn validate_name<S: AsRef<str>>(
    name: &str,
    existing_names: &[S],
) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::Empty);
    }

    if let Some(found) = FORBIDDEN_CHARS.find(name) {
        let ch = found.as_str().chars().next().unwrap_or('/');
        return Err(NameValidationError::InvalidCharacter(ch));
    }

    let normalized = normalize_name(name);
    if existing_names
        .iter()
        .any(|existing| existing.as_ref() == normalized)
    {
        return Err(NameValidationError::AlreadyExists(normalized));
    }

    Ok(())
}
