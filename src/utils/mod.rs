//! Utility functions and helpers.

use url::Url;

use crate::error::{AppError, Result};
use crate::models::Identifier;

/// Normalize a configured base directory.
///
/// The result starts with exactly one slash and has no trailing slash.
/// Returns `None` when nothing is left after trimming.
pub fn normalize_base_dir(raw: &str) -> Result<Option<Identifier>> {
    let identifier = Identifier::parse(raw.trim())
        .map_err(|e| AppError::config(format!("invalid baseDir '{raw}': {e}")))?;
    Ok((!identifier.is_root()).then_some(identifier))
}

/// Check that a base URI is usable as a URL prefix.
///
/// Relative prefixes such as `/fileadmin/` are accepted as-is; anything with
/// a scheme must parse as an absolute URL.
pub fn validate_base_uri(raw: &str) -> Result<()> {
    if raw.contains("://") {
        Url::parse(raw)?;
    } else if raw.chars().any(char::is_whitespace) {
        return Err(AppError::config(format!(
            "base URI '{raw}' must not contain whitespace"
        )));
    }
    Ok(())
}

/// Join a URL prefix and a path with exactly one slash in between.
pub fn join_uri(prefix: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    if prefix.ends_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}
