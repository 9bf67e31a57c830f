// src/models/identifier.rs

//! Normalized path-like identifiers for files and folders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A normalized identifier, unique within one storage backend.
///
/// Always starts with a single `/`, never contains empty, `.` or `..`
/// segments, and has no trailing slash except for the root itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// The root-level identifier of every storage.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalize an identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(AppError::validation(format!(
                        "identifier '{raw}' must not contain '..'"
                    )));
                }
                s => segments.push(s),
            }
        }
        Ok(Self(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Identifier without its leading slash (empty for the root).
    pub fn relative(&self) -> &str {
        &self.0[1..]
    }

    /// Last path segment, empty for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Parent identifier, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Append a relative path below this identifier.
    pub fn join(&self, child: &str) -> Result<Self> {
        Self::parse(&format!("{}/{}", self.0, child))
    }

    /// Prefix this identifier with another one (`/base` + `/a/b` = `/base/a/b`).
    pub fn prefixed_with(&self, prefix: &Identifier) -> Self {
        match (prefix.is_root(), self.is_root()) {
            (true, _) => self.clone(),
            (false, true) => prefix.clone(),
            (false, false) => Self(format!("{}{}", prefix.0, self.0)),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_slashes() {
        assert_eq!(Identifier::parse("a/b.jpg").unwrap().as_str(), "/a/b.jpg");
        assert_eq!(Identifier::parse("//a///b.jpg/").unwrap().as_str(), "/a/b.jpg");
        assert_eq!(Identifier::parse("/./a/b.jpg").unwrap().as_str(), "/a/b.jpg");
        assert_eq!(Identifier::parse("").unwrap(), Identifier::root());
    }

    #[test]
    fn test_backslash_is_not_a_separator() {
        let id = Identifier::parse("/d/a\\b.txt").unwrap();
        assert_eq!(id.as_str(), "/d/a\\b.txt");
        assert_eq!(id.name(), "a\\b.txt");
        assert_eq!(id.parent().unwrap().as_str(), "/d");
    }

    #[test]
    fn test_parse_rejects_parent_segments() {
        assert!(Identifier::parse("/a/../etc/passwd").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        let id = Identifier::parse("/a/b/c.txt").unwrap();
        assert_eq!(id.name(), "c.txt");
        assert_eq!(id.parent().unwrap().as_str(), "/a/b");
        assert_eq!(Identifier::parse("/a").unwrap().parent(), Some(Identifier::root()));
        assert_eq!(Identifier::root().parent(), None);
    }

    #[test]
    fn test_prefixed_with() {
        let base = Identifier::parse("someDir").unwrap();
        let file = Identifier::parse("/a/b.jpg").unwrap();
        assert_eq!(file.prefixed_with(&base).as_str(), "/someDir/a/b.jpg");
        assert_eq!(file.prefixed_with(&Identifier::root()), file);
    }

    #[test]
    fn test_serde_roundtrip_normalizes() {
        let id: Identifier = serde_json::from_str("\"x//y/\"").unwrap();
        assert_eq!(id.as_str(), "/x/y");
    }
}
