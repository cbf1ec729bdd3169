//! Scope paths: the identity of every resource in a synthesis pass.
//!
//! A resource's identity is its (parent scope, local id) pair. Paths render
//! as `parent/child` and local ids must be lowercase kebab-case so that
//! derived names (log groups, discovery hostnames, template paths) stay
//! valid everywhere they are embedded.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::{Error, Result};

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

/// Path identifying a resource: the chain of local ids from the synthesis
/// root down to the resource itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopePath(Vec<String>);

impl ScopePath {
    /// Create a root scope from a single local id.
    pub fn root(id: &str) -> Result<Self> {
        validate_id(id)?;
        Ok(Self(vec![id.to_string()]))
    }

    /// Create a child scope under this one.
    pub fn child(&self, id: &str) -> Result<Self> {
        validate_id(id)?;
        let mut segments = self.0.clone();
        segments.push(id.to_string());
        Ok(Self(segments))
    }

    /// The local id of this scope (the last path segment).
    pub fn local_id(&self) -> &str {
        // A ScopePath always holds at least one segment.
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// The parent scope, if this is not a root.
    pub fn parent(&self) -> Option<ScopePath> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Number of segments in this path.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

fn validate_id(id: &str) -> Result<()> {
    if ID_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(Error::InvalidValue {
            field: "id".to_string(),
            message: format!(
                "'{}' must match [a-z][a-z0-9-]* (lowercase kebab-case)",
                id
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_child_display() {
        let root = ScopePath::root("app").unwrap();
        let child = root.child("network").unwrap();
        assert_eq!(child.to_string(), "app/network");
        assert_eq!(child.local_id(), "network");
        assert_eq!(child.parent(), Some(root));
    }

    #[test]
    fn test_root_has_no_parent() {
        let root = ScopePath::root("app").unwrap();
        assert_eq!(root.parent(), None);
        assert_eq!(root.depth(), 1);
    }

    #[test]
    fn test_invalid_ids_rejected() {
        assert!(ScopePath::root("App").is_err());
        assert!(ScopePath::root("1app").is_err());
        assert!(ScopePath::root("").is_err());
        assert!(ScopePath::root("app_x").is_err());

        let root = ScopePath::root("app").unwrap();
        assert!(root.child("Bad Name").is_err());
        assert!(root.child("good-name").is_ok());
    }
}
