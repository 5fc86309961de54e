//! Roots Types
//!
//! Types for the client's filesystem/workspace roots, which the server can
//! query via `roots/list` when the client declares the `roots` capability.
//! Per MCP 2025-06-18 schema.

use serde::{Deserialize, Serialize};

/// A root directory or file the client is exposing to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    /// URI of the root. Currently only `file://` URIs are required to be
    /// supported by clients, but the type itself does not constrain the
    /// scheme.
    pub uri: String,

    /// Human-readable name for the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Root {
    /// Create a new root from a URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
        }
    }

    /// Set the human-readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Result of a `roots/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRootsResult {
    pub roots: Vec<Root>,
}

impl ListRootsResult {
    pub fn new(roots: Vec<Root>) -> Self {
        Self { roots }
    }
}

/// Notification sent by the client when its root set changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootsListChangedNotification {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_creation() {
        let root = Root::new("file:///home/user/project").with_name("project");
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["uri"], "file:///home/user/project");
        assert_eq!(json["name"], "project");
    }

    #[test]
    fn test_list_roots_result() {
        let result = ListRootsResult::new(vec![Root::new("file:///a"), Root::new("file:///b")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["roots"].as_array().unwrap().len(), 2);
    }
}
