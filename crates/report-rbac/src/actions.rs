//! # Actions
//!
//! Defines the closed set of actions a resource id can be calculated for.
//! The action is the first segment of every [`ResourceId`](crate::ResourceId).

use serde::{Deserialize, Serialize};

/// Actions that can be performed on a hierarchy resource.
///
/// The access-control store keys its records by resource id, and every
/// resource id starts with one of these actions:
/// - **Get**: Open/view the section
/// - **Post**: Create content below the section
/// - **Put**: Edit the section content
/// - **Delete**: Remove the section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Open/view a section.
    ///
    /// This is the action used for access overviews and breadcrumb trails.
    Get,

    /// Create content below a section.
    Post,

    /// Edit section content.
    Put,

    /// Remove a section.
    Delete,
}

impl Action {
    /// Get the string representation of the action.
    ///
    /// # Returns
    ///
    /// A static string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Post => "post",
            Action::Put => "put",
            Action::Delete => "delete",
        }
    }

    /// Parse action from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive, supports aliases)
    ///
    /// # Returns
    ///
    /// `Some(Action)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use report_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("get"), Some(Action::Get));
    /// assert_eq!(Action::parse("view"), Some(Action::Get)); // Alias
    /// assert_eq!(Action::parse("edit"), Some(Action::Put)); // Alias
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" | "view" | "read" => Some(Action::Get),
            "post" | "create" => Some(Action::Post),
            "put" | "edit" | "update" => Some(Action::Put),
            "delete" | "remove" => Some(Action::Delete),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![Action::Get, Action::Post, Action::Put, Action::Delete]
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!(Action::parse("get"), Some(Action::Get));
        assert_eq!(Action::parse("GET"), Some(Action::Get));
        assert_eq!(Action::parse("read"), Some(Action::Get));
        assert_eq!(Action::parse("post"), Some(Action::Post));
        assert_eq!(Action::parse("create"), Some(Action::Post));
        assert_eq!(Action::parse("put"), Some(Action::Put));
        assert_eq!(Action::parse("update"), Some(Action::Put));
        assert_eq!(Action::parse("delete"), Some(Action::Delete));
        assert_eq!(Action::parse("remove"), Some(Action::Delete));
        assert_eq!(Action::parse("approve"), None);
    }

    #[test]
    fn test_as_str_roundtrips_through_parse() {
        for action in Action::all() {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Action::Get).unwrap();
        assert_eq!(json, "\"get\"");
    }
}
