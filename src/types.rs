//! Core identifier types shared across the graph and engine layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination of a resolved router label.
///
/// Conditional edges map each declared label to either a named node or the
/// terminal sentinel. Static edges always connect named nodes; a branch that
/// resolves to [`RouteTarget::End`] simply stops extending the frontier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteTarget {
    /// Dispatch the named node.
    Node(String),
    /// Close this branch of the run.
    End,
}

impl RouteTarget {
    /// Convenience constructor for a named target.
    pub fn node(name: impl Into<String>) -> Self {
        RouteTarget::Node(name.into())
    }

    /// Returns the node name, or `None` for the terminal sentinel.
    pub fn as_node(&self) -> Option<&str> {
        match self {
            RouteTarget::Node(name) => Some(name),
            RouteTarget::End => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, RouteTarget::End)
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Node(name) => write!(f, "{name}"),
            RouteTarget::End => write!(f, "__end__"),
        }
    }
}

impl From<&str> for RouteTarget {
    fn from(name: &str) -> Self {
        RouteTarget::Node(name.to_owned())
    }
}

impl From<String> for RouteTarget {
    fn from(name: String) -> Self {
        RouteTarget::Node(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_accessor_and_display() {
        let t = RouteTarget::node("synthesizer");
        assert_eq!(t.as_node(), Some("synthesizer"));
        assert!(!t.is_end());
        assert_eq!(t.to_string(), "synthesizer");
    }

    #[test]
    fn end_sentinel() {
        let t = RouteTarget::End;
        assert_eq!(t.as_node(), None);
        assert!(t.is_end());
        assert_eq!(t.to_string(), "__end__");
    }

    #[test]
    fn from_str_is_a_node() {
        let t: RouteTarget = "review".into();
        assert_eq!(t, RouteTarget::Node("review".into()));
    }
}
