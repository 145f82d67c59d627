//! View tree position records.
//!
//! A `Node` is one on-screen position of a thing. The same thing can be shown
//! at many positions, each with its own expansion and panel state.

use crate::model::thing::{ConnectionId, ThingId};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Identifier of one view position. Disjoint from thing ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Raw numeric value, stable for the lifetime of the tree.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Collapsible list of derived positions under a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    pub expanded: bool,
    pub children: Vec<NodeId>,
}

/// One position in the view tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub thing: ThingId,
    /// Connection this position was loaded through. `None` for the root,
    /// panel entries and opened links.
    pub connection: Option<ConnectionId>,
    pub expanded: bool,
    pub children: Vec<NodeId>,
    pub backreferences: Panel,
    pub other_parents: Panel,
    /// At most one opened node per referenced thing.
    pub opened_links: BTreeMap<ThingId, NodeId>,
}

impl Node {
    /// Creates a collapsed node with empty lists.
    pub fn new(thing: impl Into<ThingId>, connection: Option<ConnectionId>) -> Self {
        Self {
            thing: thing.into(),
            connection,
            expanded: false,
            children: Vec::new(),
            backreferences: Panel::default(),
            other_parents: Panel::default(),
            opened_links: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeId};

    #[test]
    fn node_id_displays_with_prefix() {
        assert_eq!(NodeId(4).to_string(), "n4");
        assert_eq!(NodeId(4).value(), 4);
    }

    #[test]
    fn new_node_starts_collapsed() {
        let node = Node::new("a", None);
        assert!(!node.expanded);
        assert!(!node.backreferences.expanded);
        assert!(node.opened_links.is_empty());
    }
}
