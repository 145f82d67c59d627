//! View tree: an arena of positions mirroring the graph as an outline.
//!
//! # Responsibility
//! - Hold every on-screen position (`Node`) in a flat arena keyed by `NodeId`.
//! - Provide read accessors and value-in/value-out node updates.
//! - Enumerate reachable positions without recursion.
//!
//! # Invariants
//! - Node ids are allocated from `next_node_id` and never reused.
//! - Liveness is reachability from `root`; unreachable entries are garbage
//!   until `retain_reachable` drops them.
//! - A node has no parent pointer; its parent is found by scanning.
//!
//! # See also
//! - `reconcile` for keeping lists in line with the graph.
//! - `edit` for the transactional mutation operations.

use crate::graph::State;
use crate::model::node::{Node, NodeId};
use crate::model::thing::ConnectionId;
use std::collections::{BTreeMap, BTreeSet};

pub mod edit;
pub mod navigate;
pub mod reconcile;

/// Which derived child sequence of a node is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildList {
    /// Direct children through connections.
    Children,
    /// Things whose content references this thing.
    Backreferences,
    /// Parents of this thing other than its parent in the tree.
    OtherParents,
}

impl ChildList {
    pub const ALL: [ChildList; 3] = [
        ChildList::Children,
        ChildList::Backreferences,
        ChildList::OtherParents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Children => "children",
            Self::Backreferences => "backreferences",
            Self::OtherParents => "other_parents",
        }
    }
}

/// Persistent outline over a graph state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    next_node_id: u64,
    root: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    focus: Option<NodeId>,
}

impl Tree {
    /// Tree with a single collapsed root node for `thing`.
    pub(crate) fn with_root(thing: &str) -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Node::new(thing, None));
        Self {
            next_node_id: 1,
            root,
            nodes,
            focus: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node record, `None` for ids not in the arena.
    pub fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(&node)
    }

    /// Number of arena entries, reachable or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, node: NodeId) -> &Node {
        match self.nodes.get(&node) {
            Some(record) => record,
            None => panic!("node {node} is not in the tree"),
        }
    }

    fn update_node(mut self, node: NodeId, update: impl FnOnce(&mut Node)) -> Self {
        match self.nodes.get_mut(&node) {
            Some(record) => update(record),
            None => panic!("node {node} is not in the tree"),
        }
        self
    }

    pub fn thing(&self, node: NodeId) -> &str {
        &self.node(node).thing
    }

    pub fn connection(&self, node: NodeId) -> Option<ConnectionId> {
        self.node(node).connection
    }

    /// Tag of the connection `node` was loaded through.
    pub fn tag<'s>(&self, state: &'s State, node: NodeId) -> Option<&'s str> {
        self.connection(node).and_then(|id| state.tag(id))
    }

    pub fn expanded(&self, node: NodeId) -> bool {
        self.node(node).expanded
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    pub fn backreferences_expanded(&self, node: NodeId) -> bool {
        self.node(node).backreferences.expanded
    }

    pub fn backreferences_children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).backreferences.children
    }

    pub fn other_parents_expanded(&self, node: NodeId) -> bool {
        self.node(node).other_parents.expanded
    }

    pub fn other_parents_children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).other_parents.children
    }

    /// Expansion flag of one list: the node flag for children, the panel
    /// flag otherwise.
    pub fn list_expanded(&self, node: NodeId, list: ChildList) -> bool {
        let record = self.node(node);
        match list {
            ChildList::Children => record.expanded,
            ChildList::Backreferences => record.backreferences.expanded,
            ChildList::OtherParents => record.other_parents.expanded,
        }
    }

    pub fn list_children(&self, node: NodeId, list: ChildList) -> &[NodeId] {
        let record = self.node(node);
        match list {
            ChildList::Children => &record.children,
            ChildList::Backreferences => &record.backreferences.children,
            ChildList::OtherParents => &record.other_parents.children,
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    pub fn has_focus(&self, node: NodeId) -> bool {
        self.focus == Some(node)
    }

    pub fn focus(mut self, node: NodeId) -> Self {
        self.focus = Some(node);
        self
    }

    pub fn unfocus(mut self) -> Self {
        self.focus = None;
        self
    }

    pub fn mark_expanded(self, node: NodeId, expanded: bool) -> Self {
        self.update_node(node, |record| record.expanded = expanded)
    }

    pub fn mark_list_expanded(self, node: NodeId, list: ChildList, expanded: bool) -> Self {
        self.update_node(node, |record| match list {
            ChildList::Children => record.expanded = expanded,
            ChildList::Backreferences => record.backreferences.expanded = expanded,
            ChildList::OtherParents => record.other_parents.expanded = expanded,
        })
    }

    pub(crate) fn update_list(
        self,
        node: NodeId,
        list: ChildList,
        update: impl FnOnce(&mut Vec<NodeId>),
    ) -> Self {
        self.update_node(node, |record| {
            let panel: &mut Vec<NodeId> = match list {
                ChildList::Children => &mut record.children,
                ChildList::Backreferences => &mut record.backreferences.children,
                ChildList::OtherParents => &mut record.other_parents.children,
            };
            update(panel)
        })
    }

    pub(crate) fn update_children(self, node: NodeId, update: impl FnOnce(&mut Vec<NodeId>)) -> Self {
        self.update_list(node, ChildList::Children, update)
    }

    pub(crate) fn set_connection(self, node: NodeId, connection: Option<ConnectionId>) -> Self {
        self.update_node(node, |record| record.connection = connection)
    }

    /// Allocates a collapsed node for `thing`. Not attached anywhere yet.
    pub(crate) fn load_node(mut self, thing: &str, connection: Option<ConnectionId>) -> (NodeId, Self) {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.insert(id, Node::new(thing, connection));
        (id, self)
    }

    // Opened inline links.

    pub fn opened_link_node(&self, node: NodeId, link: &str) -> Option<NodeId> {
        self.node(node).opened_links.get(link).copied()
    }

    pub fn is_link_open(&self, node: NodeId, link: &str) -> bool {
        self.opened_link_node(node, link).is_some()
    }

    /// Opened link nodes of `node`, ordered by linked thing id.
    pub fn opened_links_children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).opened_links.values().copied().collect()
    }

    pub(crate) fn set_opened_link_node(self, node: NodeId, link: &str, opened: Option<NodeId>) -> Self {
        self.update_node(node, |record| match opened {
            Some(link_node) => {
                record.opened_links.insert(link.to_string(), link_node);
            }
            None => {
                record.opened_links.remove(link);
            }
        })
    }

    /// Every list a node points into, children first.
    pub(crate) fn successors(&self, node: NodeId) -> Vec<NodeId> {
        let Some(record) = self.nodes.get(&node) else {
            return Vec::new();
        };
        let mut result = record.children.clone();
        result.extend(record.opened_links.values().copied());
        result.extend(record.backreferences.children.iter().copied());
        result.extend(record.other_parents.children.iter().copied());
        result
    }

    /// Lazy pre-order walk over positions reachable from the root.
    pub fn all_nodes(&self) -> AllNodes<'_> {
        AllNodes {
            tree: self,
            stack: vec![self.root],
            visited: BTreeSet::new(),
        }
    }

    /// Drops arena entries that are no longer reachable from the root.
    pub fn retain_reachable(mut self) -> Self {
        let live: BTreeSet<NodeId> = self.all_nodes().collect();
        self.nodes.retain(|id, _| live.contains(id));
        if self.focus.is_some_and(|focus| !live.contains(&focus)) {
            self.focus = None;
        }
        self
    }

    /// Reachable nodes showing `thing`.
    pub fn nodes_showing(&self, thing: &str) -> Vec<NodeId> {
        self.all_nodes()
            .filter(|node| self.thing(*node) == thing)
            .collect()
    }
}

/// Iterator returned by `Tree::all_nodes`.
pub struct AllNodes<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
    visited: BTreeSet<NodeId>,
}

impl Iterator for AllNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(node) = self.stack.pop() {
            if !self.tree.nodes.contains_key(&node) || !self.visited.insert(node) {
                continue;
            }
            self.stack
                .extend(self.tree.successors(node).into_iter().rev());
            return Some(node);
        }
        None
    }
}
