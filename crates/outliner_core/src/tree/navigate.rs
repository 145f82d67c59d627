//! Structural lookups and focus movement over the view tree.
//!
//! Parents are found by a linear scan over reachable nodes; the tree keeps no
//! back-pointers.

use crate::model::node::NodeId;
use crate::tree::Tree;

/// Node whose children include `child`. `None` for the root and for
/// nodes that only live in panels or opened links.
pub fn parent(tree: &Tree, child: NodeId) -> Option<NodeId> {
    tree.all_nodes()
        .find(|node| tree.children(*node).contains(&child))
}

pub fn index_in_parent(tree: &Tree, node: NodeId) -> Option<usize> {
    let parent = parent(tree, node)?;
    tree.children(parent).iter().position(|child| *child == node)
}

/// Position of `child` among the children of `parent`.
///
/// # Panics
/// When `parent` does not contain `child`.
pub fn child_index(tree: &Tree, parent: NodeId, child: NodeId) -> usize {
    match tree.children(parent).iter().position(|node| *node == child) {
        Some(index) => index,
        None => panic!("node {parent} does not contain child {child}"),
    }
}

pub fn previous_sibling(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let parent = parent(tree, node)?;
    let index = child_index(tree, parent, node);
    if index == 0 {
        return None;
    }
    tree.children(parent).get(index - 1).copied()
}

pub fn next_sibling(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let parent = parent(tree, node)?;
    let index = child_index(tree, parent, node);
    tree.children(parent).get(index + 1).copied()
}

/// Item shown directly above `node`.
///
/// That is the deepest last expanded descendant of the previous sibling, or
/// the parent for a first child. A parentless node is its own answer.
pub fn previous_visible_item(tree: &Tree, node: NodeId) -> NodeId {
    let Some(parent) = parent(tree, node) else {
        return node;
    };
    let Some(mut result) = previous_sibling(tree, node) else {
        return parent;
    };
    while tree.expanded(result) {
        match tree.children(result).last() {
            Some(last) => result = *last,
            None => break,
        }
    }
    result
}

/// Item shown directly below `node`, or the root when `node` is last.
pub fn next_visible_item(tree: &Tree, node: NodeId) -> NodeId {
    if tree.expanded(node) {
        if let Some(first) = tree.children(node).first() {
            return *first;
        }
    }

    let mut cursor = node;
    while cursor != tree.root() {
        if let Some(sibling) = next_sibling(tree, cursor) {
            return sibling;
        }
        match parent(tree, cursor) {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    cursor
}

/// Moves focus to the previous visible item. No-op without focus.
pub fn focus_up(tree: Tree) -> Tree {
    match tree.focused() {
        Some(focused) => {
            let target = previous_visible_item(&tree, focused);
            tree.focus(target)
        }
        None => tree,
    }
}

/// Moves focus to the next visible item. No-op without focus.
pub fn focus_down(tree: Tree) -> Tree {
    match tree.focused() {
        Some(focused) => {
            let target = next_visible_item(&tree, focused);
            tree.focus(target)
        }
        None => tree,
    }
}
