//! Graph-to-view reconciliation.
//!
//! # Responsibility
//! - Bring one derived list of one node in line with the graph.
//! - Keep node identity (and so expansion and focus) for untouched
//!   positions when exactly one element was inserted.
//!
//! # Invariants
//! - Collapsed lists are never touched; they may stay stale until expanded.
//! - After reconciliation an expanded list shows exactly the graph sequence.
//! - Any change other than a single insertion rebuilds the whole list with
//!   fresh nodes. Per-position state of that list is lost.
//! - A kept child position always carries the connection it shows in the
//!   graph, even when only connection ids changed.

use crate::graph::State;
use crate::model::node::NodeId;
use crate::model::thing::{ConnectionId, ThingId};
use crate::tree::navigate::parent;
use crate::tree::{ChildList, Tree};
use log::trace;
use std::collections::BTreeSet;

/// Whether `thing` has nothing to show when expanded under `parent_thing`.
pub(crate) fn nothing_to_disclose(state: &State, thing: &str, parent_thing: Option<&str>) -> bool {
    if !state.exists(thing) {
        return true;
    }
    let has_other_parents = match parent_thing {
        Some(parent_thing) => !state.other_parents(thing, Some(parent_thing)).is_empty(),
        None => false,
    };
    !state.has_children(thing) && state.backreferences(thing).is_empty() && !has_other_parents
}

/// Allocates a node for `thing` shown under `parent`.
///
/// The node starts expanded only when there is nothing to disclose.
pub fn load(
    state: &State,
    tree: Tree,
    thing: &str,
    parent: Option<NodeId>,
    connection: Option<ConnectionId>,
) -> (NodeId, Tree) {
    let parent_thing = parent.map(|node| tree.thing(node).to_string());
    let (node, tree) = tree.load_node(thing, connection);
    if nothing_to_disclose(state, thing, parent_thing.as_deref()) {
        (node, tree.mark_expanded(node, true))
    } else {
        (node, tree)
    }
}

fn authoritative(
    state: &State,
    tree: &Tree,
    node: NodeId,
    list: ChildList,
) -> Vec<(ThingId, Option<ConnectionId>)> {
    let thing = tree.thing(node);
    match list {
        ChildList::Children => state
            .child_connections(thing)
            .iter()
            .filter_map(|id| {
                state
                    .connection_child(*id)
                    .map(|child| (child.to_string(), Some(*id)))
            })
            .collect(),
        ChildList::Backreferences => state
            .backreferences(thing)
            .into_iter()
            .map(|other| (other, None))
            .collect(),
        ChildList::OtherParents => {
            let parent_thing = parent(tree, node).map(|p| tree.thing(p));
            state
                .other_parents(thing, parent_thing)
                .into_iter()
                .map(|other| (other, None))
                .collect()
        }
    }
}

/// Reconciles `list` of `node` against `state`.
pub fn reconcile(state: &State, tree: Tree, node: NodeId, list: ChildList) -> Tree {
    if !tree.list_expanded(node, list) {
        return tree;
    }

    let wanted = authoritative(state, &tree, node, list);
    let recorded_len = tree.list_children(node, list).len();
    if shows_things(&tree, node, list, &wanted) {
        return sync_connections(tree, node, list, &wanted);
    }

    if wanted.len() == recorded_len + 1 {
        let tree = insert_one(state, tree, node, list, &wanted);
        if shows_things(&tree, node, list, &wanted) {
            return sync_connections(tree, node, list, &wanted);
        }
        rebuild(state, tree, node, list, &wanted)
    } else {
        rebuild(state, tree, node, list, &wanted)
    }
}

fn shows_things(
    tree: &Tree,
    node: NodeId,
    list: ChildList,
    wanted: &[(ThingId, Option<ConnectionId>)],
) -> bool {
    let recorded = tree.list_children(node, list);
    recorded.len() == wanted.len()
        && recorded
            .iter()
            .zip(wanted)
            .all(|(child, (thing, _))| tree.thing(*child) == thing.as_str())
}

/// Points each position of a children list at the connection it shows now.
fn sync_connections(
    mut tree: Tree,
    node: NodeId,
    list: ChildList,
    wanted: &[(ThingId, Option<ConnectionId>)],
) -> Tree {
    if list != ChildList::Children {
        return tree;
    }
    let recorded = tree.list_children(node, list).to_vec();
    for (child, (_, connection)) in recorded.into_iter().zip(wanted) {
        if tree.connection(child) != *connection {
            tree = tree.set_connection(child, *connection);
        }
    }
    tree
}

/// Loads the one missing position, keeping every other node.
///
/// Children are matched by connection as well as by thing, so a second
/// connection to an already shown thing gets its own position.
fn insert_one(
    state: &State,
    mut tree: Tree,
    node: NodeId,
    list: ChildList,
    wanted: &[(ThingId, Option<ConnectionId>)],
) -> Tree {
    let load_parent = (list == ChildList::Children).then_some(node);
    let mut inserted = false;
    for (index, (thing, connection)) in wanted.iter().enumerate() {
        let current = tree.list_children(node, list).get(index).copied();
        let matches = current.is_some_and(|child| {
            tree.thing(child) == thing.as_str()
                && (inserted || load_parent.is_none() || tree.connection(child) == *connection)
        });
        if matches {
            continue;
        }
        let (child, next) = load(state, tree, thing, load_parent, *connection);
        tree = next.update_list(node, list, |children| children.insert(index, child));
        inserted = true;
    }

    tree.update_list(node, list, |children| children.truncate(wanted.len()))
}

fn rebuild(
    state: &State,
    tree: Tree,
    node: NodeId,
    list: ChildList,
    wanted: &[(ThingId, Option<ConnectionId>)],
) -> Tree {
    trace!(
        "event=reconcile module=tree status=rebuild node={node} list={} len={}",
        list.as_str(),
        wanted.len()
    );
    let load_parent = (list == ChildList::Children).then_some(node);
    let mut tree = tree.update_list(node, list, Vec::clear);
    for (thing, connection) in wanted {
        let (child, next) = load(state, tree, thing, load_parent, *connection);
        tree = next.update_list(node, list, |children| children.push(child));
    }
    tree
}

/// Reconciles every list of every reachable node.
///
/// Walks from the root with an explicit stack, reconciling a node before
/// descending into its lists. Nodes whose thing is gone are skipped; their
/// parent drops them.
pub fn refresh(tree: Tree, state: &State) -> Tree {
    let mut result = tree;
    let mut stack = vec![result.root()];
    let mut visited = BTreeSet::new();
    while let Some(node) = stack.pop() {
        if result.get(node).is_none() || !visited.insert(node) {
            continue;
        }
        if state.exists(result.thing(node)) {
            for list in ChildList::ALL {
                result = reconcile(state, result, node, list);
            }
        }
        stack.extend(result.successors(node).into_iter().rev());
    }
    result
}

/// Reconciles `list` at every expanded occurrence of `thing`.
pub(crate) fn reconcile_occurrences(
    state: &State,
    tree: Tree,
    thing: &str,
    list: ChildList,
) -> Tree {
    let mut result = tree;
    for node in result.nodes_showing(thing) {
        if result.get(node).is_some() {
            result = reconcile(state, result, node, list);
        }
    }
    result
}
