//! Transactional edits over a graph state and its view tree.
//!
//! # Responsibility
//! - Apply one user-level edit to the graph, then bring the tree in line.
//! - Apply tree changes at every expanded occurrence of the affected thing,
//!   not only at the position the user acted on.
//!
//! # Invariants
//! - Each operation consumes `(State, Tree)` and returns the next pair.
//! - Moving, indenting or unindenting the root is a silent no-op.
//! - Operations that need a parent and find none panic.
//! - Collapsed occurrences are left stale and reconciled when expanded.

use crate::graph::State;
use crate::model::node::NodeId;
use crate::model::thing::{ThingId, ROOT_THING};
use crate::tree::navigate::{child_index, parent, previous_sibling, previous_visible_item};
use crate::tree::reconcile::{load, nothing_to_disclose, reconcile, reconcile_occurrences, refresh};
use crate::tree::{ChildList, Tree};

/// Target slot for move and copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub parent: NodeId,
    pub index: usize,
}

/// Backreference panels with at most this many entries open with their node.
pub const AUTO_OPEN_BACKREFERENCES: usize = 3;

/// Builds the outline for `thing`.
///
/// The root is expanded and its other-parents and backreferences panels are
/// opened, since the top-level view lists the selected thing's parents.
pub fn from_root(state: &State, thing: &str) -> Tree {
    let tree = Tree::with_root(thing);
    let root = tree.root();
    let tree = expand(state, tree, root);
    let tree = expand_other_parents(state, tree, root);
    expand_backreferences(state, tree, root)
}

// Expansion

/// Flips the expansion of `node`.
///
/// A node with nothing to disclose is forced expanded instead. Expanding a
/// node also brings its panels up to date and opens a short backreferences
/// panel; backreferences that are nothing but a link are expanded too.
pub fn toggle(state: &State, tree: Tree, node: NodeId) -> Tree {
    toggle_with(state, tree, node, true)
}

fn toggle_with(state: &State, tree: Tree, node: NodeId, follow_links: bool) -> Tree {
    let parent_thing = parent(&tree, node).map(|p| tree.thing(p).to_string());
    if nothing_to_disclose(state, tree.thing(node), parent_thing.as_deref()) {
        return tree.mark_expanded(node, true);
    }
    let expanded = !tree.expanded(node);
    let tree = tree.mark_expanded(node, expanded);
    if !expanded {
        return tree;
    }

    let tree = reconcile(state, tree, node, ChildList::Children);
    let tree = reconcile(state, tree, node, ChildList::OtherParents);
    let few_backreferences =
        state.backreferences(tree.thing(node)).len() <= AUTO_OPEN_BACKREFERENCES;
    let tree = if few_backreferences {
        tree.mark_list_expanded(node, ChildList::Backreferences, true)
    } else {
        tree
    };
    let tree = reconcile(state, tree, node, ChildList::Backreferences);
    if follow_links {
        expand_link_only_backreferences(state, tree, node)
    } else {
        tree
    }
}

/// Expands backreferences of `node` whose content is a single link.
///
/// One level only, so mutually linking things cannot expand forever.
fn expand_link_only_backreferences(state: &State, mut tree: Tree, node: NodeId) -> Tree {
    for child in tree.backreferences_children(node).to_vec() {
        if !tree.expanded(child) && state.is_link_only(tree.thing(child)) {
            tree = toggle_with(state, tree, child, false);
        }
    }
    tree
}

pub fn expand(state: &State, tree: Tree, node: NodeId) -> Tree {
    if tree.expanded(node) {
        tree
    } else {
        toggle(state, tree, node)
    }
}

fn toggle_list(state: &State, tree: Tree, node: NodeId, list: ChildList) -> Tree {
    let expanded = !tree.list_expanded(node, list);
    let tree = tree.mark_list_expanded(node, list, expanded);
    if !expanded {
        return tree;
    }
    let tree = reconcile(state, tree, node, list);
    if list == ChildList::Backreferences {
        expand_link_only_backreferences(state, tree, node)
    } else {
        tree
    }
}

pub fn toggle_backreferences(state: &State, tree: Tree, node: NodeId) -> Tree {
    toggle_list(state, tree, node, ChildList::Backreferences)
}

pub fn expand_backreferences(state: &State, tree: Tree, node: NodeId) -> Tree {
    if tree.backreferences_expanded(node) {
        tree
    } else {
        toggle_backreferences(state, tree, node)
    }
}

pub fn toggle_other_parents(state: &State, tree: Tree, node: NodeId) -> Tree {
    toggle_list(state, tree, node, ChildList::OtherParents)
}

pub fn expand_other_parents(state: &State, tree: Tree, node: NodeId) -> Tree {
    if tree.other_parents_expanded(node) {
        tree
    } else {
        toggle_other_parents(state, tree, node)
    }
}

// Moving

/// Makes `node` the last child of its previous sibling.
pub fn indent(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    if node == tree.root() {
        return (state, tree);
    }
    let (Some(old_parent), Some(new_parent)) = (parent(&tree, node), previous_sibling(&tree, node))
    else {
        return (state, tree);
    };

    let mut index = state.child_connections(tree.thing(new_parent)).len();
    if tree.thing(new_parent) == tree.thing(old_parent) {
        index -= 1;
    }
    move_node(
        state,
        tree,
        node,
        Destination {
            parent: new_parent,
            index,
        },
    )
}

/// Moves `node` right after its parent, inside its grandparent.
pub fn unindent(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    let Some(parent_node) = parent(&tree, node) else {
        return (state, tree);
    };
    let Some(grandparent) = parent(&tree, parent_node) else {
        return (state, tree);
    };
    let index = child_index(&tree, grandparent, parent_node) + 1;
    move_node(
        state,
        tree,
        node,
        Destination {
            parent: grandparent,
            index,
        },
    )
}

/// Moves the connection behind `node` to `destination`.
///
/// `destination.index` is a graph index, applied after the old connection is
/// removed. Focus follows the moved node.
pub fn move_node(state: State, tree: Tree, node: NodeId, destination: Destination) -> (State, Tree) {
    let Some(old_parent) = parent(&tree, node) else {
        return (state, tree);
    };
    let old_index = child_index(&tree, old_parent, node);
    let old_parent_thing = tree.thing(old_parent).to_string();
    let moved_thing = tree.thing(node).to_string();
    let was_focused = tree.has_focus(node);

    let mut tree = expand(&state, tree, destination.parent);
    let destination_thing = tree.thing(destination.parent).to_string();

    let state = state.remove_child(&old_parent_thing, old_index);
    let (state, connection) =
        state.insert_child(&destination_thing, &moved_thing, destination.index);

    for occurrence in tree.all_nodes().collect::<Vec<_>>() {
        if !tree.expanded(occurrence) {
            continue;
        }
        let thing = tree.thing(occurrence).to_string();
        if thing == old_parent_thing && old_index < tree.children(occurrence).len() {
            tree = tree.update_children(occurrence, |children| {
                children.remove(old_index);
            });
        }
        if thing == destination_thing {
            let (child, next) = load(
                &state,
                tree,
                &moved_thing,
                Some(occurrence),
                Some(connection.id),
            );
            tree = next.update_children(occurrence, |children| {
                let index = destination.index.min(children.len());
                children.insert(index, child);
            });
        }
    }

    if was_focused {
        if let Some(moved) = tree.children(destination.parent).get(destination.index).copied() {
            tree = tree.focus(moved);
        }
    }

    let tree = reconcile_occurrences(&state, tree, &moved_thing, ChildList::OtherParents);
    (state, tree)
}

/// Moves `source` into the slot of `destination_node`, pushing it down.
pub fn move_to_above(
    state: State,
    tree: Tree,
    source: NodeId,
    destination_node: NodeId,
) -> (State, Tree) {
    let Some(parent_node) = parent(&tree, destination_node) else {
        return (state, tree);
    };
    let mut index = child_index(&tree, parent_node, destination_node);
    if let Some(source_parent) = parent(&tree, source) {
        let same_thing = tree.thing(source_parent) == tree.thing(parent_node);
        if same_thing && child_index(&tree, source_parent, source) < index {
            index -= 1;
        }
    }
    move_node(
        state,
        tree,
        source,
        Destination {
            parent: parent_node,
            index,
        },
    )
}

pub fn move_up(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    let Some(parent_node) = parent(&tree, node) else {
        return (state, tree);
    };
    let index = child_index(&tree, parent_node, node);
    if index == 0 {
        return (state, tree);
    }
    move_node(
        state,
        tree,
        node,
        Destination {
            parent: parent_node,
            index: index - 1,
        },
    )
}

pub fn move_down(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    let Some(parent_node) = parent(&tree, node) else {
        return (state, tree);
    };
    let index = child_index(&tree, parent_node, node);
    if index + 1 >= tree.children(parent_node).len() {
        return (state, tree);
    }
    move_node(
        state,
        tree,
        node,
        Destination {
            parent: parent_node,
            index: index + 1,
        },
    )
}

// Copying

/// Adds another connection to the thing of `node` at `destination`.
///
/// Returns the node now at `destination`.
pub fn copy(
    state: State,
    tree: Tree,
    node: NodeId,
    destination: Destination,
) -> (State, Tree, NodeId) {
    let copied_thing = tree.thing(node).to_string();
    let tree = expand(&state, tree, destination.parent);
    let destination_thing = tree.thing(destination.parent).to_string();

    let (state, _) = state.insert_child(&destination_thing, &copied_thing, destination.index);
    let tree = reconcile_occurrences(&state, tree, &destination_thing, ChildList::Children);
    let tree = reconcile_occurrences(&state, tree, &copied_thing, ChildList::OtherParents);
    let copied = tree.children(destination.parent)[destination.index];
    (state, tree, copied)
}

pub fn copy_to_above(
    state: State,
    tree: Tree,
    source: NodeId,
    destination_node: NodeId,
) -> (State, Tree, NodeId) {
    let Some(parent_node) = parent(&tree, destination_node) else {
        return (state, tree, source);
    };
    let index = child_index(&tree, parent_node, destination_node);
    copy(
        state,
        tree,
        source,
        Destination {
            parent: parent_node,
            index,
        },
    )
}

/// Shows the thing of `node` once more, right above it. Focus stays on `node`.
pub fn clone_node(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    let (state, tree, _) = copy_to_above(state, tree, node, node);
    (state, tree.focus(node))
}

// Creating

/// Creates an empty thing right above `node` and focuses it.
///
/// # Panics
/// When `node` has no parent.
pub fn create_sibling_before(state: State, tree: Tree, node: NodeId) -> (State, Tree, ThingId, NodeId) {
    create_sibling(state, tree, node, 0)
}

/// Creates an empty thing right below `node` and focuses it.
///
/// # Panics
/// When `node` has no parent.
pub fn create_sibling_after(state: State, tree: Tree, node: NodeId) -> (State, Tree, ThingId, NodeId) {
    create_sibling(state, tree, node, 1)
}

fn create_sibling(
    state: State,
    tree: Tree,
    node: NodeId,
    offset: usize,
) -> (State, Tree, ThingId, NodeId) {
    let Some(parent_node) = parent(&tree, node) else {
        panic!("cannot create sibling of node {node} without parent");
    };
    let parent_thing = tree.thing(parent_node).to_string();
    let index = child_index(&tree, parent_node, node) + offset;

    let (state, new_thing) = state.create(None);
    let (state, connection) = state.insert_child(&parent_thing, &new_thing, index);

    let (new_node, tree) = load(&state, tree, &new_thing, Some(parent_node), Some(connection.id));
    let tree = tree.update_children(parent_node, |children| children.insert(index, new_node));
    let tree = reconcile_occurrences(&state, tree, &parent_thing, ChildList::Children);
    (state, tree.focus(new_node), new_thing, new_node)
}

/// Creates an empty thing as the last child of `node` and focuses it.
pub fn create_child(state: State, tree: Tree, node: NodeId) -> (State, Tree, ThingId, NodeId) {
    let parent_thing = tree.thing(node).to_string();
    let tree = expand(&state, tree, node);

    let (state, new_thing) = state.create(None);
    let (state, connection) = state.add_child(&parent_thing, &new_thing);

    let (new_node, tree) = load(&state, tree, &new_thing, Some(node), Some(connection.id));
    let tree = tree.update_children(node, |children| children.push(new_node));
    let tree = reconcile_occurrences(&state, tree, &parent_thing, ChildList::Children);
    (state, tree.focus(new_node), new_thing, new_node)
}

// Linking existing things

/// Links the existing `child` under the thing of `node` at `position`.
pub fn insert_child(
    state: State,
    tree: Tree,
    node: NodeId,
    child: &str,
    position: usize,
) -> (State, Tree) {
    let (state, _) = state.insert_child(tree.thing(node), child, position);
    let tree = refresh(tree, &state);
    (state, tree)
}

/// Links the existing `sibling` right below `node`.
pub fn insert_sibling_after(state: State, tree: Tree, node: NodeId, sibling: &str) -> (State, Tree) {
    let Some(parent_node) = parent(&tree, node) else {
        return (state, tree);
    };
    let index = child_index(&tree, parent_node, node) + 1;
    insert_child(state, tree, parent_node, sibling, index)
}

/// Links the thing of `node` as the last child of the existing `new_parent`.
pub fn insert_parent(state: State, tree: Tree, node: NodeId, new_parent: &str) -> (State, Tree) {
    let (state, _) = state.add_child(new_parent, tree.thing(node));
    let tree = refresh(tree, &state);
    (state, tree)
}

/// Sets or clears the tag of the connection `node` was loaded through.
pub fn set_tag(state: State, tree: Tree, node: NodeId, tag: Option<&str>) -> (State, Tree) {
    match tree.connection(node) {
        Some(connection) if state.connection(connection).is_some() => {
            (state.set_tag(connection, tag), tree)
        }
        _ => (state, tree),
    }
}

// Removing

/// Detaches `node` from its parent and focuses the item above it.
pub fn remove(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    let Some(parent_node) = parent(&tree, node) else {
        return (state, tree);
    };
    let index = child_index(&tree, parent_node, node);
    let parent_thing = tree.thing(parent_node).to_string();
    let removed_thing = tree.thing(node).to_string();
    let focus_target = previous_visible_item(&tree, node);

    let state = state.remove_child(&parent_thing, index);

    let mut tree = tree.focus(focus_target);
    for occurrence in tree.nodes_showing(&parent_thing) {
        if tree.expanded(occurrence) && index < tree.children(occurrence).len() {
            tree = tree.update_children(occurrence, |children| {
                children.remove(index);
            });
        }
    }

    let tree = reconcile_occurrences(&state, tree, &removed_thing, ChildList::OtherParents);
    (state, tree)
}

/// Deletes the thing of `node` and purges every position showing it.
///
/// The root node, the root thing and the thing shown at the root are never
/// deleted.
pub fn remove_thing(state: State, tree: Tree, node: NodeId) -> (State, Tree) {
    let removed = tree.thing(node).to_string();
    if node == tree.root() || removed == ROOT_THING || removed == tree.thing(tree.root()) {
        return (state, tree);
    }
    let focus_target = previous_visible_item(&tree, node);

    let state = state.remove(&removed);

    let mut tree = tree;
    for occurrence in tree.all_nodes().collect::<Vec<_>>() {
        for list in ChildList::ALL {
            let current = tree.list_children(occurrence, list);
            let kept: Vec<NodeId> = current
                .iter()
                .copied()
                .filter(|child| tree.thing(*child) != removed)
                .collect();
            if kept.len() != current.len() {
                tree = tree.update_list(occurrence, list, |children| *children = kept);
            }
        }
        if tree.is_link_open(occurrence, &removed) {
            tree = tree.set_opened_link_node(occurrence, &removed, None);
        }
    }

    if let Some(focused) = tree.focused() {
        let reachable = |tree: &Tree, target: NodeId| tree.all_nodes().any(|n| n == target);
        if !reachable(&tree, focused) {
            tree = if reachable(&tree, focus_target) {
                tree.focus(focus_target)
            } else {
                tree.unfocus()
            };
        }
    }

    (state, tree)
}

// Inline links

/// Opens or closes the inline panel for `link` under `node`.
///
/// Opening expands `node` and the opened link so its children show at once.
pub fn toggle_link(state: &State, tree: Tree, node: NodeId, link: &str) -> Tree {
    if tree.is_link_open(node, link) {
        return tree.set_opened_link_node(node, link, None);
    }
    let (link_node, tree) = load(state, tree, link, None, None);
    let tree = tree.set_opened_link_node(node, link, Some(link_node));
    let tree = expand(state, tree, node);
    toggle(state, tree, link_node)
}
