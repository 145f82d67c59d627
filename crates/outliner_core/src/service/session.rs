//! Editing session: one graph, one outline over it, and its undo history.
//!
//! # Responsibility
//! - Own the current `State`, `Tree` and `History` for one document view.
//! - Run edits as transactions and record undo entries for graph changes.
//! - Fold in updates arriving from a synchronization collaborator.
//!
//! # Invariants
//! - A history entry is pushed only when an edit changed the graph.
//! - After every edit the tree arena holds reachable nodes only.
//! - External updates never create history entries.
//! - Edits run tagged with their action name, so an invariant panic inside
//!   one is logged against it.

use crate::graph::hydrate::{HydrateResult, ThingRecord};
use crate::graph::State;
use crate::history::History;
use crate::logging;
use crate::model::node::NodeId;
use crate::model::thing::{ThingId, ROOT_THING};
use crate::tree::edit;
use crate::tree::navigate;
use crate::tree::reconcile::refresh;
use crate::tree::Tree;
use log::{debug, info};

/// Session facade over state, tree and history.
#[derive(Debug, Clone)]
pub struct Session {
    state: State,
    tree: Tree,
    history: History,
}

impl Session {
    /// Opens a session on `state`, showing the root thing.
    pub fn new(state: State) -> Self {
        Self::with_history(state, History::new())
    }

    /// Opens a session whose history keeps at most `limit` states.
    pub fn with_history_limit(state: State, limit: usize) -> Self {
        Self::with_history(state, History::with_limit(limit))
    }

    fn with_history(state: State, history: History) -> Self {
        let tree = edit::from_root(&state, ROOT_THING);
        info!(
            "event=session_open module=session status=ok things={} history_limit={}",
            state.thing_count(),
            history
                .limit()
                .map_or_else(|| "none".to_string(), |limit| limit.to_string())
        );
        Self {
            state,
            tree,
            history,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn take_tree(&mut self) -> Tree {
        std::mem::replace(&mut self.tree, Tree::with_root(ROOT_THING))
    }

    /// Runs one graph edit as a transaction.
    ///
    /// The previous state is recorded for undo only when `edit` changed it.
    pub fn apply(&mut self, action: &str, edit: impl FnOnce(State, Tree) -> (State, Tree)) {
        self.transact(action, |state, tree| {
            let (state, tree) = edit(state, tree);
            (state, tree, ())
        });
    }

    fn transact<T>(&mut self, action: &str, edit: impl FnOnce(State, Tree) -> (State, Tree, T)) -> T {
        let previous = self.state.clone();
        let tree = self.take_tree();
        let (state, tree, output) = logging::with_action(action, || edit(previous.clone(), tree));

        let changed = state != previous;
        if changed {
            let history = std::mem::take(&mut self.history);
            self.history = history.push(previous);
        }
        self.state = state;
        self.tree = tree.retain_reachable();
        debug!(
            "event=session_edit module=session status=ok action={action} changed={changed} history={} nodes={}",
            self.history.len(),
            self.tree.arena_len()
        );
        output
    }

    /// Runs one view-only change. Nothing is recorded.
    pub fn update_tree(&mut self, action: &str, update: impl FnOnce(&State, Tree) -> Tree) {
        let tree = self.take_tree();
        let tree = logging::with_action(action, || update(&self.state, tree));
        self.tree = tree.retain_reachable();
        debug!(
            "event=session_view module=session status=ok action={action} nodes={}",
            self.tree.arena_len()
        );
    }

    pub fn set_content(&mut self, node: NodeId, content: &str) {
        self.apply("set_content", |state, tree| {
            let state = state.set_content(tree.thing(node), content);
            (state, tree)
        });
    }

    pub fn indent(&mut self, node: NodeId) {
        self.apply("indent", |state, tree| edit::indent(state, tree, node));
    }

    pub fn unindent(&mut self, node: NodeId) {
        self.apply("unindent", |state, tree| edit::unindent(state, tree, node));
    }

    /// Creates a child of `node` and returns the new thing and position.
    pub fn create_child(&mut self, node: NodeId) -> (ThingId, NodeId) {
        self.transact("create_child", |state, tree| {
            let (state, tree, thing, new_node) = edit::create_child(state, tree, node);
            (state, tree, (thing, new_node))
        })
    }

    /// Creates a sibling right below `node` and returns the new thing and
    /// position.
    ///
    /// # Panics
    /// When `node` has no parent.
    pub fn create_sibling_after(&mut self, node: NodeId) -> (ThingId, NodeId) {
        self.transact("create_sibling_after", |state, tree| {
            let (state, tree, thing, new_node) = edit::create_sibling_after(state, tree, node);
            (state, tree, (thing, new_node))
        })
    }

    pub fn remove(&mut self, node: NodeId) {
        self.apply("remove", |state, tree| edit::remove(state, tree, node));
    }

    pub fn remove_thing(&mut self, node: NodeId) {
        self.apply("remove_thing", |state, tree| edit::remove_thing(state, tree, node));
    }

    pub fn toggle(&mut self, node: NodeId) {
        self.update_tree("toggle", |state, tree| edit::toggle(state, tree, node));
    }

    pub fn focus_up(&mut self) {
        self.update_tree("focus_up", |_, tree| navigate::focus_up(tree));
    }

    pub fn focus_down(&mut self) {
        self.update_tree("focus_down", |_, tree| navigate::focus_down(tree));
    }

    /// Shows `thing` at the top of a fresh outline.
    pub fn select(&mut self, thing: &str) {
        self.tree = logging::with_action("select", || edit::from_root(&self.state, thing));
        debug!("event=session_select module=session status=ok nodes={}", self.tree.arena_len());
    }

    /// Restores the previous graph state. Returns `false` with empty history.
    pub fn undo(&mut self) -> bool {
        let history = std::mem::take(&mut self.history);
        let (history, previous) = history.pop();
        self.history = history;
        let Some(previous) = previous else {
            debug!("event=session_undo module=session status=empty");
            return false;
        };

        self.state = previous;
        let tree = self.take_tree();
        let tree = logging::with_action("undo", || refresh(tree, &self.state));
        self.tree = tree.retain_reachable();
        debug!(
            "event=session_undo module=session status=ok history={}",
            self.history.len()
        );
        true
    }

    /// Applies "thing changed" records from outside and refreshes the tree.
    ///
    /// On error the session is left untouched.
    pub fn receive_updates(&mut self, records: &[ThingRecord]) -> HydrateResult<()> {
        let mut state = self.state.clone();
        for record in records {
            state = state.apply_record(record)?;
        }
        self.state = state;
        let tree = self.take_tree();
        let tree = logging::with_action("receive_updates", || refresh(tree, &self.state));
        self.tree = tree.retain_reachable();
        debug!(
            "event=session_receive module=session status=ok records={}",
            records.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::graph::State;
    use crate::logging::current_action;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn edits_are_tagged_while_they_run() {
        let mut session = Session::new(State::empty());
        session.apply("rename", |state, tree| {
            assert_eq!(current_action().as_deref(), Some("rename"));
            (state, tree)
        });
        assert_eq!(current_action(), None);
    }

    #[test]
    fn tag_is_dropped_when_an_edit_breaks_an_invariant() {
        let mut session = Session::new(State::empty());
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            session.apply("remove_child", |state, tree| {
                let state = state.remove_child("0", 4);
                (state, tree)
            })
        }));
        assert!(outcome.is_err());
        assert_eq!(current_action(), None);
    }
}
