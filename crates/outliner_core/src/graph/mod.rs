//! Graph store: things, connections and the derived connection relation.
//!
//! # Responsibility
//! - Own thing content and the directed, taggable connections between things.
//! - Provide value-in/value-out edits; every edit consumes a `State` and
//!   returns the next one, callers clone to keep older snapshots.
//!
//! # Invariants
//! - Connection symmetry: a connection id is listed once in its parent's
//!   `children` and once in its child's `parents`; removal clears both.
//! - Every connection endpoint exists in `things`.
//! - `ROOT_THING` is never removed.
//!
//! # See also
//! - `content` for inline references and search.
//! - `hydrate` for bulk loading.

use crate::model::thing::{
    generate_thing_id, Connection, ConnectionId, ThingData, ThingId, ROOT_CONTENT, ROOT_THING,
};
use log::warn;
use std::collections::BTreeMap;

pub mod content;
pub mod diff;
pub mod hydrate;

/// Immutable-by-convention graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    things: BTreeMap<ThingId, ThingData>,
    connections: BTreeMap<ConnectionId, Connection>,
    next_connection_id: u64,
}

impl Default for State {
    fn default() -> Self {
        Self::empty()
    }
}

impl State {
    /// Store holding only the root thing.
    pub fn empty() -> Self {
        let mut things = BTreeMap::new();
        things.insert(
            ROOT_THING.to_string(),
            ThingData {
                content: ROOT_CONTENT.to_string(),
                ..ThingData::default()
            },
        );
        Self {
            things,
            connections: BTreeMap::new(),
            next_connection_id: 0,
        }
    }

    pub fn exists(&self, thing: &str) -> bool {
        self.things.contains_key(thing)
    }

    /// All thing ids in store order.
    pub fn all_things(&self) -> impl Iterator<Item = &ThingId> + '_ {
        self.things.keys()
    }

    pub fn thing_count(&self) -> usize {
        self.things.len()
    }

    /// Raw content of `thing`, `None` when it does not exist.
    pub fn content(&self, thing: &str) -> Option<&str> {
        self.things.get(thing).map(|data| data.content.as_str())
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// All connections in id order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.values()
    }

    /// Outgoing connections of `thing` in display order.
    pub fn child_connections(&self, thing: &str) -> &[ConnectionId] {
        match self.things.get(thing) {
            Some(data) => &data.children,
            None => {
                warn!("event=graph_lookup module=graph status=missing op=child_connections thing={thing}");
                &[]
            }
        }
    }

    /// Incoming connections of `thing` in insertion order.
    pub fn parent_connections(&self, thing: &str) -> &[ConnectionId] {
        match self.things.get(thing) {
            Some(data) => &data.parents,
            None => {
                warn!("event=graph_lookup module=graph status=missing op=parent_connections thing={thing}");
                &[]
            }
        }
    }

    pub fn connection_parent(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).map(|c| c.parent.as_str())
    }

    pub fn connection_child(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).map(|c| c.child.as_str())
    }

    /// Tag of one connection, `None` when untagged or unknown.
    pub fn tag(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).and_then(|c| c.tag.as_deref())
    }

    /// Child things of `thing`, ordered by position.
    pub fn children(&self, thing: &str) -> Vec<ThingId> {
        self.child_connections(thing)
            .iter()
            .filter_map(|id| self.connection_child(*id))
            .map(str::to_string)
            .collect()
    }

    /// Parent things of `child`. One entry per connection.
    pub fn parents(&self, child: &str) -> Vec<ThingId> {
        self.parent_connections(child)
            .iter()
            .filter_map(|id| self.connection_parent(*id))
            .map(str::to_string)
            .collect()
    }

    /// Parents of `child` other than `exclude`.
    pub fn other_parents(&self, child: &str, exclude: Option<&str>) -> Vec<ThingId> {
        self.parents(child)
            .into_iter()
            .filter(|parent| Some(parent.as_str()) != exclude)
            .collect()
    }

    pub fn has_children(&self, thing: &str) -> bool {
        !self.child_connections(thing).is_empty()
    }

    /// Creates a thing with empty content.
    ///
    /// Without `id` a fresh id is generated. An existing `id` gets its
    /// content reset; its connections are kept so symmetry holds.
    pub fn create(mut self, id: Option<&str>) -> (Self, ThingId) {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                let mut candidate = generate_thing_id();
                while self.things.contains_key(&candidate) {
                    candidate = generate_thing_id();
                }
                candidate
            }
        };
        self.things.entry(id.clone()).or_default().content.clear();
        (self, id)
    }

    /// Replaces the content of `thing`, creating it when missing.
    pub fn set_content(mut self, thing: &str, content: impl Into<String>) -> Self {
        if !self.exists(thing) {
            warn!("event=graph_set_content module=graph status=missing thing={thing}");
        }
        self.things.entry(thing.to_string()).or_default().content = content.into();
        self
    }

    /// Sets or clears the tag of one connection.
    ///
    /// # Panics
    /// When `connection` does not exist.
    pub fn set_tag(mut self, connection: ConnectionId, tag: Option<&str>) -> Self {
        match self.connections.get_mut(&connection) {
            Some(record) => record.tag = tag.map(str::to_string),
            None => panic!("cannot tag non-existent connection {connection}"),
        }
        self
    }

    /// Inserts `child` under `parent` at `index` through a new connection.
    ///
    /// A missing `child` is created first so parents can be loaded before
    /// their children.
    ///
    /// # Panics
    /// When `parent` does not exist or `index` is past the end of its children.
    pub fn insert_child(self, parent: &str, child: &str, index: usize) -> (Self, Connection) {
        let id = ConnectionId(self.next_connection_id);
        self.insert_child_with_id(parent, child, index, id)
    }

    pub(crate) fn insert_child_with_id(
        mut self,
        parent: &str,
        child: &str,
        index: usize,
        id: ConnectionId,
    ) -> (Self, Connection) {
        let child_count = match self.things.get(parent) {
            Some(data) => data.children.len(),
            None => panic!("cannot insert child into non-existent parent `{parent}`"),
        };
        if index > child_count {
            panic!("cannot insert child at index {index} of `{parent}` with {child_count} children");
        }
        if self.connections.contains_key(&id) {
            panic!("connection {id} already exists");
        }
        if !self.exists(child) {
            self = self.create(Some(child)).0;
        }

        let connection = Connection {
            id,
            parent: parent.to_string(),
            child: child.to_string(),
            tag: None,
        };
        self.next_connection_id = self.next_connection_id.max(id.0 + 1);
        self.connections.insert(id, connection.clone());
        if let Some(data) = self.things.get_mut(parent) {
            data.children.insert(index, id);
        }
        if let Some(data) = self.things.get_mut(child) {
            data.parents.push(id);
        }
        (self, connection)
    }

    /// Appends `child` as the last child of `parent`.
    pub fn add_child(self, parent: &str, child: &str) -> (Self, Connection) {
        let index = self.child_connections(parent).len();
        self.insert_child(parent, child, index)
    }

    /// Removes the connection at `index` of `parent`'s children.
    ///
    /// # Panics
    /// When `parent` does not exist or has no child at `index`.
    pub fn remove_child(mut self, parent: &str, index: usize) -> Self {
        let removed = match self.things.get_mut(parent) {
            Some(data) if index < data.children.len() => data.children.remove(index),
            Some(data) => panic!(
                "cannot remove child {index} of `{parent}` with {} children",
                data.children.len()
            ),
            None => panic!("cannot remove child from non-existent parent `{parent}`"),
        };
        let connection = match self.connections.remove(&removed) {
            Some(connection) => connection,
            None => panic!("connection {removed} listed by `{parent}` does not exist"),
        };
        if let Some(data) = self.things.get_mut(&connection.child) {
            data.parents.retain(|id| *id != removed);
        }
        self
    }

    /// Replaces all children of `parent` with fresh untagged connections.
    pub fn replace_children(mut self, parent: &str, children: &[ThingId]) -> Self {
        while self.has_children(parent) {
            self = self.remove_child(parent, 0);
        }
        for child in children {
            self = self.add_child(parent, child).0;
        }
        self
    }

    /// Deletes `thing` and every connection touching it.
    ///
    /// Children are not deleted; they lose this parent. Removing the root is
    /// a no-op.
    pub fn remove(mut self, thing: &str) -> Self {
        if thing == ROOT_THING {
            warn!("event=graph_remove module=graph status=skipped reason=root");
            return self;
        }
        if !self.exists(thing) {
            return self;
        }

        for parent in self.parents(thing) {
            while let Some(index) = self.children(&parent).iter().position(|c| c == thing) {
                self = self.remove_child(&parent, index);
            }
        }
        while self.has_children(thing) {
            self = self.remove_child(thing, 0);
        }
        self.forget(thing)
    }

    fn forget(mut self, thing: &str) -> Self {
        if thing != ROOT_THING {
            self.things.remove(thing);
        }
        self
    }

    pub(crate) fn thing_data(&self, thing: &str) -> Option<&ThingData> {
        self.things.get(thing)
    }
}
