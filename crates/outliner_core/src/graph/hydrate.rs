//! Bulk hydration and per-thing updates from external records.
//!
//! # Responsibility
//! - Rebuild a `State` from flat thing records supplied by a loader.
//! - Apply "thing changed" records from a synchronization collaborator.
//! - Export a `State` back into records.
//!
//! # Invariants
//! - Record order across things does not matter; child order within a
//!   record does.
//! - Forward references are tolerated; the referenced child is created empty
//!   and filled in when its own record arrives.
//! - Caller-supplied connection ids are kept as-is.

use crate::graph::State;
use crate::model::thing::{ConnectionId, ThingId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for hydration APIs.
pub type HydrateResult<T> = Result<T, HydrateError>;

/// Record-level data errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrateError {
    /// Thing id is empty after trim.
    InvalidThingId(String),
    /// The same thing appears in more than one record of a batch.
    DuplicateThing(ThingId),
    /// Connection id is already attached to another parent.
    DuplicateConnection(ConnectionId),
}

impl Display for HydrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidThingId(value) => write!(f, "invalid thing id: `{value}`"),
            Self::DuplicateThing(thing) => write!(f, "thing described twice: {thing}"),
            Self::DuplicateConnection(id) => {
                write!(f, "connection id already in use: {id}")
            }
        }
    }
}

impl Error for HydrateError {}

/// One child entry of a thing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRecord {
    pub connection_id: ConnectionId,
    pub child_id: ThingId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ThingId>,
}

/// Flat description of one thing and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingRecord {
    pub thing_id: ThingId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub children: Vec<ChildRecord>,
}

/// Builds a store from `records`, starting from `State::empty()`.
pub fn hydrate(records: &[ThingRecord]) -> HydrateResult<State> {
    let mut seen = BTreeSet::new();
    let mut state = State::empty();
    for record in records {
        if !seen.insert(record.thing_id.as_str()) {
            return Err(HydrateError::DuplicateThing(record.thing_id.clone()));
        }
        state = state.apply_record(record)?;
    }
    Ok(state)
}

impl State {
    /// Replaces content and child connections of one thing.
    ///
    /// Parents of the thing are left alone.
    pub fn apply_record(mut self, record: &ThingRecord) -> HydrateResult<State> {
        let thing = record.thing_id.trim();
        if thing.is_empty() {
            return Err(HydrateError::InvalidThingId(record.thing_id.clone()));
        }
        for child in &record.children {
            if child.child_id.trim().is_empty() {
                return Err(HydrateError::InvalidThingId(child.child_id.clone()));
            }
            if let Some(parent) = self.connection_parent(child.connection_id) {
                if parent != thing {
                    return Err(HydrateError::DuplicateConnection(child.connection_id));
                }
            }
        }
        let mut ids = BTreeSet::new();
        for child in &record.children {
            if !ids.insert(child.connection_id) {
                return Err(HydrateError::DuplicateConnection(child.connection_id));
            }
        }

        if !self.exists(thing) {
            self = self.create(Some(thing)).0;
        }
        self = self.set_content(thing, record.content.as_str());
        while self.has_children(thing) {
            self = self.remove_child(thing, 0);
        }
        for (index, child) in record.children.iter().enumerate() {
            let (next, connection) =
                self.insert_child_with_id(thing, &child.child_id, index, child.connection_id);
            self = next.set_tag(connection.id, child.tag.as_deref());
        }
        Ok(self)
    }

    /// Exports every thing as a record, in store order.
    pub fn to_records(&self) -> Vec<ThingRecord> {
        self.all_things()
            .map(|thing| ThingRecord {
                thing_id: thing.clone(),
                content: self.content(thing).unwrap_or_default().to_string(),
                children: self
                    .child_connections(thing)
                    .iter()
                    .filter_map(|id| self.connection(*id))
                    .map(|connection| ChildRecord {
                        connection_id: connection.id,
                        child_id: connection.child.clone(),
                        tag: connection.tag.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}
