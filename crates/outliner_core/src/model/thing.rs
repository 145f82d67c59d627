//! Thing and connection records.
//!
//! # Responsibility
//! - Define the records owned by the graph store.
//! - Generate short identifiers for newly created things.
//!
//! # Invariants
//! - `ROOT_THING` is the permanent root and survives every removal.
//! - A connection id appears once in its parent's `children` and once in
//!   its child's `parents`, nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of one thing. Short lowercase string for generated ids.
pub type ThingId = String;

/// Id of the permanent root thing.
pub const ROOT_THING: &str = "0";

/// Content of the root thing in an empty store.
pub const ROOT_CONTENT: &str = "root";

const GENERATED_ID_LEN: usize = 10;

/// Identifier of one parent -> child connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "c.{}", self.0)
    }
}

/// Directed, optionally tagged edge between two things.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub parent: ThingId,
    pub child: ThingId,
    /// Label thing, `None` for untagged connections.
    pub tag: Option<ThingId>,
}

/// Per-thing record held by the graph store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThingData {
    /// Free text. May contain `#<id>` inline references.
    pub content: String,
    /// Outgoing connections, in display order.
    pub children: Vec<ConnectionId>,
    /// Incoming connections, in insertion order.
    pub parents: Vec<ConnectionId>,
}

/// Generates a fresh thing id.
///
/// Ids are lowercase hex so they always match the inline reference syntax.
pub fn generate_thing_id() -> ThingId {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(GENERATED_ID_LEN);
    id
}
