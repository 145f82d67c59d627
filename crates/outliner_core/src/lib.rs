//! Core of an associative outliner.
//!
//! Things live in a graph (`graph::State`) where one thing may sit under many
//! parents and reference others inline with `#id`. A view tree
//! (`tree::Tree`) shows that graph as an outline, one position per
//! occurrence, and is kept in line with the graph by `tree::reconcile`.
//! Every operation takes values and returns new values; `service::Session`
//! bundles them for hosts that want a mutable handle with undo.

pub mod graph;
pub mod history;
pub mod logging;
pub mod model;
pub mod service;
pub mod tree;

pub use graph::diff::{diff, StateDiff};
pub use graph::hydrate::{hydrate, ChildRecord, HydrateError, HydrateResult, ThingRecord};
pub use graph::State;
pub use history::History;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::node::{Node, NodeId, Panel};
pub use model::thing::{Connection, ConnectionId, ThingId, ROOT_THING};
pub use service::session::Session;
pub use tree::edit::Destination;
pub use tree::{ChildList, Tree};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
