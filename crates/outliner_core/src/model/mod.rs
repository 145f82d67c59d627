//! Domain records shared by the graph store and the view tree.
//!
//! # Responsibility
//! - Define identifiers and records for things, connections and view positions.
//! - Keep thing identity (`ThingId`) and position identity (`NodeId`) disjoint.
//!
//! # Invariants
//! - A `Node` references its thing by id only; it never owns thing data.
//! - Connection ids and node ids are never reused within one value.

pub mod node;
pub mod thing;
