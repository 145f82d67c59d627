//! Snapshot comparison for synchronization collaborators.

use crate::graph::State;
use crate::model::thing::ThingId;

/// Things that differ between two snapshots, each list in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDiff {
    pub added: Vec<ThingId>,
    pub deleted: Vec<ThingId>,
    /// Connections (or a child connection's tag) changed.
    pub changed: Vec<ThingId>,
    /// Only content changed.
    pub changed_content: Vec<ThingId>,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.changed.is_empty()
            && self.changed_content.is_empty()
    }
}

/// Compares `old` and `new` thing by thing.
pub fn diff(old: &State, new: &State) -> StateDiff {
    let mut result = StateDiff::default();

    for thing in old.all_things() {
        let (Some(before), Some(after)) = (old.thing_data(thing), new.thing_data(thing)) else {
            result.deleted.push(thing.clone());
            continue;
        };

        let same_lists = before.children == after.children && before.parents == after.parents;
        let same_child_records = before
            .children
            .iter()
            .all(|id| old.connection(*id) == new.connection(*id));

        if !same_lists || !same_child_records {
            result.changed.push(thing.clone());
        } else if before.content != after.content {
            result.changed_content.push(thing.clone());
        }
    }

    result.added = new
        .all_things()
        .filter(|thing| !old.exists(thing))
        .cloned()
        .collect();

    result
}
