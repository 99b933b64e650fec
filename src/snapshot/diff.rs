//! Diffing two snapshots into an ordered list of change events.

use std::collections::{BTreeMap, BTreeSet};

use crate::snapshot::{Column, Item, Snapshot};

/// A single human-readable board change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The item the change is about.
    pub item: Item,
    /// Human-readable description, e.g. ``moved from `Todo` :point_right: `Done` ``.
    pub description: String,
}

/// Compares two snapshots and returns the changes between them.
///
/// An item only in `current` is "added"; an item in both but under a
/// different column is "moved"; an item only in `last` is "removed". Items
/// under the same column in both snapshots produce no event. Events are
/// sorted by description text, a stable order that groups same-kind
/// events together and is the canonical order for notification output.
#[must_use]
pub fn diff(current: &Snapshot, last: &Snapshot) -> Vec<ChangeEvent> {
    let current_index = index_items(current);
    let last_index = index_items(last);

    let current_pairs: BTreeSet<(&str, &str)> =
        current_index.iter().map(|(id, (_, column))| (*id, column.id.as_str())).collect();
    let last_pairs: BTreeSet<(&str, &str)> =
        last_index.iter().map(|(id, (_, column))| (*id, column.id.as_str())).collect();

    let mut events = Vec::new();

    for (id, _) in current_pairs.difference(&last_pairs) {
        let (item, column) = current_index[id];
        let description = match last_index.get(id) {
            None => format!("added to the board into `{}` :wave:", column.name),
            Some((_, last_column)) => {
                format!("moved from `{}` :point_right: `{}`", last_column.name, column.name)
            }
        };
        events.push(ChangeEvent { item: item.clone(), description });
    }

    for (id, _) in last_pairs.difference(&current_pairs) {
        if !current_index.contains_key(id) {
            let (item, _) = last_index[id];
            events.push(ChangeEvent {
                item: item.clone(),
                description: "removed from the board :broken_heart:".to_string(),
            });
        }
    }

    events.sort_by(|a, b| a.description.cmp(&b.description));
    events
}

/// Maps every item id to the item and the column holding it.
fn index_items(snapshot: &Snapshot) -> BTreeMap<&str, (&Item, &Column)> {
    snapshot.items().map(|(column, item)| (item.id.as_str(), (item, column))).collect()
}
