//! Carrying comment bookkeeping forward from the previous snapshot.

use crate::snapshot::Snapshot;

/// Copies each item's dispatched-comment map from the previous snapshot.
///
/// For every item in `current`, the matching item is looked up by id
/// anywhere in `last` (it may have changed columns) and its `comments`
/// correlation map is carried over; items unknown to `last` keep an empty
/// map. `last_read` is deliberately **not** copied: it is stamped by the
/// save step once comment synchronization for this run has completed, so
/// it always means "comments were checked as of this run".
#[must_use]
pub fn inherit(mut current: Snapshot, last: Option<&Snapshot>) -> Snapshot {
    let ids: Vec<String> = current.items().map(|(_, item)| item.id.clone()).collect();
    for id in ids {
        let comments = last
            .and_then(|snapshot| snapshot.find_item(&id))
            .map(|item| item.comments.clone())
            .unwrap_or_default();
        if let Some(item) = current.find_item_mut(&id) {
            item.comments = comments;
        }
    }
    current
}
