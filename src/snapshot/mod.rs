//! Snapshot data model: a point-in-time capture of board state.
//!
//! A [`Snapshot`] maps column identifiers to [`Column`]s, each holding the
//! [`Item`]s currently bucketed under it. Snapshots are value objects:
//! built fresh each run, enriched by pure passes (`inherit`), mutated only
//! through explicit methods, and serialized as plain JSON for persistence.

pub mod builder;
pub mod diff;
pub mod inherit;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of the synthetic column holding items with no pivot value.
pub const NO_STATUS_COLUMN_ID: &str = "no-status";
/// Display name of the synthetic no-status column.
pub const NO_STATUS_COLUMN_NAME: &str = "No status";

/// Whether an item is open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// The item is open.
    Open,
    /// The item is closed.
    Closed,
}

/// One tracked board item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable provider-assigned identifier, unique across the board.
    pub id: String,
    /// Issue number within its repository.
    pub number: u64,
    /// API URL of the issue.
    pub url: String,
    /// Browser URL of the issue.
    pub html_url: String,
    /// Issue title.
    pub title: String,
    /// Open/closed state.
    pub state: ItemState,
    /// Instant after which comment activity is eligible for notification.
    /// Absent until the save step stamps it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read: Option<DateTime<Utc>>,
    /// Comment id → correlation id of the message already dispatched for it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: BTreeMap<String, String>,
}

/// One status column and the items bucketed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column identifier (a pivot-field option id, or [`NO_STATUS_COLUMN_ID`]).
    pub id: String,
    /// Column display label.
    pub name: String,
    /// Items keyed by item id.
    #[serde(default)]
    pub issues: BTreeMap<String, Item>,
}

impl Column {
    /// Creates an empty column.
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self { id: id.to_string(), name: name.to_string(), issues: BTreeMap::new() }
    }

    /// Creates the synthetic no-status column.
    #[must_use]
    pub fn no_status() -> Self {
        Self::new(NO_STATUS_COLUMN_ID, NO_STATUS_COLUMN_NAME)
    }

    /// Adds an item to this column, keyed by its id.
    pub fn insert(&mut self, item: Item) {
        self.issues.insert(item.id.clone(), item);
    }
}

/// Violations of snapshot construction invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two columns share the same identifier.
    #[error("duplicate column id {0}")]
    DuplicateColumn(String),
    /// The same item appears in more than one column.
    #[error("item {0} appears in more than one column")]
    DuplicateItem(String),
}

/// A point-in-time capture of board state.
///
/// Column identifiers are unique, item identifiers are unique across all
/// columns, and the synthetic no-status column is always present. The map
/// is ordered so serialized output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    columns: BTreeMap<String, Column>,
}

impl Snapshot {
    /// Builds a snapshot from columns, validating key uniqueness.
    ///
    /// The synthetic no-status column is added if not supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if two columns share an id or an item appears in
    /// more than one column.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, SnapshotError> {
        let mut map = BTreeMap::new();
        let mut seen_items = std::collections::BTreeSet::new();
        for column in columns {
            for item_id in column.issues.keys() {
                if !seen_items.insert(item_id.clone()) {
                    return Err(SnapshotError::DuplicateItem(item_id.clone()));
                }
            }
            if map.contains_key(&column.id) {
                return Err(SnapshotError::DuplicateColumn(column.id));
            }
            map.insert(column.id.clone(), column);
        }
        map.entry(NO_STATUS_COLUMN_ID.to_string()).or_insert_with(Column::no_status);
        Ok(Self { columns: map })
    }

    /// Returns the column with the given id.
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.get(id)
    }

    /// Iterates over all columns in id order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Iterates over all `(column, item)` pairs.
    pub fn items(&self) -> impl Iterator<Item = (&Column, &Item)> {
        self.columns.values().flat_map(|c| c.issues.values().map(move |i| (c, i)))
    }

    /// Finds an item by id, regardless of column.
    #[must_use]
    pub fn find_item(&self, item_id: &str) -> Option<&Item> {
        self.columns.values().find_map(|c| c.issues.get(item_id))
    }

    /// Finds an item by id for mutation, regardless of column.
    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.columns.values_mut().find_map(|c| c.issues.get_mut(item_id))
    }

    /// Sets every item's `last_read` to the given instant.
    ///
    /// This is the commit point that advances the comment watermark for
    /// the next run; callers invoke it only once comment synchronization
    /// for the current run has completed.
    pub fn stamp_last_read(&mut self, now: DateTime<Utc>) {
        for column in self.columns.values_mut() {
            for item in column.issues.values_mut() {
                item.last_read = Some(now);
            }
        }
    }
}
