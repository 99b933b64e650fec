//! Project data source port for reading board state.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::snapshot::ItemState;

/// A resolved reference to a project board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRef {
    /// Provider-assigned board identifier, stable across renames.
    pub id: String,
    /// Board number within its owning organization.
    pub number: u64,
    /// Organization that owns the board.
    pub owner: String,
    /// Display title of the board.
    pub title: String,
    /// Browser URL of the board.
    pub html_url: String,
}

/// A field defined on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Provider-assigned field identifier.
    pub id: String,
    /// Field display name (e.g. "Status").
    pub name: String,
    /// Selectable options, present only for single-select-like fields.
    pub options: Option<Vec<FieldOption>>,
}

/// One selectable option of a single-select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    /// Provider-assigned option identifier.
    pub id: String,
    /// Option display name (the column label).
    pub name: String,
}

/// One element of an item page, carrying its pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEdge {
    /// Cursor to resume pagination after this item.
    pub cursor: String,
    /// The item's content block; `None` for draft entries.
    pub content: Option<ItemContent>,
    /// Identifier of the pivot-field option assigned to the item, if any.
    pub pivot_option_id: Option<String>,
    /// Label names attached to the underlying issue.
    pub labels: Vec<String>,
    /// Discussion comments, populated only by the comments-page fetch.
    pub comments: Vec<Comment>,
}

/// The content block of a non-draft item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemContent {
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
    /// Whether the issue is open or closed.
    pub state: ItemState,
}

/// A discussion comment on an item. Transient: only its correlation entry
/// survives a run (see `Item::comments`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Provider-assigned comment identifier.
    pub id: String,
    /// Login of the comment author.
    pub author: String,
    /// Comment body, provider-flavored markdown.
    pub body: String,
    /// Browser URL of the comment.
    pub html_url: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last-edit instant; equals `created_at` when never edited.
    pub updated_at: DateTime<Utc>,
}

/// Errors surfaced by a project data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The provider signalled quota exhaustion; the run should be skipped.
    #[error("provider rate limit exhausted")]
    RateLimited,
    /// The board URL could not be parsed or resolved.
    #[error("cannot resolve board from URL {url}: {reason}")]
    BadBoardUrl {
        /// The offending URL.
        url: String,
        /// Why resolution failed.
        reason: String,
    },
    /// The provider rejected a request or returned a malformed response.
    #[error("project source request failed: {0}")]
    Api(String),
    /// Transport-level failure.
    #[error("project source transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Reads board structure and items from the project provider.
///
/// Item pages are cursor-driven: pass the cursor of the last edge of the
/// previous page to continue, `None` to start from the beginning.
pub trait ProjectSource: Send + Sync {
    /// Resolves a browser URL into a board reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or names no known board.
    fn resolve_board(&self, url: &str) -> Result<BoardRef, SourceError>;

    /// Fetches the board's field definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    fn fetch_fields(&self, board: &BoardRef) -> Result<Vec<Field>, SourceError>;

    /// Fetches one page of items without labels or comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    fn fetch_items_page(
        &self,
        board: &BoardRef,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Vec<ItemEdge>, SourceError>;

    /// Fetches one page of items with their labels and full comment lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    fn fetch_items_with_comments_page(
        &self,
        board: &BoardRef,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Vec<ItemEdge>, SourceError>;
}
