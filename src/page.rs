//! Generic cursor-driven pagination.
//!
//! The board provider exposes several paginated listings that all follow
//! the same shape: each returned edge carries a cursor, and the next page
//! is requested by passing the last edge's cursor back. This module holds
//! the one drain loop they all share.

use crate::ports::ItemEdge;

/// An element of a paginated listing that knows its continuation cursor.
pub trait Cursored {
    /// Cursor to resume pagination after this element.
    fn cursor(&self) -> &str;
}

impl Cursored for ItemEdge {
    fn cursor(&self) -> &str {
        &self.cursor
    }
}

/// Drains a cursor-paginated source into a single vector.
///
/// `fetch` receives the cursor to resume after (`None` on the first call)
/// and returns one page of at most `page_size` elements. Paging stops when
/// a page comes back empty or shorter than `page_size`, a termination
/// rule that tolerates sources with an unknown total count.
///
/// # Errors
///
/// Propagates the first error returned by `fetch`.
pub fn drain_pages<T, E, F>(page_size: usize, mut fetch: F) -> Result<Vec<T>, E>
where
    T: Cursored,
    F: FnMut(Option<&str>) -> Result<Vec<T>, E>,
{
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch(cursor.as_deref())?;
        let fetched = page.len();
        cursor = page.last().map(|edge| edge.cursor().to_string());
        all.extend(page);
        if fetched == 0 || fetched < page_size {
            return Ok(all);
        }
    }
}
