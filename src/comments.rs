//! Mirroring issue comments into the messaging sink.
//!
//! Comments are classified against each item's watermark (`last_read`
//! inherited from the previous snapshot) and dispatched with
//! create-or-update semantics: new comments are posted and their message
//! correlation ids recorded onto the live snapshot; edited comments update
//! the previously posted message in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::RunError;
use crate::page::drain_pages;
use crate::ports::{Attachment, BoardRef, Comment, MessageSink, ProjectSource, COLOR_DEFAULT};
use crate::render;
use crate::snapshot::Snapshot;

/// Default page size for the comments listing (payload per item is large).
pub const DEFAULT_COMMENTS_PAGE_SIZE: usize = 10;

/// One item's comments classified against its watermark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentBatch {
    /// Comments created after the watermark.
    pub new: Vec<Comment>,
    /// Comments created before but edited after the watermark.
    pub updated: Vec<Comment>,
}

impl CommentBatch {
    /// True when nothing needs dispatching.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty()
    }
}

/// Classifies comments against a watermark.
///
/// A comment created strictly after the watermark is new; one created at
/// or before it but updated strictly after it is updated; everything else
/// has already been seen unmodified. Without a watermark (first sighting
/// of the item) all existing comments are skipped; history is never
/// backfilled.
#[must_use]
pub fn classify(comments: &[Comment], watermark: Option<DateTime<Utc>>) -> CommentBatch {
    let Some(watermark) = watermark else {
        return CommentBatch::default();
    };
    let mut batch = CommentBatch::default();
    for comment in comments {
        if comment.created_at > watermark {
            batch.new.push(comment.clone());
        } else if comment.updated_at > watermark {
            batch.updated.push(comment.clone());
        }
    }
    batch
}

/// True when the item passes the label allow-list.
fn passes_labels(labels: &[String], allowed: &[String]) -> bool {
    allowed.is_empty() || labels.iter().any(|label| allowed.contains(label))
}

/// Synchronizes item comments into the sink.
///
/// Pages through items with their comment threads, classifies each thread
/// against the watermarks carried by `last`, posts new comments (recording
/// the returned correlation id onto `current`), and updates edited ones.
/// An edited comment with no correlation id on record is reported and
/// skipped, never fatal. Returns the classified batches per item id.
///
/// On the first run (`last` is `None`) nothing is dispatched and the
/// result is empty: comment history is never announced retroactively.
///
/// # Errors
///
/// Returns an error if a provider call fails or the sink rejects a
/// message (including `update` on a sink without per-message addressing).
pub fn sync(
    source: &dyn ProjectSource,
    sink: &dyn MessageSink,
    board: &BoardRef,
    current: &mut Snapshot,
    last: Option<&Snapshot>,
    allowed_labels: &[String],
    page_size: usize,
) -> Result<BTreeMap<String, CommentBatch>, RunError> {
    let mut batches = BTreeMap::new();
    let Some(last) = last else {
        tracing::info!("no previous snapshot; skipping comment backfill");
        return Ok(batches);
    };

    let issue_last_read: BTreeMap<&str, DateTime<Utc>> = last
        .items()
        .filter_map(|(_, item)| item.last_read.map(|read| (item.id.as_str(), read)))
        .collect();

    let edges = drain_pages(page_size, |cursor| {
        source.fetch_items_with_comments_page(board, cursor, page_size)
    })?;

    for edge in edges {
        let Some(content) = edge.content else { continue };
        if !passes_labels(&edge.labels, allowed_labels) {
            tracing::debug!(item = %content.html_url, "item filtered by label allow-list");
            continue;
        }

        let watermark = issue_last_read.get(content.id.as_str()).copied();
        if watermark.is_none() {
            tracing::info!(item = %content.html_url, "first sighting; skipping all previous comments");
        }
        let batch = classify(&edge.comments, watermark);

        for comment in &batch.new {
            let context = format!(
                "*{}* commented on <{}|{}>",
                comment.author,
                comment.html_url,
                render::escape(&content.title)
            );
            let attachment =
                Attachment::new(COLOR_DEFAULT, &render::to_mrkdwn(&comment.body), &context);
            if let Some(correlation) = sink.post(&comment.body, &attachment)? {
                if let Some(item) = current.find_item_mut(&content.id) {
                    item.comments.insert(comment.id.clone(), correlation);
                }
            }
        }

        for comment in &batch.updated {
            let recorded = current
                .find_item(&content.id)
                .and_then(|item| item.comments.get(&comment.id))
                .cloned();
            if let Some(correlation) = recorded {
                let context = format!(
                    "*{}* updated comment on <{}|{}>",
                    comment.author,
                    comment.html_url,
                    render::escape(&content.title)
                );
                let attachment =
                    Attachment::new(COLOR_DEFAULT, &render::to_mrkdwn(&comment.body), &context);
                sink.update(&correlation, &comment.body, &attachment)?;
            } else {
                // The original post was never observed (e.g. it failed);
                // there is no message to edit.
                tracing::warn!(
                    item = %content.id,
                    comment = %comment.id,
                    "edited comment has no correlation id on record; update skipped"
                );
            }
        }

        if !batch.is_empty() {
            batches.insert(content.id.clone(), batch);
        }
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::{classify, sync, CommentBatch, DEFAULT_COMMENTS_PAGE_SIZE};
    use crate::error::RunError;
    use crate::ports::{
        Attachment, BoardRef, Comment, Field, ItemContent, ItemEdge, MessageSink, ProjectSource,
        SinkError, SourceError,
    };
    use crate::snapshot::test_support::snapshot;
    use crate::snapshot::ItemState;

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn comment(id: &str, created: i64, updated: i64) -> Comment {
        Comment {
            id: id.to_string(),
            author: "octo".to_string(),
            body: format!("body of {id}"),
            html_url: format!("https://example.com/comments/{id}"),
            created_at: at(created),
            updated_at: at(updated),
        }
    }

    #[test]
    fn classifies_new_updated_and_seen() {
        let watermark = at(0);
        let batch = classify(
            &[comment("new", 1, 1), comment("edited", -1, 1), comment("seen", -1, -1)],
            Some(watermark),
        );
        assert_eq!(batch.new.len(), 1);
        assert_eq!(batch.new[0].id, "new");
        assert_eq!(batch.updated.len(), 1);
        assert_eq!(batch.updated[0].id, "edited");
    }

    #[test]
    fn no_watermark_skips_everything() {
        let batch = classify(&[comment("c1", -10, -10), comment("c2", 10, 10)], None);
        assert_eq!(batch, CommentBatch::default());
    }

    struct FakeSource {
        pages: Mutex<Vec<Vec<ItemEdge>>>,
    }

    impl ProjectSource for FakeSource {
        fn resolve_board(&self, _url: &str) -> Result<BoardRef, SourceError> {
            panic!("sync never resolves boards");
        }

        fn fetch_fields(&self, _board: &BoardRef) -> Result<Vec<Field>, SourceError> {
            panic!("sync never fetches fields");
        }

        fn fetch_items_page(
            &self,
            _board: &BoardRef,
            _cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<Vec<ItemEdge>, SourceError> {
            panic!("sync fetches items with comments only");
        }

        fn fetch_items_with_comments_page(
            &self,
            _board: &BoardRef,
            _cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<Vec<ItemEdge>, SourceError> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() { Ok(Vec::new()) } else { Ok(pages.remove(0)) }
        }
    }

    #[derive(Default)]
    struct FakeSink {
        posts: Mutex<Vec<Attachment>>,
        updates: Mutex<Vec<(String, Attachment)>>,
        reject_updates: bool,
    }

    impl MessageSink for FakeSink {
        fn post(&self, _text: &str, attachment: &Attachment) -> Result<Option<String>, SinkError> {
            let mut posts = self.posts.lock().unwrap();
            posts.push(attachment.clone());
            Ok(Some(format!("ts-{}", posts.len())))
        }

        fn update(
            &self,
            correlation_id: &str,
            _text: &str,
            attachment: &Attachment,
        ) -> Result<(), SinkError> {
            if self.reject_updates {
                return Err(SinkError::Unsupported("message updates"));
            }
            self.updates.lock().unwrap().push((correlation_id.to_string(), attachment.clone()));
            Ok(())
        }
    }

    fn board() -> BoardRef {
        BoardRef {
            id: "B1".to_string(),
            number: 7,
            owner: "acme".to_string(),
            title: "Roadmap".to_string(),
            html_url: "https://example.com/orgs/acme/projects/7".to_string(),
        }
    }

    fn edge_with_comments(id: &str, labels: &[&str], comments: Vec<Comment>) -> ItemEdge {
        ItemEdge {
            cursor: format!("cursor-{id}"),
            content: Some(ItemContent {
                id: id.to_string(),
                number: 1,
                url: format!("https://api.example.com/issues/{id}"),
                html_url: format!("https://example.com/issues/{id}"),
                title: format!("Item {id}"),
                state: ItemState::Open,
            }),
            pivot_option_id: Some("c1".to_string()),
            labels: labels.iter().map(ToString::to_string).collect(),
            comments,
        }
    }

    /// Snapshot pair where `last` knows I1 with a watermark at t=0.
    fn watermarked_pair() -> (crate::snapshot::Snapshot, crate::snapshot::Snapshot) {
        let mut last = snapshot(&[("c1", "Todo", &["I1"])]);
        last.stamp_last_read(at(0));
        let current = snapshot(&[("c1", "Todo", &["I1"])]);
        (current, last)
    }

    #[test]
    fn first_run_returns_empty_and_posts_nothing() {
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("c1", 1, 1)],
        )]]) };
        let sink = FakeSink::default();
        let mut current = snapshot(&[("c1", "Todo", &["I1"])]);
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            None,
            &[],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        assert!(batches.is_empty());
        assert!(sink.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn new_comment_is_posted_and_correlation_recorded() {
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("c1", 5, 5)],
        )]]) };
        let sink = FakeSink::default();
        let (mut current, last) = watermarked_pair();
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &[],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        assert_eq!(batches["I1"].new.len(), 1);
        assert_eq!(current.find_item("I1").unwrap().comments["c1"], "ts-1");
        let posts = sink.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].footer.contains("*octo* commented on"));
    }

    #[test]
    fn edited_comment_updates_the_recorded_message() {
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("c1", -5, 5)],
        )]]) };
        let sink = FakeSink::default();
        let (mut current, last) = watermarked_pair();
        current
            .find_item_mut("I1")
            .unwrap()
            .comments
            .insert("c1".to_string(), "ts-old".to_string());
        sync(&source, &sink, &board(), &mut current, Some(&last), &[], DEFAULT_COMMENTS_PAGE_SIZE)
            .unwrap();
        let updates = sink.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "ts-old");
        assert!(updates[0].1.footer.contains("updated comment"));
    }

    #[test]
    fn edited_comment_without_correlation_is_a_reported_noop() {
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("c1", -5, 5)],
        )]]) };
        let sink = FakeSink::default();
        let (mut current, last) = watermarked_pair();
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &[],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        assert_eq!(batches["I1"].updated.len(), 1);
        assert!(sink.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn label_allow_list_filters_items() {
        let source = FakeSource { pages: Mutex::new(vec![vec![
            edge_with_comments("I1", &["chore"], vec![comment("c1", 5, 5)]),
        ]]) };
        let sink = FakeSink::default();
        let (mut current, last) = watermarked_pair();
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &["bug".to_string()],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        assert!(batches.is_empty());
        assert!(sink.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn matching_label_passes_the_filter() {
        let source = FakeSource { pages: Mutex::new(vec![vec![
            edge_with_comments("I1", &["bug", "chore"], vec![comment("c1", 5, 5)]),
        ]]) };
        let sink = FakeSink::default();
        let (mut current, last) = watermarked_pair();
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &["bug".to_string()],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn unsupported_update_propagates() {
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("c1", -5, 5)],
        )]]) };
        let sink = FakeSink { reject_updates: true, ..FakeSink::default() };
        let (mut current, last) = watermarked_pair();
        current
            .find_item_mut("I1")
            .unwrap()
            .comments
            .insert("c1".to_string(), "ts-old".to_string());
        let result = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &[],
            DEFAULT_COMMENTS_PAGE_SIZE,
        );
        assert!(matches!(result, Err(RunError::Sink(SinkError::Unsupported(_)))));
    }

    #[test]
    fn comments_processed_in_provider_order() {
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("z-late", 2, 2), comment("a-early", 1, 1)],
        )]]) };
        let sink = FakeSink::default();
        let (mut current, last) = watermarked_pair();
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &[],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        let ids: Vec<&str> = batches["I1"].new.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["z-late", "a-early"]);
    }

    #[test]
    fn watermark_map_ignores_items_without_last_read() {
        // last knows I1 but never stamped it; comments must be skipped.
        let last = snapshot(&[("c1", "Todo", &["I1"])]);
        let source = FakeSource { pages: Mutex::new(vec![vec![edge_with_comments(
            "I1",
            &[],
            vec![comment("c1", 5, 5)],
        )]]) };
        let sink = FakeSink::default();
        let mut current = snapshot(&[("c1", "Todo", &["I1"])]);
        let batches = sync(
            &source,
            &sink,
            &board(),
            &mut current,
            Some(&last),
            &[],
            DEFAULT_COMMENTS_PAGE_SIZE,
        )
        .unwrap();
        assert!(batches.is_empty());
        assert!(sink.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn comment_exactly_at_the_watermark_is_already_seen() {
        let batch = classify(&[comment("c1", 0, 0)], Some(at(0)));
        assert!(batch.is_empty());
    }
}
