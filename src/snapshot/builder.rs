//! Building a normalized snapshot from the live board.

use std::collections::BTreeMap;

use crate::config::ConfigError;
use crate::error::RunError;
use crate::page::drain_pages;
use crate::ports::{BoardRef, ProjectSource};
use crate::snapshot::{Column, Item, Snapshot};

/// Default page size for the plain items listing.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Builds a snapshot of the board's current state.
///
/// Resolves the pivot field by exact name, creates one column per pivot
/// option plus the synthetic no-status column, then drains all item pages
/// and buckets each item by its pivot value. Draft entries (no content
/// block) are skipped. An item whose pivot value matches no known column
/// is logged loudly and bucketed as no-status so it stays visible to the
/// diff engine.
///
/// # Errors
///
/// Returns a configuration error if the pivot field is missing or not
/// single-select, or a source error if a provider call fails.
pub fn build(
    source: &dyn ProjectSource,
    board: &BoardRef,
    pivot_field_name: &str,
    page_size: usize,
) -> Result<Snapshot, RunError> {
    let fields = source.fetch_fields(board)?;
    let pivot = fields
        .iter()
        .find(|field| field.name == pivot_field_name)
        .ok_or_else(|| ConfigError::PivotFieldMissing { name: pivot_field_name.to_string() })?;
    let options = pivot
        .options
        .as_deref()
        .ok_or_else(|| ConfigError::PivotFieldNotSelect { name: pivot_field_name.to_string() })?;

    let mut columns: BTreeMap<String, Column> = options
        .iter()
        .map(|option| (option.id.clone(), Column::new(&option.id, &option.name)))
        .collect();
    let mut no_status = Column::no_status();

    let edges =
        drain_pages(page_size, |cursor| source.fetch_items_page(board, cursor, page_size))?;
    for edge in edges {
        // Draft entries have no content block and stay invisible.
        let Some(content) = edge.content else { continue };
        let item = Item {
            id: content.id,
            number: content.number,
            url: content.url,
            html_url: content.html_url,
            title: content.title,
            state: content.state,
            last_read: None,
            comments: BTreeMap::new(),
        };
        match edge.pivot_option_id {
            None => no_status.insert(item),
            Some(option_id) => {
                if let Some(column) = columns.get_mut(&option_id) {
                    column.insert(item);
                } else {
                    tracing::warn!(
                        item = %item.id,
                        option = %option_id,
                        "pivot value matches no known column; bucketing as no-status"
                    );
                    no_status.insert(item);
                }
            }
        }
    }

    let mut all: Vec<Column> = columns.into_values().collect();
    all.push(no_status);
    Ok(Snapshot::from_columns(all)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{build, DEFAULT_PAGE_SIZE};
    use crate::config::ConfigError;
    use crate::error::RunError;
    use crate::ports::{
        BoardRef, Field, FieldOption, ItemContent, ItemEdge, ProjectSource, SourceError,
    };
    use crate::snapshot::{ItemState, NO_STATUS_COLUMN_ID};

    struct FakeSource {
        fields: Vec<Field>,
        pages: Mutex<Vec<Vec<ItemEdge>>>,
        calls: Mutex<usize>,
    }

    impl FakeSource {
        fn new(fields: Vec<Field>, pages: Vec<Vec<ItemEdge>>) -> Self {
            Self { fields, pages: Mutex::new(pages), calls: Mutex::new(0) }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ProjectSource for FakeSource {
        fn resolve_board(&self, _url: &str) -> Result<BoardRef, SourceError> {
            panic!("builder never resolves boards");
        }

        fn fetch_fields(&self, _board: &BoardRef) -> Result<Vec<Field>, SourceError> {
            Ok(self.fields.clone())
        }

        fn fetch_items_page(
            &self,
            _board: &BoardRef,
            _cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<Vec<ItemEdge>, SourceError> {
            *self.calls.lock().unwrap() += 1;
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() { Ok(Vec::new()) } else { Ok(pages.remove(0)) }
        }

        fn fetch_items_with_comments_page(
            &self,
            _board: &BoardRef,
            _cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<Vec<ItemEdge>, SourceError> {
            panic!("builder never fetches comments");
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

    fn status_field() -> Field {
        Field {
            id: "F1".to_string(),
            name: "Status".to_string(),
            options: Some(vec![
                FieldOption { id: "c1".to_string(), name: "Todo".to_string() },
                FieldOption { id: "c2".to_string(), name: "Done".to_string() },
            ]),
        }
    }

    fn edge(id: &str, option: Option<&str>) -> ItemEdge {
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
            pivot_option_id: option.map(String::from),
            labels: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn buckets_items_by_pivot_option() {
        let source = FakeSource::new(
            vec![status_field()],
            vec![vec![edge("I1", Some("c1")), edge("I2", Some("c2")), edge("I3", Some("c1"))]],
        );
        let snap = build(&source, &board(), "Status", DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(snap.column("c1").unwrap().issues.len(), 2);
        assert_eq!(snap.column("c2").unwrap().issues.len(), 1);
        assert!(snap.column(NO_STATUS_COLUMN_ID).unwrap().issues.is_empty());
    }

    #[test]
    fn unassigned_items_land_in_no_status() {
        let source = FakeSource::new(vec![status_field()], vec![vec![edge("I1", None)]]);
        let snap = build(&source, &board(), "Status", DEFAULT_PAGE_SIZE).unwrap();
        assert!(snap.column(NO_STATUS_COLUMN_ID).unwrap().issues.contains_key("I1"));
    }

    #[test]
    fn unknown_pivot_option_lands_in_no_status() {
        let source = FakeSource::new(vec![status_field()], vec![vec![edge("I1", Some("ghost"))]]);
        let snap = build(&source, &board(), "Status", DEFAULT_PAGE_SIZE).unwrap();
        assert!(snap.column(NO_STATUS_COLUMN_ID).unwrap().issues.contains_key("I1"));
    }

    #[test]
    fn draft_entries_are_invisible() {
        let mut draft = edge("D1", Some("c1"));
        draft.content = None;
        let source = FakeSource::new(vec![status_field()], vec![vec![draft, edge("I1", Some("c1"))]]);
        let snap = build(&source, &board(), "Status", DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(snap.items().count(), 1);
    }

    #[test]
    fn missing_pivot_field_is_a_config_error() {
        let source = FakeSource::new(vec![status_field()], vec![]);
        let result = build(&source, &board(), "Stage", DEFAULT_PAGE_SIZE);
        assert!(matches!(
            result,
            Err(RunError::Config(ConfigError::PivotFieldMissing { .. }))
        ));
    }

    #[test]
    fn pivot_field_without_options_is_a_config_error() {
        let field = Field { id: "F1".to_string(), name: "Status".to_string(), options: None };
        let source = FakeSource::new(vec![field], vec![]);
        let result = build(&source, &board(), "Status", DEFAULT_PAGE_SIZE);
        assert!(matches!(
            result,
            Err(RunError::Config(ConfigError::PivotFieldNotSelect { .. }))
        ));
    }

    #[test]
    fn drains_pages_until_short_page() {
        let full: Vec<ItemEdge> = (0..3).map(|i| edge(&format!("A{i}"), Some("c1"))).collect();
        let short = vec![edge("B0", Some("c2"))];
        let source = FakeSource::new(vec![status_field()], vec![full, short]);
        let snap = build(&source, &board(), "Status", 3).unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(snap.items().count(), 4);
    }
}
