//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system (project data source, messaging sink, versioned object
//! store, time). Implementations live in `src/adapters/`.

pub mod clock;
pub mod sink;
pub mod source;
pub mod store;

pub use clock::Clock;
pub use sink::{Attachment, MessageSink, SinkError, COLOR_CLOSED, COLOR_DEFAULT, COLOR_OPEN};
pub use source::{
    BoardRef, Comment, Field, FieldOption, ItemContent, ItemEdge, ProjectSource, SourceError,
};
pub use store::{ObjectStore, StoreError, StoredObject};
