//! Messaging sink port for outbound notifications.

use thiserror::Error;

/// Attachment color for closed items.
pub const COLOR_CLOSED: &str = "#36a64f";
/// Attachment color for open items.
pub const COLOR_OPEN: &str = "#439FE0";
/// Default attachment color.
pub const COLOR_DEFAULT: &str = "#D3D3D3";

/// A rich-text attachment carried alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Sidebar color code (see the `COLOR_*` constants).
    pub color: String,
    /// Markup-enabled body text.
    pub text: String,
    /// Footer line shown under the body.
    pub footer: String,
}

impl Attachment {
    /// Creates an attachment with the given color, body, and footer.
    #[must_use]
    pub fn new(color: &str, text: &str, footer: &str) -> Self {
        Self { color: color.to_string(), text: text.to_string(), footer: footer.to_string() }
    }
}

/// Errors surfaced by a messaging sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink variant cannot perform the requested operation.
    #[error("sink does not support {0}")]
    Unsupported(&'static str),
    /// The sink rejected the message.
    #[error("message delivery failed: {0}")]
    Delivery(String),
    /// Transport-level failure.
    #[error("sink transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Delivers messages to the configured destination.
///
/// `post` returns the sink's correlation identifier for the new message
/// when the sink can address messages individually; `update` targets a
/// previously returned identifier.
pub trait MessageSink: Send + Sync {
    /// Posts a new message.
    ///
    /// Returns the correlation identifier of the posted message, or `None`
    /// for sinks that cannot address messages after posting.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn post(&self, text: &str, attachment: &Attachment) -> Result<Option<String>, SinkError>;

    /// Updates a previously posted message in place.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unsupported`] for sinks without per-message
    /// addressing, or a delivery error if the update fails.
    fn update(
        &self,
        correlation_id: &str,
        text: &str,
        attachment: &Attachment,
    ) -> Result<(), SinkError>;
}
