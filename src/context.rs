//! Service context bundling all port trait objects.

use crate::adapters::{
    GithubContentsStore, GithubSource, LiveClock, SlackApiSink, SlackWebhookSink,
};
use crate::config::{Config, SinkConfig};
use crate::ports::{Clock, MessageSink, ObjectStore, ProjectSource};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. The live
/// constructor wires adapters from the validated configuration; tests
/// construct the struct directly with in-memory fakes.
pub struct ServiceContext {
    /// Project data source.
    pub source: Box<dyn ProjectSource>,
    /// Messaging sink.
    pub sink: Box<dyn MessageSink>,
    /// Versioned object store holding persisted snapshots.
    pub store: Box<dyn ObjectStore>,
    /// Clock for watermark stamping and retry backoff.
    pub clock: Box<dyn Clock>,
}

impl ServiceContext {
    /// Creates a live context wired from the configuration.
    #[must_use]
    pub fn live(config: &Config) -> Self {
        let sink: Box<dyn MessageSink> = match &config.sink {
            SinkConfig::Api { token, channel } => Box::new(SlackApiSink::new(token, channel)),
            SinkConfig::Webhook { url } => Box::new(SlackWebhookSink::new(url)),
        };
        Self {
            source: Box::new(GithubSource::new(&config.provider_token, &config.pivot_field)),
            sink,
            store: Box::new(GithubContentsStore::new(&config.provider_token, &config.data_repo)),
            clock: Box::new(LiveClock),
        }
    }
}
