use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::common::BuildError;
use crate::registry::Registry;
use crate::snapshot::SnapshotStore;

mod http_listener;

pub(crate) use self::http_listener::new_http_listener;

/// Convenience type for the future driving the scrape responder.
///
/// Resolves with an error only for startup failures (the listen step); once
/// serving, the accept loop runs until the future is dropped.
pub type ExporterFuture = Pin<Box<dyn Future<Output = Result<(), BuildError>> + Send + 'static>>;

// Where each scrape response body comes from.
#[derive(Clone)]
pub(crate) enum ScrapeSource {
    // Render the shared registry at response time.
    Live(Registry),
    // Read back the most recently flushed snapshot file.
    Snapshot(SnapshotStore),
}

impl ScrapeSource {
    // Produces one response body. A snapshot read failure degrades to an
    // empty body so the accept loop keeps serving.
    pub(crate) fn body(&self) -> String {
        match self {
            ScrapeSource::Live(registry) => registry.render(),
            ScrapeSource::Snapshot(store) => store.read().unwrap_or_else(|e| {
                warn!("failed to read snapshot for scrape: {e}");
                String::new()
            }),
        }
    }
}
