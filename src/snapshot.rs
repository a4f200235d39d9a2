//! The file-backed snapshot store.
//!
//! A producer process flushes the rendered registry to a well-known path; a
//! responder in another process (or task) reads it back per scrape. This
//! trades immediate consistency for isolation: scrapes may be stale by at
//! most one flush interval, but the two sides share no memory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::warn;

use crate::common::SnapshotError;
use crate::registry::Registry;

/// Default filesystem path for the snapshot store.
pub const DEFAULT_SNAPSHOT_PATH: &str = "/tmp/prom_c";

/// A file-backed snapshot of the rendered registry.
///
/// Replacement is atomic: the body is written to a uniquely named sibling
/// file and renamed over the target, so a reader sees either the previous
/// snapshot or the new one in full, never a partial write.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store backed by the file at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SnapshotStore { path: path.into() }
    }

    /// Path this store writes to and reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders `registry` and atomically replaces the snapshot contents.
    pub fn flush(&self, registry: &Registry) -> Result<(), SnapshotError> {
        let body = registry.render();
        let tmp = self.tmp_path();
        fs::write(&tmp, body.as_bytes()).map_err(|e| self.error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.error(e))
    }

    /// Returns the most recently flushed snapshot body.
    pub fn read(&self) -> Result<String, SnapshotError> {
        fs::read_to_string(&self.path).map_err(|e| self.error(e))
    }

    // Unique per call so concurrent flushers cannot clobber each other's
    // in-progress temp file before the rename.
    fn tmp_path(&self) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);

        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "prom_snapshot".into());
        name.push(format!(".{}.{}.tmp", std::process::id(), seq));
        self.path.with_file_name(name)
    }

    fn error(&self, source: io::Error) -> SnapshotError {
        SnapshotError { path: self.path.clone(), source }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        SnapshotStore::new(DEFAULT_SNAPSHOT_PATH)
    }
}

/// Flushes `registry` into `store` every `interval`, forever.
///
/// This is the producer half of the snapshot topology. I/O failures are
/// logged and the next tick proceeds normally.
pub async fn flush_task(store: SnapshotStore, registry: Registry, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = store.flush(&registry) {
            warn!("failed to flush snapshot: {e}");
        }
    }
}
