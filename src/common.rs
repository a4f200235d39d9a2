use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The type tag carried into a metric's `# TYPE` header line.
///
/// Every instance stores a single scalar value regardless of type; histograms
/// and summaries carry no bucket or quantile machinery here.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MetricType {
    /// A monotonically increasing value.
    Counter,
    /// A value that can arbitrarily go up and down.
    Gauge,
    /// Tagged as a histogram in the exposition output.
    Histogram,
    /// Tagged as a summary in the exposition output.
    Summary,
}

impl MetricType {
    /// Returns the lowercase name used in the exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
        }
    }
}

/// Errors that could occur while building or starting the scrape exporter.
///
/// All of these are fatal: the responder never starts serving.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configured listen address did not resolve to any socket address.
    #[error("failed to resolve listen address `{0}`")]
    AddrResolution(String),

    /// Creating or configuring the listening socket did not succeed.
    #[error("failed to create listening socket: {0}")]
    ListenerCreation(io::Error),

    /// Binding to the resolved address did not succeed.
    #[error("failed to bind to {0}: {1}")]
    Bind(SocketAddr, io::Error),

    /// Putting the bound socket into listening mode did not succeed.
    #[error("failed to listen on {0}: {1}")]
    Listen(SocketAddr, io::Error),

    /// Spawning the background runtime for `install` did not succeed.
    #[error("failed to spawn runtime for exporter: {0}")]
    Runtime(io::Error),
}

/// Errors surfaced by registry operations when a capacity limit is hit or a
/// metric is used before being registered.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// `get_or_create` was called for a name that was never registered.
    #[error("metric `{0}` is not registered")]
    UnknownMetric(String),

    /// Registering another definition would exceed the definition limit.
    #[error("metric definition limit reached ({0})")]
    TooManyDefinitions(usize),

    /// Creating another instance would exceed the per-metric instance limit.
    #[error("instance limit reached for metric `{name}` ({limit})")]
    TooManyInstances {
        /// Name of the metric whose instance set is full.
        name: String,
        /// The configured per-metric instance limit.
        limit: usize,
    },

    /// The supplied label set exceeds the per-instance label limit.
    #[error("label limit exceeded ({0})")]
    TooManyLabels(usize),
}

/// A snapshot store I/O failure, carrying the path involved.
///
/// These are recoverable: a flush or scrape that hits one degrades and the
/// next attempt proceeds normally.
#[derive(Debug, Error)]
#[error("snapshot I/O failed at `{}`: {source}", path.display())]
pub struct SnapshotError {
    pub(crate) path: PathBuf,
    #[source]
    pub(crate) source: io::Error,
}

impl SnapshotError {
    /// The snapshot path the failed operation was against.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
