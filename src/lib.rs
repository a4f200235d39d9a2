//! A minimal, pull-based Prometheus instrumentation library.
//!
//! Applications register named, typed metrics, obtain shared value handles
//! per label combination, and expose the current state as exposition text
//! over a bare HTTP responder. The responder answers every connection with
//! `200 OK` and the full exposition body, whatever the request says.
//!
//! Two topologies are supported. In the default, live topology, producer
//! tasks and the responder share one [`Registry`] and every scrape renders
//! the current values. In the snapshot topology, the producer periodically
//! flushes the rendered registry to a file through a [`SnapshotStore`]
//! (atomically, via rename) and a responder -- possibly in another process --
//! serves the file's contents, trading a bounded amount of staleness for
//! fully independent memory.
//!
//! ```no_run
//! use promlite::{Builder, MetricDefinition, MetricType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Builder::new().install()?;
//!
//! registry.register(MetricDefinition::new(
//!     "current_time",
//!     "The time that it is right now",
//!     MetricType::Counter,
//! ))?;
//!
//! let handle = registry.get_or_create("current_time", &[("foo", "bar")])?;
//! handle.set(1_700_000_000.0);
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

mod builder;
mod common;
mod exporter;
mod formatting;
mod label;
mod registry;
mod snapshot;

pub use self::builder::Builder;
pub use self::common::{BuildError, MetricType, RegistryError, SnapshotError};
pub use self::exporter::ExporterFuture;
pub use self::label::{IntoLabels, Label, LabelSet};
pub use self::registry::{InstanceHandle, MetricDefinition, Registry};
pub use self::snapshot::{flush_task, SnapshotStore, DEFAULT_SNAPSHOT_PATH};
