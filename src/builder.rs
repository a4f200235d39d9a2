use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tokio::net::TcpSocket;
use tokio::runtime;
use tracing::error;

use crate::common::BuildError;
use crate::exporter::{new_http_listener, ExporterFuture, ScrapeSource};
use crate::registry::{Limits, Registry};
use crate::snapshot::SnapshotStore;

/// Builder for creating and installing the scrape exporter.
///
/// Defaults: listen on `0.0.0.0:5950`, render the live registry per scrape,
/// 256 definitions, 256 instances per metric, 50 labels per instance, and a
/// 5 second per-connection client timeout.
pub struct Builder {
    listen_address: String,
    snapshot_path: Option<PathBuf>,
    limits: Limits,
    client_timeout: Duration,
}

impl Builder {
    /// Creates a new [`Builder`].
    pub fn new() -> Self {
        Builder {
            listen_address: "0.0.0.0:5950".to_string(),
            snapshot_path: None,
            limits: Limits::default(),
            client_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the address the responder listens on.
    ///
    /// Accepts anything resolvable (`"127.0.0.1:9090"`, `"localhost:9090"`);
    /// resolution happens in [`build`](Self::build). Defaults to
    /// `0.0.0.0:5950`.
    #[must_use]
    pub fn listen_address<A>(mut self, addr: A) -> Self
    where
        A: Into<String>,
    {
        self.listen_address = addr.into();
        self
    }

    /// Serves scrapes from the snapshot file at `path` instead of rendering
    /// the live registry.
    ///
    /// The producer side is expected to flush into a [`SnapshotStore`] at the
    /// same path, either directly or via [`flush_task`](crate::flush_task).
    /// This is the topology for a producer and responder in different
    /// processes.
    #[must_use]
    pub fn snapshot_source<P>(mut self, path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Sets the maximum number of metric definitions. Defaults to 256.
    #[must_use]
    pub fn max_definitions(mut self, limit: usize) -> Self {
        self.limits.max_definitions = limit;
        self
    }

    /// Sets the maximum number of instances per metric. Defaults to 256.
    #[must_use]
    pub fn max_instances_per_metric(mut self, limit: usize) -> Self {
        self.limits.max_instances = limit;
        self
    }

    /// Sets the maximum number of labels per instance. Defaults to 50.
    #[must_use]
    pub fn max_labels(mut self, limit: usize) -> Self {
        self.limits.max_labels = limit;
        self
    }

    /// Sets the per-connection read/write timeout, bounding how long a slow
    /// or silent client can hold a connection task. Defaults to 5 seconds.
    #[must_use]
    pub fn client_timeout(mut self, timeout: Duration) -> Self {
        self.client_timeout = timeout;
        self
    }

    /// Builds the registry and the exporter future without spawning it.
    ///
    /// Address resolution, socket creation, and binding happen here, so those
    /// startup failures surface before anything runs; the listen step happens
    /// when the future is first polled, inside a runtime.
    pub fn build(self) -> Result<(Registry, ExporterFuture), BuildError> {
        let registry = Registry::with_limits(self.limits);

        let source = match &self.snapshot_path {
            Some(path) => ScrapeSource::Snapshot(SnapshotStore::new(path.clone())),
            None => ScrapeSource::Live(registry.clone()),
        };

        let addr = self
            .listen_address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| BuildError::AddrResolution(self.listen_address.clone()))?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(BuildError::ListenerCreation)?;
        socket.set_reuseaddr(true).map_err(BuildError::ListenerCreation)?;
        socket.bind(addr).map_err(|e| BuildError::Bind(addr, e))?;

        Ok((registry, new_http_listener(socket, addr, source, self.client_timeout)))
    }

    /// Builds and spawns the exporter, returning the registry.
    ///
    /// When called within a tokio runtime, the exporter is spawned onto it.
    /// Otherwise a single-threaded runtime is created on a background thread
    /// and the exporter runs there.
    pub fn install(self) -> Result<Registry, BuildError> {
        let (registry, exporter) = self.build()?;
        match runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(drive(exporter));
            }
            Err(_) => {
                let runtime = runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(BuildError::Runtime)?;
                thread::Builder::new()
                    .name("promlite-exporter".to_string())
                    .spawn(move || runtime.block_on(drive(exporter)))
                    .map_err(BuildError::Runtime)?;
            }
        }
        Ok(registry)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

async fn drive(exporter: ExporterFuture) {
    if let Err(e) = exporter.await {
        error!("scrape exporter failed to start: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::Builder;
    use crate::common::BuildError;

    #[test]
    fn unresolvable_listen_address_fails_at_build() {
        let result = Builder::new().listen_address("definitely-not-a-host:99999").build();
        assert!(matches!(result, Err(BuildError::AddrResolution(_))));
    }

    #[test]
    fn bind_conflict_is_a_distinct_error() {
        let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = held.local_addr().unwrap();

        let result = Builder::new().listen_address(addr.to_string()).build();
        assert!(matches!(result, Err(BuildError::Bind(_, _))));
    }
}
