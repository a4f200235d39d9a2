use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;
use tracing::warn;

use crate::common::BuildError;
use crate::exporter::{ExporterFuture, ScrapeSource};

// Status line plus the blank-line body separator. Scrapers tolerate the bare
// `\n` separators and the absence of response headers.
const RESPONSE_PREAMBLE: &[u8] = b"HTTP/1.1 200 OK\n\n";

const CONN_BACKLOG: u32 = 10;

// Upper bound on how many request bytes one connection may have discarded
// before we stop draining and answer.
const MAX_REQUEST_DRAIN: usize = 8 * 1024;

/// Creates an `ExporterFuture` serving the exposition text to every
/// connection, regardless of what the client sends.
///
/// The socket is already bound; the listen step happens inside the future
/// since registering with the runtime's reactor requires runtime context.
pub(crate) fn new_http_listener(
    socket: TcpSocket,
    addr: SocketAddr,
    source: ScrapeSource,
    client_timeout: Duration,
) -> ExporterFuture {
    Box::pin(async move {
        let listener =
            socket.listen(CONN_BACKLOG).map_err(|e| BuildError::Listen(addr, e))?;

        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("error accepting connection, ignoring request: {e}");
                    continue;
                }
            };

            let source = source.clone();
            tokio::task::spawn(async move {
                if let Err(e) = respond(stream, &source, client_timeout).await {
                    warn!("error serving scrape connection: {e}");
                }
            });
        }
    })
}

// Handles one connection: drain whatever the client sent without parsing any
// of it, answer with the preamble and the current exposition body, then
// half-close the write side.
async fn respond(
    mut stream: TcpStream,
    source: &ScrapeSource,
    client_timeout: Duration,
) -> io::Result<()> {
    drain_request(&mut stream, client_timeout).await?;

    let body = source.body();
    match timeout(client_timeout, write_response(&mut stream, body.as_bytes())).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out writing response")),
    }
}

async fn write_response(stream: &mut TcpStream, body: &[u8]) -> io::Result<()> {
    stream.write_all(RESPONSE_PREAMBLE).await?;
    stream.write_all(body).await?;
    stream.shutdown().await
}

// Reads and discards request bytes. Every request gets the identical
// response, so the method, path, and headers never get parsed. The first read
// waits up to the client timeout (a silent client still gets a response);
// anything buffered beyond it is drained without blocking, up to a fixed cap.
async fn drain_request(stream: &mut TcpStream, client_timeout: Duration) -> io::Result<()> {
    let mut buf = [0u8; 1024];
    let mut drained = match timeout(client_timeout, stream.read(&mut buf)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(e),
        Err(_) => return Ok(()),
    };

    while drained < MAX_REQUEST_DRAIN {
        match stream.try_read(&mut buf) {
            Ok(0) => break,
            Ok(n) => drained += n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
