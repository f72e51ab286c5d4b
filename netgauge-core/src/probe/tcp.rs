use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use crate::measurement::ProbeFailure;

/// Time until a TCP handshake with `host:port` completes. Name resolution counts towards it.
pub(crate) async fn connect(host: &str, port: u16) -> Result<Duration, ProbeFailure> {
    let started = Instant::now();
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|err| ProbeFailure::transport(format!("connect {host}:{port}: {err}")))?;
    let elapsed = started.elapsed();

    drop(stream);
    Ok(elapsed)
}
