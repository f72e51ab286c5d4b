use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::measurement::ProbeFailure;

/// One ICMP echo through the system `ping`; round trip in milliseconds.
pub(crate) async fn ping(host: &str, timeout: Duration) -> Result<f64, ProbeFailure> {
    if host.is_empty() || host.starts_with('-') {
        return Err(ProbeFailure::protocol(format!("invalid host `{host}`")));
    }

    let started = Instant::now();
    let output = Command::new("ping")
        .args(ping_args(PingFlavor::host(), timeout, host))
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| ProbeFailure::unavailable(format!("cannot run ping: {err}")))?;
    let wall = started.elapsed();

    if !output.status.success() {
        return Err(ProbeFailure::transport(format!("no echo reply from {host}")));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_rtt_ms(&stdout).unwrap_or_else(|| wall.as_secs_f64() * 1000.0))
}

/// Command-line dialects of the system `ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PingFlavor {
    /// iputils and busybox: `-W` is the reply wait in seconds.
    Linux,
    /// macOS and FreeBSD: `-W` is the reply wait in milliseconds.
    Darwin,
    /// OpenBSD and NetBSD: `-w` is the reply wait in seconds.
    Bsd,
    /// `-n` count, `-w` reply wait in milliseconds.
    Windows,
}

impl PingFlavor {
    pub(crate) fn host() -> Self {
        if cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "dragonfly"
        )) {
            Self::Darwin
        } else if cfg!(any(target_os = "openbsd", target_os = "netbsd")) {
            Self::Bsd
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

/// Arguments for a single echo to `host` that gives up after `timeout`.
pub(crate) fn ping_args(flavor: PingFlavor, timeout: Duration, host: &str) -> Vec<String> {
    let secs = timeout.as_secs().max(1).to_string();
    let millis = timeout.as_millis().max(1).to_string();

    let (count, wait_flag, wait) = match flavor {
        PingFlavor::Linux => ("-c", "-W", secs),
        PingFlavor::Darwin => ("-c", "-W", millis),
        PingFlavor::Bsd => ("-c", "-w", secs),
        PingFlavor::Windows => ("-n", "-w", millis),
    };

    vec![
        count.to_string(),
        "1".to_string(),
        wait_flag.to_string(),
        wait,
        host.to_string(),
    ]
}

/// Extracts the `time=<ms>` field of a ping reply line.
pub(crate) fn parse_rtt_ms(output: &str) -> Option<f64> {
    let start = output.find("time=")? + "time=".len();
    let rest = &output[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());

    rest[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
