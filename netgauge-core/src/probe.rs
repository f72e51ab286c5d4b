mod dns;
mod echo;
mod interface;
mod tcp;
mod transfer;

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use netgauge_http::HttpClient;

use crate::catalog::Target;
use crate::measurement::{Measurement, MetricKind, ProbeFailure};

pub use interface::InterfaceCounters;

/// Runs one bounded measurement against one target.
///
/// Implementations must resolve within `timeout` and report every failure inside the returned
/// [`Measurement`]; probing never errors out of band.
pub trait Prober: Send + Sync + 'static {
    fn probe(
        &self,
        target: &Target,
        kind: MetricKind,
        timeout: Duration,
    ) -> impl Future<Output = Measurement> + Send;

    /// Checked once before a session launches; an `Err` aborts the session.
    fn check_capability(&self) -> impl Future<Output = Result<(), String>> + Send {
        async { Ok(()) }
    }

    /// Interfaces to sample when the catalog leaves them unspecified.
    fn discover_interfaces(&self) -> impl Future<Output = Vec<Target>> + Send {
        async { Vec::new() }
    }
}

/// Probes real endpoints over the host's network stack.
#[derive(Debug, Clone)]
pub struct NetworkProber {
    http: HttpClient,
    upload_payload: Bytes,
    scratch_dir: Option<PathBuf>,
}

impl NetworkProber {
    pub fn new(upload_bytes: usize) -> Self {
        Self {
            http: HttpClient::default(),
            upload_payload: transfer::payload(upload_bytes),
            scratch_dir: None,
        }
    }

    /// Download probes stage bodies under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    async fn dispatch(
        &self,
        target: &Target,
        kind: MetricKind,
        timeout: Duration,
    ) -> Result<f64, ProbeFailure> {
        match (kind, target) {
            (MetricKind::Dns, Target::Dns { resolver, domain }) => {
                let rtt = dns::resolve(*resolver, domain).await?;
                Ok(rtt.as_secs_f64())
            }
            (MetricKind::Latency, Target::Host { host, .. }) => echo::ping(host, timeout).await,
            (MetricKind::TcpConnect, Target::Host { host, port }) => {
                let rtt = tcp::connect(host, *port).await?;
                Ok(rtt.as_secs_f64())
            }
            (MetricKind::Download, Target::Url(url)) => {
                transfer::download(&self.http, url, timeout, self.scratch_dir.as_deref()).await
            }
            (MetricKind::Upload, Target::Url(url)) => {
                transfer::upload(&self.http, url, self.upload_payload.clone(), timeout).await
            }
            (MetricKind::InterfaceStats, Target::Interface(name)) => {
                let counters = interface::sample(name.clone()).await?;
                Ok(counters.error_rate_percent())
            }
            (kind, target) => Err(ProbeFailure::protocol(format!(
                "target `{target}` cannot be probed for {kind}"
            ))),
        }
    }
}

impl Prober for NetworkProber {
    async fn probe(&self, target: &Target, kind: MetricKind, timeout: Duration) -> Measurement {
        let res = match tokio::time::timeout(timeout, self.dispatch(target, kind, timeout)).await {
            Ok(res) => res,
            Err(_) => Err(ProbeFailure::timeout(timeout)),
        };

        if let Err(failure) = &res {
            tracing::debug!(%kind, %target, %failure, "probe failed");
        }

        Measurement::from_result(kind, target.clone(), res)
    }

    async fn check_capability(&self) -> Result<(), String> {
        // Every probe family needs to open sockets; a sandbox without network access
        // would otherwise report a perfectly failed session.
        tokio::net::UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .map(|_| ())
            .map_err(|err| format!("cannot open a network socket: {err}"))
    }

    async fn discover_interfaces(&self) -> Vec<Target> {
        match tokio::task::spawn_blocking(interface::discover).await {
            Ok(targets) => targets,
            Err(err) => {
                tracing::warn!(error = %err, "interface discovery failed");
                Vec::new()
            }
        }
    }
}
