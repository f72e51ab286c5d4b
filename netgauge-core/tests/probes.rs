use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use netgauge_core::runner::{BenchmarkConfig, BenchmarkOrchestrator};
use netgauge_core::{EndpointCatalog, FailureKind, MetricKind, NetworkProber, Prober, Target};
use netgauge_testserver::TestServer;
use tokio::net::{TcpListener, UdpSocket};

const TIMEOUT: Duration = Duration::from_secs(2);

/// Minimal resolver: echoes the query back as a response with the given rcode and answer count.
async fn fake_resolver(rcode: u8, answers: u16) -> anyhow::Result<SocketAddr> {
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let addr = socket.local_addr()?;

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
            if n < 12 {
                continue;
            }
            let mut reply = buf[..n].to_vec();
            reply[2] = 0x81;
            reply[3] = 0x80 | (rcode & 0x0f);
            reply[6..8].copy_from_slice(&answers.to_be_bytes());
            let _ = socket.send_to(&reply, peer).await;
        }
    });

    Ok(addr)
}

fn dir_is_empty(dir: &std::path::Path) -> anyhow::Result<bool> {
    Ok(std::fs::read_dir(dir)?.next().is_none())
}

#[tokio::test]
async fn dns_probe_times_a_successful_answer() -> anyhow::Result<()> {
    let resolver = fake_resolver(0, 1).await?;
    let prober = NetworkProber::new(1024);

    let m = prober
        .probe(&Target::dns(resolver, "example.com"), MetricKind::Dns, TIMEOUT)
        .await;

    let secs = m.value().with_context(|| format!("dns probe failed: {m:?}"))?;
    anyhow::ensure!(secs > 0.0 && secs < TIMEOUT.as_secs_f64(), "secs={secs}");
    Ok(())
}

#[tokio::test]
async fn dns_error_rcode_and_silence_fail() -> anyhow::Result<()> {
    let prober = NetworkProber::new(1024);

    let nxdomain = fake_resolver(3, 0).await?;
    let m = prober
        .probe(&Target::dns(nxdomain, "nope.test"), MetricKind::Dns, TIMEOUT)
        .await;
    anyhow::ensure!(
        m.failure().map(|f| f.kind) == Some(FailureKind::Protocol),
        "got {m:?}"
    );

    // Bound but never answers.
    let silent = UdpSocket::bind("127.0.0.1:0").await?;
    let started = Instant::now();
    let m = prober
        .probe(
            &Target::dns(silent.local_addr()?, "example.com"),
            MetricKind::Dns,
            Duration::from_millis(300),
        )
        .await;
    anyhow::ensure!(
        m.failure().map(|f| f.kind) == Some(FailureKind::Timeout),
        "got {m:?}"
    );
    anyhow::ensure!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test]
async fn tcp_probe_times_the_handshake() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let prober = NetworkProber::new(1024);

    let m = prober
        .probe(&Target::host("127.0.0.1", port), MetricKind::TcpConnect, TIMEOUT)
        .await;
    anyhow::ensure!(m.is_success(), "got {m:?}");

    drop(listener);
    let m = prober
        .probe(&Target::host("127.0.0.1", port), MetricKind::TcpConnect, TIMEOUT)
        .await;
    anyhow::ensure!(
        m.failure().map(|f| f.kind) == Some(FailureKind::Transport),
        "got {m:?}"
    );
    Ok(())
}

#[tokio::test]
async fn download_probe_cleans_up_its_scratch_file() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let scratch = tempfile::tempdir()?;
    let prober = NetworkProber::new(1024).with_scratch_dir(scratch.path());

    let m = prober
        .probe(
            &Target::url(server.urls().download_sized(512 * 1024)),
            MetricKind::Download,
            TIMEOUT,
        )
        .await;
    let mbps = m.value().with_context(|| format!("download failed: {m:?}"))?;
    anyhow::ensure!(mbps > 0.0);
    anyhow::ensure!(dir_is_empty(scratch.path())?, "scratch file left behind");

    let m = prober
        .probe(
            &Target::url(server.urls().slow.clone()),
            MetricKind::Download,
            Duration::from_millis(300),
        )
        .await;
    anyhow::ensure!(
        m.failure().map(|f| f.kind) == Some(FailureKind::Timeout),
        "got {m:?}"
    );
    anyhow::ensure!(dir_is_empty(scratch.path())?, "scratch file left after timeout");

    // `/slow` is still sleeping server-side; dropping aborts instead of draining it.
    drop(server);
    Ok(())
}

#[tokio::test]
async fn upload_probe_posts_the_configured_payload() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let prober = NetworkProber::new(100_000);

    let m = prober
        .probe(
            &Target::url(server.urls().upload.clone()),
            MetricKind::Upload,
            TIMEOUT,
        )
        .await;
    anyhow::ensure!(m.is_success(), "got {m:?}");
    anyhow::ensure!(server.stats().bytes_uploaded() == 100_000);

    let m = prober
        .probe(
            &Target::url(server.urls().broken.clone()),
            MetricKind::Upload,
            TIMEOUT,
        )
        .await;
    // `/broken` only routes GET, so the POST is rejected with 405
    anyhow::ensure!(
        m.failure().map(|f| f.kind) == Some(FailureKind::Protocol),
        "got {m:?}"
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn local_session_end_to_end() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let resolver = fake_resolver(0, 1).await?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let catalog = EndpointCatalog {
        dns: vec![Target::dns(resolver, "example.com")],
        latency: Vec::new(),
        tcp: vec![Target::host("127.0.0.1", port)],
        download: vec![Target::url(server.urls().download_sized(256 * 1024))],
        upload: vec![Target::url(server.urls().upload.clone())],
        interfaces: Some(Vec::new()),
    };
    let config = BenchmarkConfig {
        duration: Duration::from_millis(800),
        concurrency: 2,
        probe_timeout: TIMEOUT,
        upload_bytes: 64 * 1024,
        ..BenchmarkConfig::default()
    }
    .with_catalog(catalog);

    let orchestrator = BenchmarkOrchestrator::new(NetworkProber::new(config.upload_bytes));
    let session = orchestrator.run_session(&config).await?;

    for kind in [
        MetricKind::Dns,
        MetricKind::TcpConnect,
        MetricKind::Download,
        MetricKind::Upload,
    ] {
        let metric = session
            .metric(kind)
            .with_context(|| format!("missing {kind}"))?;
        anyhow::ensure!(!metric.all_failed(), "{kind} all failed: {metric:?}");
    }
    anyhow::ensure!(
        session
            .metric(MetricKind::Latency)
            .is_some_and(|m| m.attempted == 0)
    );
    // dns and tcp are sub-millisecond on loopback
    anyhow::ensure!(session.breakdown().dns == 15);
    anyhow::ensure!(session.breakdown().tcp_connect == 15);

    server.shutdown().await;
    Ok(())
}
