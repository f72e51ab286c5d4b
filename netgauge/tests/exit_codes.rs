use std::net::SocketAddr;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Context as _;
use netgauge_testserver::TestServer;
use tokio::net::{TcpListener, UdpSocket};

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn ensure_code(out: &Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

async fn netgauge(args: Vec<String>) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_netgauge");
    tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args(&args)
            .env_remove("NETGAUGE_RESULTS_DIR")
            .env_remove("NETGAUGE_DURATION")
            .env_remove("NETGAUGE_CONCURRENCY")
            .env_remove("RUST_LOG")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run netgauge binary")
}

/// Answers every query with NOERROR and one answer record.
async fn fake_resolver() -> anyhow::Result<SocketAddr> {
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
            reply[3] = 0x80;
            reply[6..8].copy_from_slice(&1u16.to_be_bytes());
            let _ = socket.send_to(&reply, peer).await;
        }
    });

    Ok(addr)
}

fn write_catalog(dir: &Path, body: &str) -> anyhow::Result<String> {
    let path = dir.join("catalog.yaml");
    std::fs::write(&path, body).context("write catalog")?;
    Ok(path.display().to_string())
}

fn stored_reports(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut ids: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".json") && name != "latest.json")
        .map(|name| name.trim_end_matches(".json").to_string())
        .collect();
    ids.sort();
    Ok(ids)
}

fn json_lines(out: &Output) -> anyhow::Result<Vec<serde_json::Value>> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).with_context(|| format!("not json: {l}")))
        .collect()
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_netgauge");

    let out = Command::new(exe)
        .arg("run")
        .arg("--duration")
        .arg("10x")
        .output()
        .context("run netgauge binary")?;

    ensure_code(&out, 30)
}

#[tokio::test]
async fn empty_catalog_exits_30() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = write_catalog(
        dir.path(),
        "dns: []\nlatency: []\ntcp: []\ndownload: []\nupload: []\ninterfaces: []\n",
    )?;

    let out = netgauge(vec![
        "run".into(),
        "--catalog".into(),
        catalog,
        "--duration".into(),
        "1s".into(),
        "--no-save".into(),
    ])
    .await?;

    ensure_code(&out, 30)
}

#[tokio::test]
async fn missing_reports_exit_50() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let results = dir.path().display().to_string();

    let out = netgauge(vec![
        "compare".into(),
        "20261018T101530.123Z".into(),
        "latest".into(),
        "--results-dir".into(),
        results.clone(),
    ])
    .await?;
    ensure_code(&out, 50)?;

    let out = netgauge(vec!["show".into(), "--results-dir".into(), results.clone()]).await?;
    ensure_code(&out, 50)?;

    let out = netgauge(vec!["list".into(), "--results-dir".into(), results]).await?;
    ensure_code(&out, 0)?;
    anyhow::ensure!(String::from_utf8_lossy(&out.stdout).contains("no saved reports"));
    Ok(())
}

#[tokio::test]
async fn local_run_saves_and_compares() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let resolver = fake_resolver().await?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let dir = tempfile::tempdir()?;
    let results_dir = dir.path().join("results");
    let catalog = write_catalog(
        dir.path(),
        &format!(
            "dns:\n  - resolver: {resolver}\n    domain: example.com\n\
             latency: []\n\
             tcp:\n  - host: 127.0.0.1\n    port: {port}\n\
             download:\n  - {download}\n\
             upload:\n  - {upload}\n\
             interfaces: []\n",
            download = server.urls().download_sized(128 * 1024),
            upload = server.urls().upload,
        ),
    )?;

    let run_args = || {
        vec![
            "run".to_string(),
            "--catalog".to_string(),
            catalog.clone(),
            "--duration".to_string(),
            "1s".to_string(),
            "--concurrency".to_string(),
            "2".to_string(),
            "--probe-timeout".to_string(),
            "2s".to_string(),
            "--upload-bytes".to_string(),
            "65536".to_string(),
            "--results-dir".to_string(),
            results_dir.display().to_string(),
            "--output".to_string(),
            "json".to_string(),
        ]
    };

    let first = netgauge(run_args()).await?;
    ensure_code(&first, 0)?;

    let lines = json_lines(&first)?;
    anyhow::ensure!(lines.iter().any(|l| l["kind"] == "progress"));
    let report = lines
        .iter()
        .find(|l| l["kind"] == "report")
        .context("no report line")?;
    anyhow::ensure!(report["score"].as_u64().is_some_and(|s| s <= 100));
    anyhow::ensure!(report["averageDownloadMbps"].as_f64().is_some_and(|v| v > 0.0));
    anyhow::ensure!(report["rawMetrics"]["latency"].is_null());

    let second = netgauge(run_args()).await?;
    ensure_code(&second, 0)?;

    let ids = stored_reports(&results_dir)?;
    anyhow::ensure!(ids.len() == 2, "ids={ids:?}");
    anyhow::ensure!(results_dir.join("latest.json").is_file());

    let out = netgauge(vec![
        "compare".into(),
        ids[0].clone(),
        "latest".into(),
        "--results-dir".into(),
        results_dir.display().to_string(),
        "--output".into(),
        "json".into(),
    ])
    .await?;
    ensure_code(&out, 0)?;
    let lines = json_lines(&out)?;
    anyhow::ensure!(lines.len() == 1, "lines={lines:?}");
    anyhow::ensure!(lines[0]["kind"] == "comparison");
    anyhow::ensure!(lines[0]["afterId"] == ids[1].as_str());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unwritable_results_dir_exits_20_after_printing() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let dir = tempfile::tempdir()?;
    let catalog = write_catalog(
        dir.path(),
        &format!(
            "dns: []\nlatency: []\ntcp:\n  - host: 127.0.0.1\n    port: {port}\n\
             download: []\nupload: []\ninterfaces: []\n"
        ),
    )?;
    // A regular file where the results directory should be.
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"")?;

    let out = netgauge(vec![
        "run".into(),
        "--catalog".into(),
        catalog,
        "--duration".into(),
        "300ms".into(),
        "--results-dir".into(),
        blocker.join("results").display().to_string(),
        "--output".into(),
        "json".into(),
    ])
    .await?;

    ensure_code(&out, 20)?;
    let lines = json_lines(&out)?;
    anyhow::ensure!(lines.iter().any(|l| l["kind"] == "report"));
    Ok(())
}
