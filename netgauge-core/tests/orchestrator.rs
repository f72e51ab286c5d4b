#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use netgauge_core::runner::{
    BenchmarkConfig, BenchmarkOrchestrator, ProbeEvent, ProgressFn, UnitId,
};
use netgauge_core::{
    EndpointCatalog, Error, Measurement, MetricKind, ProbeFailure, Prober, Target, Tier,
};

type Reply = fn(&Target, MetricKind) -> Result<f64, ProbeFailure>;

/// Answers every probe from a fixed table after a fixed delay, never touching the network.
struct ScriptedProber {
    delay: Duration,
    reply: Reply,
    capable: bool,
    /// Kinds that hang far beyond any timeout.
    hang: Vec<MetricKind>,
    /// Kinds whose probe panics.
    panic: Vec<MetricKind>,
    calls: Arc<Mutex<HashMap<MetricKind, usize>>>,
}

impl ScriptedProber {
    fn new(delay: Duration, reply: Reply) -> Self {
        Self {
            delay,
            reply,
            capable: true,
            hang: Vec::new(),
            panic: Vec::new(),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> Arc<Mutex<HashMap<MetricKind, usize>>> {
        self.calls.clone()
    }
}

impl Prober for ScriptedProber {
    async fn probe(&self, target: &Target, kind: MetricKind, timeout: Duration) -> Measurement {
        *self.calls.lock().unwrap().entry(kind).or_default() += 1;

        if self.panic.contains(&kind) {
            panic!("scripted probe panic for {kind}");
        }
        if self.hang.contains(&kind) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self.delay >= timeout {
            tokio::time::sleep(timeout).await;
            return Measurement::failed(kind, target.clone(), ProbeFailure::timeout(timeout));
        }

        tokio::time::sleep(self.delay).await;
        Measurement::from_result(kind, target.clone(), (self.reply)(target, kind))
    }

    async fn check_capability(&self) -> Result<(), String> {
        if self.capable {
            Ok(())
        } else {
            Err("sockets are not available".to_string())
        }
    }

    async fn discover_interfaces(&self) -> Vec<Target> {
        vec![Target::interface("test0")]
    }
}

fn healthy(_: &Target, kind: MetricKind) -> Result<f64, ProbeFailure> {
    Ok(match kind {
        MetricKind::Dns => 0.040,
        MetricKind::Latency => 15.0,
        MetricKind::TcpConnect => 0.080,
        MetricKind::Download => 600.0,
        MetricKind::Upload => 80.0,
        MetricKind::InterfaceStats => 0.5,
    })
}

fn unreachable(target: &Target, _: MetricKind) -> Result<f64, ProbeFailure> {
    Err(ProbeFailure::transport(format!("{target} unreachable")))
}

fn catalog() -> EndpointCatalog {
    let resolver: SocketAddr = "127.0.0.1:53".parse().unwrap();
    EndpointCatalog {
        dns: vec![Target::dns(resolver, "a.test"), Target::dns(resolver, "b.test")],
        latency: vec![Target::host("10.0.0.1", 443)],
        tcp: vec![Target::host("10.0.0.1", 443), Target::host("10.0.0.2", 443)],
        download: vec![
            Target::url("http://d0.test/"),
            Target::url("http://d1.test/"),
            Target::url("http://d2.test/"),
        ],
        upload: vec![Target::url("http://u0.test/")],
        interfaces: None,
    }
}

/// Timer wheel resolution plus scheduling jitter; far below any probe timeout.
const TIMER_SLACK: Duration = Duration::from_millis(50);

fn config(duration: Duration, concurrency: usize, comprehensive: bool) -> BenchmarkConfig {
    BenchmarkConfig {
        duration,
        concurrency,
        comprehensive,
        probe_timeout: Duration::from_secs(1),
        ..BenchmarkConfig::default()
    }
    .with_catalog(catalog())
}

#[tokio::test]
async fn comprehensive_session_scores_every_metric() {
    let prober = ScriptedProber::new(Duration::from_millis(10), healthy);
    let calls = prober.calls();
    let orchestrator = BenchmarkOrchestrator::new(prober);

    let session = orchestrator
        .run_session(&config(Duration::from_millis(400), 2, true))
        .await
        .unwrap();

    let kinds: Vec<MetricKind> = session.aggregated_metrics().keys().copied().collect();
    assert_eq!(
        kinds,
        vec![
            MetricKind::Dns,
            MetricKind::Latency,
            MetricKind::TcpConnect,
            MetricKind::Download,
            MetricKind::Upload,
            MetricKind::InterfaceStats,
        ]
    );

    let dns = session.metric(MetricKind::Dns).unwrap();
    assert_eq!(dns.sample_count, 2);
    assert_eq!(dns.mean, Some(0.040));

    let download = session.metric(MetricKind::Download).unwrap();
    assert_eq!(download.mean, Some(600.0));
    assert!(download.sample_count >= 2);
    assert_eq!(session.worker_results().len(), 2);

    // discovered interface was probed
    assert_eq!(
        session.metric(MetricKind::InterfaceStats).unwrap().sample_count,
        1
    );
    assert_eq!(calls.lock().unwrap().get(&MetricKind::InterfaceStats), Some(&1));

    assert_eq!(session.score(), 95);
    assert_eq!(session.tier(), Tier::EnterpriseGrade);
    assert!(!session.cancelled());
    assert!(session.finished_at() >= session.started_at());
}

#[tokio::test]
async fn quick_session_skips_upload_and_interfaces() {
    let prober = ScriptedProber::new(Duration::from_millis(5), healthy);
    let calls = prober.calls();
    let orchestrator = BenchmarkOrchestrator::new(prober);

    let session = orchestrator
        .run_session(&config(Duration::from_millis(200), 1, false))
        .await
        .unwrap();

    assert!(session.metric(MetricKind::Upload).is_none());
    assert!(session.metric(MetricKind::InterfaceStats).is_none());
    assert!(session.metric(MetricKind::Download).is_some());

    let calls = calls.lock().unwrap();
    assert!(!calls.contains_key(&MetricKind::Upload));
    assert!(!calls.contains_key(&MetricKind::InterfaceStats));
}

#[tokio::test]
async fn launch_failures_are_errors() {
    let mut prober = ScriptedProber::new(Duration::ZERO, healthy);
    prober.capable = false;
    let err = BenchmarkOrchestrator::new(prober)
        .run_session(&config(Duration::from_secs(1), 1, true))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Launch(_)));
    assert!(!err.is_invalid_input());

    let orchestrator = BenchmarkOrchestrator::new(ScriptedProber::new(Duration::ZERO, healthy));

    let cfg = BenchmarkConfig {
        concurrency: 0,
        ..config(Duration::from_secs(1), 1, true)
    };
    let err = orchestrator.run_session(&cfg).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConcurrency));

    let cfg = config(Duration::from_secs(1), 1, true).with_catalog(EndpointCatalog::empty());
    let err = orchestrator.run_session(&cfg).await.unwrap_err();
    assert!(matches!(err, Error::EmptyCatalog));
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn unreachable_endpoints_finish_within_budget_plus_one_probe_timeout() {
    // Every probe burns its whole timeout and then fails.
    let prober = ScriptedProber::new(Duration::from_secs(10), unreachable);
    let orchestrator = BenchmarkOrchestrator::new(prober);
    let cfg = config(Duration::from_secs(5), 4, true);

    let started = Instant::now();
    let session = orchestrator.run_session(&cfg).await.unwrap();
    let elapsed = started.elapsed();

    let limit = cfg.duration + cfg.probe_timeout;
    assert!(elapsed <= limit + TIMER_SLACK, "elapsed={elapsed:?} limit={limit:?}");

    assert!(session.aggregated_metrics().values().all(|m| m.all_failed()));
    assert_eq!(session.worker_results().len(), 4);
    assert!(
        session
            .worker_results()
            .iter()
            .all(|w| w.successful_tests == 0 && w.mean_throughput_mbps.is_none())
    );
    assert_eq!(session.score(), 0);
    assert_eq!(session.tier(), Tier::Poor);
}

#[tokio::test]
async fn hung_and_panicking_units_are_treated_as_absent() {
    let mut prober = ScriptedProber::new(Duration::from_millis(5), healthy);
    prober.hang = vec![MetricKind::Latency];
    prober.panic = vec![MetricKind::TcpConnect];

    let orchestrator = BenchmarkOrchestrator::new(prober);
    let cfg = BenchmarkConfig {
        probe_timeout: Duration::from_millis(200),
        ..config(Duration::from_millis(200), 1, false)
    };

    let started = Instant::now();
    let session = orchestrator.run_session(&cfg).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    let latency = session.metric(MetricKind::Latency).unwrap();
    assert!(latency.all_failed());
    assert!(session.metric(MetricKind::TcpConnect).unwrap().all_failed());
    assert!(!session.metric(MetricKind::Dns).unwrap().all_failed());

    // 15 dns + 0 latency + 0 tcp + 45 bandwidth
    assert_eq!(session.score(), 60);
    assert_eq!(session.tier(), Tier::VeryGood);
}

#[tokio::test]
async fn hung_unit_is_cut_at_budget_plus_probe_timeout() {
    let mut prober = ScriptedProber::new(Duration::from_millis(5), healthy);
    prober.hang = vec![MetricKind::Latency];

    let orchestrator = BenchmarkOrchestrator::new(prober);
    let cfg = BenchmarkConfig {
        probe_timeout: Duration::from_millis(500),
        ..config(Duration::from_secs(1), 1, false)
    };

    let started = Instant::now();
    let session = orchestrator.run_session(&cfg).await.unwrap();
    let elapsed = started.elapsed();

    let limit = cfg.duration + cfg.probe_timeout;
    assert!(elapsed >= limit, "elapsed={elapsed:?} limit={limit:?}");
    assert!(elapsed <= limit + TIMER_SLACK, "elapsed={elapsed:?} limit={limit:?}");
    assert!(session.metric(MetricKind::Latency).unwrap().all_failed());
    assert!(!session.metric(MetricKind::Dns).unwrap().all_failed());
}

#[tokio::test]
async fn cancellation_stops_the_session_early() {
    let prober = ScriptedProber::new(Duration::from_millis(20), healthy);
    let orchestrator = BenchmarkOrchestrator::new(prober);
    let cancel = orchestrator.cancel_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let session = orchestrator
        .run_session(&config(Duration::from_secs(30), 2, true))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(session.cancelled());
    assert!(!session.metric(MetricKind::Download).unwrap().all_failed());
}

#[tokio::test]
async fn streams_start_at_their_own_offset_and_report_progress() {
    let events: Arc<Mutex<Vec<ProbeEvent>>> = Arc::default();
    let seen = Arc::new(AtomicUsize::new(0));

    let progress: ProgressFn = {
        let events = events.clone();
        let seen = seen.clone();
        Arc::new(move |ev: ProbeEvent| {
            seen.fetch_add(1, Ordering::Relaxed);
            events.lock().unwrap().push(ev);
        })
    };

    let orchestrator =
        BenchmarkOrchestrator::new(ScriptedProber::new(Duration::from_millis(10), healthy))
            .with_progress(progress);
    let session = orchestrator
        .run_session(&config(Duration::from_millis(200), 2, false))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(seen.load(Ordering::Relaxed), events.len());

    let first_target = |stream: usize| {
        events
            .iter()
            .find(|ev| ev.unit == UnitId::Stream(stream))
            .map(|ev| ev.measurement.target.clone())
    };
    assert_eq!(first_target(0), Some(Target::url("http://d0.test/")));
    assert_eq!(first_target(1), Some(Target::url("http://d1.test/")));

    let stream_events = events
        .iter()
        .filter(|ev| matches!(ev.unit, UnitId::Stream(_)))
        .count() as u64;
    assert_eq!(
        stream_events,
        session
            .worker_results()
            .iter()
            .map(|w| w.successful_tests + w.failed_tests)
            .sum::<u64>()
    );
    assert!(
        events
            .iter()
            .any(|ev| ev.unit == UnitId::Collector(MetricKind::Dns))
    );
}
