use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::catalog::Target;
use crate::error::{Error, Result};
use crate::measurement::MetricKind;
use crate::probe::Prober;
use crate::scoring::ScoringEngine;

use super::collector::{AggregatedMetric, collect};
use super::config::BenchmarkConfig;
use super::gate::{CancelHandle, SessionGate};
use super::progress::{ProgressFn, UnitContext, UnitId};
use super::session::BenchmarkSession;
use super::stream::{WorkerResult, merge_worker_results, run_stream};

/// Launches collectors and download streams for one session, joins them and scores the result.
pub struct BenchmarkOrchestrator<P> {
    prober: Arc<P>,
    scoring: ScoringEngine,
    progress: Option<ProgressFn>,
    cancel: CancelHandle,
}

impl<P: Prober> BenchmarkOrchestrator<P> {
    pub fn new(prober: P) -> Self {
        Self {
            prober: Arc::new(prober),
            scoring: ScoringEngine::default(),
            progress: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Handle that stops every unit before its next probe.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub async fn run_session(&self, config: &BenchmarkConfig) -> Result<BenchmarkSession> {
        config.validate()?;
        self.prober
            .check_capability()
            .await
            .map_err(Error::Launch)?;

        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        let deadline = started + config.duration;
        // Hard limit: a unit still running here is aborted.
        let ceiling = deadline + config.probe_timeout;

        let catalog = &config.catalog;
        let mut plan: Vec<(MetricKind, Vec<Target>)> = vec![
            (MetricKind::Dns, catalog.dns.clone()),
            (MetricKind::Latency, catalog.latency.clone()),
            (MetricKind::TcpConnect, catalog.tcp.clone()),
        ];
        if config.comprehensive {
            let interfaces = match &catalog.interfaces {
                Some(interfaces) => interfaces.clone(),
                None => self.prober.discover_interfaces().await,
            };
            plan.push((MetricKind::Upload, catalog.upload.clone()));
            plan.push((MetricKind::InterfaceStats, interfaces));
        }
        let downloads: Arc<[Target]> = catalog.download.clone().into();

        if downloads.is_empty() && plan.iter().all(|(_, targets)| targets.is_empty()) {
            return Err(Error::EmptyCatalog);
        }

        tracing::info!(
            %session_id,
            duration = ?config.duration,
            concurrency = config.concurrency,
            comprehensive = config.comprehensive,
            "benchmark session started"
        );

        let gate = Arc::new(SessionGate::new(deadline, self.cancel.clone()));
        let ctx = UnitContext::new(
            self.prober.clone(),
            gate.clone(),
            config.probe_timeout,
            self.progress.clone(),
        );

        let collectors: Vec<(MetricKind, JoinHandle<AggregatedMetric>)> = plan
            .into_iter()
            .map(|(kind, targets)| {
                let ctx = ctx.clone();
                let handle = tokio::spawn(async move { collect(&ctx, &targets, kind).await });
                (kind, handle)
            })
            .collect();

        let streams: Vec<(usize, JoinHandle<WorkerResult>)> = (0..config.concurrency)
            .map(|stream_id| {
                let ctx = ctx.clone();
                let downloads = downloads.clone();
                let handle =
                    tokio::spawn(async move { run_stream(stream_id, &downloads, &ctx).await });
                (stream_id, handle)
            })
            .collect();

        let mut aggregated_metrics = BTreeMap::new();
        for (kind, handle) in collectors {
            let metric = join_unit(UnitId::Collector(kind), handle, ceiling)
                .await
                .unwrap_or_else(|| AggregatedMetric::absent(kind));
            aggregated_metrics.insert(kind, metric);
        }

        let mut worker_results = Vec::with_capacity(config.concurrency);
        for (stream_id, handle) in streams {
            if let Some(result) = join_unit(UnitId::Stream(stream_id), handle, ceiling).await {
                worker_results.push(result);
            }
        }
        aggregated_metrics.insert(MetricKind::Download, merge_worker_results(&worker_results));

        let score = self.scoring.score(&aggregated_metrics);
        let cancelled = gate.is_cancelled();
        let finished_at = Utc::now();

        tracing::info!(
            %session_id,
            score = score.total,
            tier = %score.tier,
            elapsed = ?started.elapsed(),
            cancelled,
            "benchmark session finished"
        );

        Ok(BenchmarkSession {
            session_id,
            started_at,
            finished_at,
            duration_budget: config.duration,
            probe_timeout: config.probe_timeout,
            upload_bytes: config.upload_bytes,
            concurrency: config.concurrency,
            comprehensive: config.comprehensive,
            cancelled,
            aggregated_metrics,
            worker_results,
            score,
        })
    }
}

/// Waits for one unit until `ceiling`. A panicked or overdue unit yields `None`.
async fn join_unit<T>(unit: UnitId, mut handle: JoinHandle<T>, ceiling: Instant) -> Option<T> {
    match tokio::time::timeout_at(ceiling.into(), &mut handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            tracing::warn!(%unit, error = %err, "unit failed, treating its result as absent");
            None
        }
        Err(_) => {
            handle.abort();
            tracing::warn!(%unit, "unit overran the session ceiling and was aborted");
            None
        }
    }
}
