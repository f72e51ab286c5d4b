use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::measurement::MetricKind;
use crate::scoring::{Score, ScoreBreakdown, Tier};

use super::collector::AggregatedMetric;
use super::stream::WorkerResult;

/// A finished benchmark run. Only the orchestrator builds these; there is no way to mutate one.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSession {
    pub(crate) session_id: Uuid,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: DateTime<Utc>,
    pub(crate) duration_budget: Duration,
    pub(crate) probe_timeout: Duration,
    pub(crate) upload_bytes: usize,
    pub(crate) concurrency: usize,
    pub(crate) comprehensive: bool,
    pub(crate) cancelled: bool,
    pub(crate) aggregated_metrics: BTreeMap<MetricKind, AggregatedMetric>,
    pub(crate) worker_results: Vec<WorkerResult>,
    pub(crate) score: Score,
}

impl BenchmarkSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn duration_budget(&self) -> Duration {
        self.duration_budget
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn upload_bytes(&self) -> usize {
        self.upload_bytes
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn comprehensive(&self) -> bool {
        self.comprehensive
    }

    /// The run was stopped by its caller before the budget ran out.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn aggregated_metrics(&self) -> &BTreeMap<MetricKind, AggregatedMetric> {
        &self.aggregated_metrics
    }

    pub fn metric(&self, kind: MetricKind) -> Option<&AggregatedMetric> {
        self.aggregated_metrics.get(&kind)
    }

    pub fn worker_results(&self) -> &[WorkerResult] {
        &self.worker_results
    }

    pub fn score(&self) -> u32 {
        self.score.total
    }

    pub fn tier(&self) -> Tier {
        self.score.tier
    }

    pub fn breakdown(&self) -> ScoreBreakdown {
        self.score.breakdown
    }

    /// Wall time between start and finish.
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
