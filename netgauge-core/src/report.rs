use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::measurement::{MetricKind, Unit};
use crate::runner::{AggregatedMetric, BenchmarkSession, WorkerResult};
use crate::scoring::{ScoreBreakdown, Tier};

/// `strftime` layout of report ids, e.g. `20261018T101530.123Z`.
pub const REPORT_ID_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

#[must_use]
pub fn report_id(at: DateTime<Utc>) -> String {
    at.format(REPORT_ID_FORMAT).to_string()
}

#[must_use]
pub fn is_report_id(id: &str) -> bool {
    NaiveDateTime::parse_from_str(id, REPORT_ID_FORMAT).is_ok()
}

/// Durable snapshot of one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub id: String,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub score: u32,
    pub classification: Tier,
    pub average_download_mbps: Option<f64>,
    /// Every metric kind, `null` where nothing was measured.
    pub raw_metrics: BTreeMap<MetricKind, Option<f64>>,
    pub metrics: BTreeMap<MetricKind, MetricReport>,
    pub worker_results: Vec<WorkerResult>,
    pub breakdown: ScoreBreakdown,
    pub settings: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReport {
    pub sample_count: u64,
    pub attempted: u64,
    pub all_failed: bool,
    pub mean_value: Option<f64>,
    pub unit: Unit,
}

impl From<&AggregatedMetric> for MetricReport {
    fn from(m: &AggregatedMetric) -> Self {
        Self {
            sample_count: m.sample_count,
            attempted: m.attempted,
            all_failed: m.all_failed(),
            mean_value: m.mean,
            unit: m.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub duration_ms: u64,
    pub concurrency: usize,
    pub comprehensive: bool,
    pub probe_timeout_ms: u64,
    pub upload_bytes: usize,
    pub cancelled: bool,
}

impl SessionReport {
    pub fn from_session(session: &BenchmarkSession) -> Self {
        let metrics: BTreeMap<MetricKind, MetricReport> = session
            .aggregated_metrics()
            .iter()
            .map(|(kind, m)| (*kind, MetricReport::from(m)))
            .collect();

        let raw_metrics = MetricKind::iter()
            .map(|kind| (kind, metrics.get(&kind).and_then(|m| m.mean_value)))
            .collect();

        Self {
            id: report_id(session.finished_at()),
            session_id: session.session_id(),
            started_at: session.started_at(),
            finished_at: session.finished_at(),
            score: session.score(),
            classification: session.tier(),
            average_download_mbps: session.metric(MetricKind::Download).and_then(|m| m.mean),
            raw_metrics,
            metrics,
            worker_results: session.worker_results().to_vec(),
            breakdown: session.breakdown(),
            settings: SessionSettings {
                duration_ms: millis(session.duration_budget()),
                concurrency: session.concurrency(),
                comprehensive: session.comprehensive(),
                probe_timeout_ms: millis(session.probe_timeout()),
                upload_bytes: session.upload_bytes(),
                cancelled: session.cancelled(),
            },
        }
    }

    /// Mean for `kind`, `None` when it was not measured or every probe failed.
    #[must_use]
    pub fn metric_value(&self, kind: MetricKind) -> Option<f64> {
        self.raw_metrics.get(&kind).copied().flatten()
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Hand-built report for tests that do not need a real session.
#[cfg(test)]
pub(crate) fn fixture(id: &str, score: u32, values: &[(MetricKind, Option<f64>)]) -> SessionReport {
    let at = Utc::now();
    let metrics: BTreeMap<MetricKind, MetricReport> = values
        .iter()
        .map(|(kind, v)| {
            let m = AggregatedMetric::from_values(*kind, 1, v.iter().copied());
            (*kind, MetricReport::from(&m))
        })
        .collect();

    SessionReport {
        id: id.to_string(),
        session_id: Uuid::new_v4(),
        started_at: at,
        finished_at: at,
        score,
        classification: Tier::from_score(score),
        average_download_mbps: metrics.get(&MetricKind::Download).and_then(|m| m.mean_value),
        raw_metrics: MetricKind::iter()
            .map(|kind| (kind, metrics.get(&kind).and_then(|m| m.mean_value)))
            .collect(),
        metrics,
        worker_results: vec![WorkerResult {
            stream_id: 0,
            successful_tests: 2,
            failed_tests: 1,
            mean_throughput_mbps: Some(87.654_321_123),
        }],
        breakdown: ScoreBreakdown::default(),
        settings: SessionSettings {
            duration_ms: 15_000,
            concurrency: 3,
            comprehensive: true,
            probe_timeout_ms: 5_000,
            upload_bytes: 2 * 1024 * 1024,
            cancelled: false,
        },
    }
}
