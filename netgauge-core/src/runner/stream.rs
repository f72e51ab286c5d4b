use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::Target;
use crate::measurement::MetricKind;
use crate::probe::Prober;

use super::collector::AggregatedMetric;
use super::progress::{UnitContext, UnitId};

/// Pause after a failed download so a dead endpoint list does not spin.
pub const FAILURE_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResult {
    pub stream_id: usize,
    pub successful_tests: u64,
    pub failed_tests: u64,
    pub mean_throughput_mbps: Option<f64>,
}

impl WorkerResult {
    fn empty(stream_id: usize) -> Self {
        Self {
            stream_id,
            successful_tests: 0,
            failed_tests: 0,
            mean_throughput_mbps: None,
        }
    }
}

/// Downloads round-robin over `targets` until the gate closes.
///
/// Each stream starts at `stream_id % targets.len()` with its own cursor, so streams overlap
/// on endpoints and measure concurrent throughput.
pub async fn run_stream<P: Prober>(
    stream_id: usize,
    targets: &[Target],
    ctx: &UnitContext<P>,
) -> WorkerResult {
    let mut result = WorkerResult::empty(stream_id);
    if targets.is_empty() {
        return result;
    }

    let unit = UnitId::Stream(stream_id);
    let mut cursor = stream_id % targets.len();
    let mut mean = 0.0;

    while ctx.gate.next() {
        let Some(target) = targets.get(cursor) else {
            break;
        };
        cursor = (cursor + 1) % targets.len();

        match ctx.probe(unit, target, MetricKind::Download).await.value() {
            Some(mbps) => {
                result.successful_tests += 1;
                mean += (mbps - mean) / result.successful_tests as f64;
            }
            None => {
                result.failed_tests += 1;
                ctx.gate.pause(FAILURE_BACKOFF).await;
            }
        }
    }

    if result.successful_tests > 0 {
        result.mean_throughput_mbps = Some(mean);
    }
    tracing::debug!(
        %unit,
        ok = result.successful_tests,
        failed = result.failed_tests,
        mbps = ?result.mean_throughput_mbps,
        "stream finished"
    );
    result
}

/// Download aggregate across streams: mean of each stream's mean, skipping streams that never
/// succeeded. `sample_count` is the total number of successful downloads.
pub fn merge_worker_results(results: &[WorkerResult]) -> AggregatedMetric {
    let attempted = results
        .iter()
        .map(|r| r.successful_tests + r.failed_tests)
        .sum();
    let successful: u64 = results.iter().map(|r| r.successful_tests).sum();

    let stream_means: Vec<f64> = results
        .iter()
        .filter(|r| r.successful_tests > 0)
        .filter_map(|r| r.mean_throughput_mbps)
        .filter(|v| v.is_finite())
        .collect();

    let mean =
        (!stream_means.is_empty()).then(|| stream_means.iter().sum::<f64>() / stream_means.len() as f64);

    AggregatedMetric {
        kind: MetricKind::Download,
        sample_count: if mean.is_some() { successful } else { 0 },
        attempted,
        mean,
        unit: MetricKind::Download.unit(),
    }
}
