#![forbid(unsafe_code)]

mod catalog;
mod compare;
mod error;
mod measurement;
mod probe;
mod report;
mod scoring;
mod store;

pub mod runner;

pub use catalog::{EndpointCatalog, Target};
pub use compare::{ComparisonResult, ComparisonStatus, MetricComparison, compare, percent_improvement};
pub use error::{Error, Result};
pub use measurement::{FailureKind, Measurement, MetricKind, ProbeFailure, ProbeOutcome, Unit};
pub use probe::{InterfaceCounters, NetworkProber, Prober};
pub use report::{
    MetricReport, REPORT_ID_FORMAT, SessionReport, SessionSettings, is_report_id, report_id,
};
pub use scoring::{BandwidthBands, MAX_SCORE, Score, ScoreBreakdown, ScoringEngine, ThresholdBands, Tier};
pub use store::{LATEST, SessionStore, StoreError, encode_report};

use runner::{BenchmarkConfig, BenchmarkOrchestrator};

/// Runs one session against the real network with default scoring.
pub async fn run_benchmark(config: BenchmarkConfig) -> Result<SessionReport> {
    let orchestrator = BenchmarkOrchestrator::new(NetworkProber::new(config.upload_bytes));
    let session = orchestrator.run_session(&config).await?;
    Ok(SessionReport::from_session(&session))
}

pub fn compare_sessions(
    store: &SessionStore,
    before_id: &str,
    after_id: &str,
) -> std::result::Result<ComparisonResult, StoreError> {
    store.compare(before_id, after_id)
}
