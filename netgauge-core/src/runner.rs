mod collector;
mod config;
mod gate;
mod orchestrator;
mod progress;
mod session;
mod stream;

pub use collector::{AggregatedMetric, collect};
pub use config::{BenchmarkConfig, DEFAULT_UPLOAD_BYTES};
pub use gate::{CancelHandle, SessionGate};
pub use orchestrator::BenchmarkOrchestrator;
pub use progress::{ProbeEvent, ProgressFn, UnitContext, UnitId};
pub use session::BenchmarkSession;
pub use stream::{FAILURE_BACKOFF, WorkerResult, merge_worker_results, run_stream};
