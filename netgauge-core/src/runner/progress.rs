use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::Target;
use crate::measurement::{Measurement, MetricKind};
use crate::probe::Prober;

use super::gate::SessionGate;

/// Which concurrent unit produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitId {
    Collector(MetricKind),
    Stream(usize),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collector(kind) => write!(f, "collector:{kind}"),
            Self::Stream(id) => write!(f, "stream:{id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeEvent {
    pub unit: UnitId,
    pub measurement: Measurement,
    /// Time since the session started.
    pub elapsed: Duration,
    pub budget: Duration,
}

/// Called once per completed probe, from whichever task ran it. Must not block.
pub type ProgressFn = Arc<dyn Fn(ProbeEvent) + Send + Sync + 'static>;

/// Everything a collector or stream needs to run its probes.
pub struct UnitContext<P> {
    pub prober: Arc<P>,
    pub gate: Arc<SessionGate>,
    pub probe_timeout: Duration,
    pub progress: Option<ProgressFn>,
    started: Instant,
    budget: Duration,
}

// Manual impl: `P` itself need not be `Clone`.
impl<P> Clone for UnitContext<P> {
    fn clone(&self) -> Self {
        Self {
            prober: self.prober.clone(),
            gate: self.gate.clone(),
            probe_timeout: self.probe_timeout,
            progress: self.progress.clone(),
            started: self.started,
            budget: self.budget,
        }
    }
}

impl<P: Prober> UnitContext<P> {
    pub fn new(
        prober: Arc<P>,
        gate: Arc<SessionGate>,
        probe_timeout: Duration,
        progress: Option<ProgressFn>,
    ) -> Self {
        let started = Instant::now();
        let budget = gate.deadline().saturating_duration_since(started);
        Self {
            prober,
            gate,
            probe_timeout,
            progress,
            started,
            budget,
        }
    }

    pub(crate) async fn probe(&self, unit: UnitId, target: &Target, kind: MetricKind) -> Measurement {
        let measurement = self.prober.probe(target, kind, self.probe_timeout).await;

        if let Some(progress) = &self.progress {
            progress(ProbeEvent {
                unit,
                measurement: measurement.clone(),
                elapsed: self.started.elapsed(),
                budget: self.budget,
            });
        }

        measurement
    }
}
