use crate::catalog::Target;
use crate::measurement::{MetricKind, Unit};
use crate::probe::Prober;

use super::progress::{UnitContext, UnitId};

/// Mean of the successful probes of one metric kind within a session.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetric {
    pub kind: MetricKind,
    pub sample_count: u64,
    pub attempted: u64,
    pub mean: Option<f64>,
    pub unit: Unit,
}

impl AggregatedMetric {
    /// Reduces `values` to their mean, ignoring non-finite entries.
    pub fn from_values(kind: MetricKind, attempted: u64, values: impl IntoIterator<Item = f64>) -> Self {
        let mut sum = 0.0;
        let mut count = 0u64;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            sum += v;
            count += 1;
        }

        Self {
            kind,
            sample_count: count,
            attempted: attempted.max(count),
            mean: (count > 0).then(|| sum / count as f64),
            unit: kind.unit(),
        }
    }

    /// A unit that never reported (not launched, panicked, or aborted at the ceiling).
    pub fn absent(kind: MetricKind) -> Self {
        Self::from_values(kind, 0, std::iter::empty())
    }

    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.sample_count == 0
    }
}

/// Probes each target once, in order, until the list ends or the gate closes.
pub async fn collect<P: Prober>(
    ctx: &UnitContext<P>,
    targets: &[Target],
    kind: MetricKind,
) -> AggregatedMetric {
    let unit = UnitId::Collector(kind);
    let mut attempted = 0u64;
    let mut values = Vec::with_capacity(targets.len());

    for target in targets {
        if !ctx.gate.next() {
            tracing::debug!(%unit, attempted, "gate closed, collector stops early");
            break;
        }

        attempted += 1;
        if let Some(v) = ctx.probe(unit, target, kind).await.value() {
            values.push(v);
        }
    }

    let metric = AggregatedMetric::from_values(kind, attempted, values);
    if metric.all_failed() && attempted > 0 {
        tracing::debug!(%unit, attempted, "every probe failed");
    }
    metric
}
