use serde::{Deserialize, Serialize};

use crate::measurement::{MetricKind, Unit};
use crate::report::SessionReport;

/// Compared in this order; rows missing on either side are left out.
const COMPARED: [MetricKind; 6] = [
    MetricKind::Latency,
    MetricKind::Dns,
    MetricKind::TcpConnect,
    MetricKind::Download,
    MetricKind::Upload,
    MetricKind::InterfaceStats,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparisonStatus {
    Improved,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: MetricKind,
    pub unit: Unit,
    pub before_value: f64,
    pub after_value: f64,
    pub percent_improvement: f64,
    pub status: ComparisonStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub before_id: String,
    pub after_id: String,
    pub before_score: u32,
    pub after_score: u32,
    pub metrics: Vec<MetricComparison>,
    /// Mean of the row percentages; 0 when no row could be compared.
    pub overall_improvement: f64,
}

impl ComparisonResult {
    #[must_use]
    pub fn score_delta(&self) -> i64 {
        i64::from(self.after_score) - i64::from(self.before_score)
    }
}

/// Signed change in percent, positive when `after` is better.
///
/// A zero baseline has no meaningful ratio and reports 0.
#[must_use]
pub fn percent_improvement(before: f64, after: f64, lower_is_better: bool) -> f64 {
    if before == 0.0 {
        return 0.0;
    }

    if lower_is_better {
        (before - after) / before * 100.0
    } else {
        (after - before) / before * 100.0
    }
}

#[must_use]
pub fn compare(before: &SessionReport, after: &SessionReport) -> ComparisonResult {
    let metrics: Vec<MetricComparison> = COMPARED
        .iter()
        .filter_map(|&kind| {
            let before_value = before.metric_value(kind)?;
            let after_value = after.metric_value(kind)?;
            let pct = percent_improvement(before_value, after_value, kind.lower_is_better());

            Some(MetricComparison {
                metric: kind,
                unit: kind.unit(),
                before_value,
                after_value,
                percent_improvement: pct,
                status: if pct > 0.0 {
                    ComparisonStatus::Improved
                } else {
                    ComparisonStatus::Degraded
                },
            })
        })
        .collect();

    let overall_improvement = if metrics.is_empty() {
        0.0
    } else {
        metrics.iter().map(|m| m.percent_improvement).sum::<f64>() / metrics.len() as f64
    };

    ComparisonResult {
        before_id: before.id.clone(),
        after_id: after.id.clone(),
        before_score: before.score,
        after_score: after.score,
        metrics,
        overall_improvement,
    }
}
