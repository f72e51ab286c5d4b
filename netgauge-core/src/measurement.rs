use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::Target;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    Dns,
    Latency,
    TcpConnect,
    Download,
    Upload,
    InterfaceStats,
}

impl MetricKind {
    #[must_use]
    pub fn unit(self) -> Unit {
        match self {
            Self::Dns | Self::TcpConnect => Unit::Seconds,
            Self::Latency => Unit::Milliseconds,
            Self::Download | Self::Upload => Unit::Mbps,
            Self::InterfaceStats => Unit::Percent,
        }
    }

    /// Response times and error rates improve downwards, bandwidth upwards.
    #[must_use]
    pub fn lower_is_better(self) -> bool {
        !matches!(self, Self::Download | Self::Upload)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dns => "DNS resolution",
            Self::Latency => "Latency",
            Self::TcpConnect => "TCP connect",
            Self::Download => "Download",
            Self::Upload => "Upload",
            Self::InterfaceStats => "Interface errors",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[strum(serialize = "s")]
    Seconds,
    #[strum(serialize = "ms")]
    Milliseconds,
    #[strum(serialize = "Mbps")]
    Mbps,
    #[strum(serialize = "%")]
    Percent,
}

impl Unit {
    /// Converts a time value in this unit to milliseconds; `None` for non-time units.
    #[must_use]
    pub fn to_millis(self, value: f64) -> Option<f64> {
        match self {
            Self::Seconds => Some(value * 1000.0),
            Self::Milliseconds => Some(value),
            Self::Mbps | Self::Percent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The probe did not finish inside its budget.
    Timeout,
    /// The network refused, reset or dropped the exchange.
    Transport,
    /// The peer answered, but not with a usable result.
    Protocol,
    /// This host cannot run the probe at all (missing tool, no such interface, local I/O).
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProbeFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(FailureKind::Timeout, format!("timed out after {after:?}"))
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Protocol, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable, message)
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success(f64),
    Failed(ProbeFailure),
}

/// Result of one probe. Not persisted; collectors reduce these into aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub kind: MetricKind,
    pub target: Target,
    pub outcome: ProbeOutcome,
    pub unit: Unit,
}

impl Measurement {
    /// A successful reading. Non-finite values are recorded as protocol failures.
    pub fn success(kind: MetricKind, target: Target, value: f64) -> Self {
        let outcome = if value.is_finite() {
            ProbeOutcome::Success(value)
        } else {
            ProbeOutcome::Failed(ProbeFailure::protocol(format!(
                "non-finite reading {value}"
            )))
        };

        Self {
            kind,
            target,
            outcome,
            unit: kind.unit(),
        }
    }

    pub fn failed(kind: MetricKind, target: Target, failure: ProbeFailure) -> Self {
        Self {
            kind,
            target,
            outcome: ProbeOutcome::Failed(failure),
            unit: kind.unit(),
        }
    }

    pub fn from_result(kind: MetricKind, target: Target, res: Result<f64, ProbeFailure>) -> Self {
        match res {
            Ok(value) => Self::success(kind, target, value),
            Err(failure) => Self::failed(kind, target, failure),
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match &self.outcome {
            ProbeOutcome::Success(v) => Some(*v),
            ProbeOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&ProbeFailure> {
        match &self.outcome {
            ProbeOutcome::Success(_) => None,
            ProbeOutcome::Failed(f) => Some(f),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success(_))
    }
}
