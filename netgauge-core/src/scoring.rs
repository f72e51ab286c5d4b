use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::measurement::MetricKind;
use crate::runner::AggregatedMetric;

pub const MAX_SCORE: u32 = 100;

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
)]
pub enum Tier {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    #[strum(serialize = "Very Good")]
    VeryGood,
    Excellent,
    #[serde(rename = "Enterprise-Grade")]
    #[strum(serialize = "Enterprise-Grade")]
    EnterpriseGrade,
}

impl Tier {
    /// Lower bounds are inclusive.
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::EnterpriseGrade,
            75..=89 => Self::Excellent,
            60..=74 => Self::VeryGood,
            45..=59 => Self::Good,
            30..=44 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

/// Points for a time-like metric: the first band whose limit the value stays strictly under.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBands {
    /// `(upper limit in milliseconds, points)`, ascending by limit.
    pub bands: Vec<(f64, u32)>,
    pub cap: u32,
}

impl ThresholdBands {
    pub fn new(bands: Vec<(f64, u32)>, cap: u32) -> Self {
        Self { bands, cap }
    }

    #[must_use]
    pub fn points(&self, value_ms: f64) -> u32 {
        self.bands
            .iter()
            .find(|(limit, _)| value_ms < *limit)
            .map_or(0, |(_, points)| *points)
            .min(self.cap)
    }

    pub fn dns() -> Self {
        Self::new(vec![(50.0, 15), (100.0, 10), (200.0, 5)], 15)
    }

    pub fn latency() -> Self {
        Self::new(vec![(20.0, 20), (50.0, 15), (100.0, 10)], 20)
    }

    pub fn tcp_connect() -> Self {
        Self::new(vec![(100.0, 15), (300.0, 10), (500.0, 5)], 15)
    }
}

/// Points for the merged download figure: the first band whose floor the value reaches.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthBands {
    /// `(minimum Mbps, points)`, descending by minimum.
    pub bands: Vec<(f64, u32)>,
    pub cap: u32,
}

impl Default for BandwidthBands {
    fn default() -> Self {
        Self {
            bands: vec![
                (1000.0, 50),
                (500.0, 45),
                (250.0, 40),
                (100.0, 35),
                (50.0, 25),
                (25.0, 20),
                (10.0, 15),
                (5.0, 10),
                (1.0, 5),
            ],
            cap: 50,
        }
    }
}

impl BandwidthBands {
    #[must_use]
    pub fn points(&self, mbps: f64) -> u32 {
        self.bands
            .iter()
            .find(|(floor, _)| mbps >= *floor)
            .map_or(0, |(_, points)| *points)
            .min(self.cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub dns: u32,
    pub latency: u32,
    pub tcp_connect: u32,
    pub bandwidth: u32,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.dns
            .saturating_add(self.latency)
            .saturating_add(self.tcp_connect)
            .saturating_add(self.bandwidth)
            .min(MAX_SCORE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub total: u32,
    pub tier: Tier,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringEngine {
    pub dns: ThresholdBands,
    pub latency: ThresholdBands,
    pub tcp_connect: ThresholdBands,
    pub bandwidth: BandwidthBands,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            dns: ThresholdBands::dns(),
            latency: ThresholdBands::latency(),
            tcp_connect: ThresholdBands::tcp_connect(),
            bandwidth: BandwidthBands::default(),
        }
    }
}

impl ScoringEngine {
    pub fn with_bandwidth_bands(mut self, bands: BandwidthBands) -> Self {
        self.bandwidth = bands;
        self
    }

    /// Missing or all-failed metrics contribute 0.
    #[must_use]
    pub fn score(&self, metrics: &BTreeMap<MetricKind, AggregatedMetric>) -> Score {
        let millis = |kind: MetricKind| {
            metrics
                .get(&kind)
                .and_then(|m| m.mean)
                .and_then(|v| kind.unit().to_millis(v))
        };

        let breakdown = ScoreBreakdown {
            dns: millis(MetricKind::Dns).map_or(0, |v| self.dns.points(v)),
            latency: millis(MetricKind::Latency).map_or(0, |v| self.latency.points(v)),
            tcp_connect: millis(MetricKind::TcpConnect).map_or(0, |v| self.tcp_connect.points(v)),
            bandwidth: metrics
                .get(&MetricKind::Download)
                .and_then(|m| m.mean)
                .map_or(0, |v| self.bandwidth.points(v)),
        };

        let total = breakdown.total();
        Score {
            total,
            tier: Tier::from_score(total),
            breakdown,
        }
    }
}
