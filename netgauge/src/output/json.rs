use serde::Serialize;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use netgauge_core::runner::{BenchmarkConfig, ProbeEvent, ProgressFn};
use netgauge_core::{ComparisonResult, SessionReport, Tier};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _config: &BenchmarkConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |ev: ProbeEvent| {
            let line = build_progress_line(&ev);
            emit_json_line(&line);
        }))
    }

    fn print_report(&self, report: &SessionReport) -> anyhow::Result<()> {
        emit_json_line(&Tagged {
            kind: "report",
            body: report,
        });
        Ok(())
    }

    fn print_saved(&self, path: &Path) {
        emit_json_line(&JsonSavedLine {
            kind: "saved",
            path: path.display().to_string(),
        });
    }

    fn print_comparison(&self, comparison: &ComparisonResult) -> anyhow::Result<()> {
        emit_json_line(&Tagged {
            kind: "comparison",
            body: comparison,
        });
        Ok(())
    }

    fn print_list(&self, reports: &[SessionReport]) -> anyhow::Result<()> {
        emit_json_line(&JsonListLine {
            kind: "list",
            reports: reports
                .iter()
                .map(|r| JsonListEntry {
                    id: &r.id,
                    score: r.score,
                    classification: r.classification,
                })
                .collect(),
        });
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub elapsed_ms: u64,
    pub budget_ms: u64,
    pub source: String,
    pub metric: String,
    pub target: String,
    pub value: Option<f64>,
    pub unit: String,
    pub failure: Option<JsonFailure>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonFailure {
    pub kind: String,
    pub message: String,
}

fn build_progress_line(ev: &ProbeEvent) -> JsonProgressLine {
    let m = &ev.measurement;
    JsonProgressLine {
        kind: "progress",
        elapsed_ms: ev.elapsed.as_millis() as u64,
        budget_ms: ev.budget.as_millis() as u64,
        source: ev.unit.to_string(),
        metric: m.kind.to_string(),
        target: m.target.to_string(),
        value: m.value(),
        unit: m.unit.to_string(),
        failure: m.failure().map(|f| JsonFailure {
            kind: f.kind.to_string(),
            message: f.message.clone(),
        }),
    }
}

/// A payload with a `kind` discriminator merged into its top-level object.
#[derive(Debug, Serialize)]
struct Tagged<'a, T> {
    kind: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Debug, Serialize)]
struct JsonSavedLine {
    kind: &'static str,
    path: String,
}

#[derive(Debug, Serialize)]
struct JsonListLine<'a> {
    kind: &'static str,
    reports: Vec<JsonListEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonListEntry<'a> {
    id: &'a str,
    score: u32,
    classification: Tier,
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
