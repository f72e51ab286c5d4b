use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use netgauge_core::runner::{BenchmarkConfig, ProbeEvent, ProgressFn, UnitId};
use netgauge_core::{ComparisonResult, SessionReport};

mod format;
mod progress;
mod summary;

use format::{format_bytes, format_value};
use progress::HumanProgress;
use summary::{render_comparison, render_list, render_report};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, config: &BenchmarkConfig) {
        println!(
            "duration={} streams={} comprehensive={} probe_timeout={} upload={}",
            humantime::format_duration(config.duration),
            config.concurrency,
            config.comprehensive,
            humantime::format_duration(config.probe_timeout),
            format_bytes(config.upload_bytes as u64)
        );
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();
        let probes = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        Some(Arc::new(move |ev: ProbeEvent| {
            let probes_total = probes.fetch_add(1, Ordering::Relaxed) + 1;
            let failed_total = if ev.measurement.is_success() {
                failed.load(Ordering::Relaxed)
            } else {
                failed.fetch_add(1, Ordering::Relaxed) + 1
            };

            progress.update_session(
                ev.budget,
                ev.elapsed,
                format!("probes={probes_total} failed={failed_total}"),
            );

            if let UnitId::Stream(id) = ev.unit {
                let m = &ev.measurement;
                let status = match (m.value(), m.failure()) {
                    (Some(v), _) => format_value(v, m.unit),
                    (None, Some(f)) => format!("failed ({})", f.kind),
                    (None, None) => "n/a".to_string(),
                };
                progress.update_stream(id, format!("{} {status}", m.target));
            }
        }))
    }

    fn print_report(&self, report: &SessionReport) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render_report(report));
        Ok(())
    }

    fn print_saved(&self, path: &Path) {
        println!("saved: {}", path.display());
    }

    fn print_comparison(&self, comparison: &ComparisonResult) -> anyhow::Result<()> {
        print!("{}", render_comparison(comparison));
        Ok(())
    }

    fn print_list(&self, reports: &[SessionReport]) -> anyhow::Result<()> {
        print!("{}", render_list(reports));
        Ok(())
    }
}
