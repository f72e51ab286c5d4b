use std::path::Path;

use netgauge_core::runner::{BenchmarkConfig, ProgressFn};
use netgauge_core::{ComparisonResult, SessionReport};

use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, config: &BenchmarkConfig);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_report(&self, report: &SessionReport) -> anyhow::Result<()>;
    fn print_saved(&self, path: &Path);
    fn print_comparison(&self, comparison: &ComparisonResult) -> anyhow::Result<()>;
    fn print_list(&self, reports: &[SessionReport]) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
