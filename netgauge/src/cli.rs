use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub(crate) fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))?;

    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        )),
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bar on stderr, tables on stdout.
    HumanReadable,
    /// Emit JSON lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "netgauge",
    author,
    version,
    about = "Network readiness benchmark with a 0-100 score",
    long_about = "netgauge measures DNS resolution, round-trip latency, TCP connect time and download/upload bandwidth against a catalog of public endpoints, then reduces them to a single 0-100 score and tier.\n\nEvery run is saved as a JSON report so later runs can be compared against it.",
    after_help = "Examples:\n  netgauge run\n  netgauge run --quick\n  netgauge run --duration 30s --concurrency 4 --output json\n  netgauge run --catalog endpoints.yaml --no-save\n  netgauge compare 20261018T101530.123Z latest\n\nDocs: https://github.com/nogcio/netgauge"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a benchmark session
    #[command(
        long_about = "Run one benchmark session, print the scored report and save it to the results directory.\n\nFlags override the defaults of the selected profile (`--quick` or the comprehensive default)."
    )]
    Run(RunArgs),

    /// Compare two stored reports
    Compare(CompareArgs),

    /// List stored reports
    List(StoreArgs),

    /// Print a stored report
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Directory holding saved reports
    #[arg(
        long,
        env = "NETGAUGE_RESULTS_DIR",
        default_value = "netgauge-results"
    )]
    pub results_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Session duration (e.g. 10s, 250ms, 1m)
    #[arg(long, env = "NETGAUGE_DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Number of parallel download streams
    #[arg(long, env = "NETGAUGE_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Short profile: 8s, 2 streams, no upload or interface checks
    #[arg(long)]
    pub quick: bool,

    /// Skip upload and interface error checks
    #[arg(long)]
    pub no_comprehensive: bool,

    /// Upper bound for a single probe (e.g. 5s)
    #[arg(long, value_parser = parse_duration)]
    pub probe_timeout: Option<Duration>,

    /// Size of the upload payload in bytes
    #[arg(long)]
    pub upload_bytes: Option<usize>,

    /// Endpoint catalog (YAML) replacing the built-in endpoints
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Print the report without saving it
    #[arg(long)]
    pub no_save: bool,

    /// Log probe failures (overridden by RUST_LOG)
    #[arg(long, short)]
    pub verbose: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Baseline report id (or `latest`)
    pub before: String,

    /// Report id to compare against the baseline (or `latest`)
    pub after: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Report id (or `latest`)
    #[arg(default_value = "latest")]
    pub id: String,

    #[command(flatten)]
    pub store: StoreArgs,
}
