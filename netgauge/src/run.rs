use netgauge_core::runner::{BenchmarkConfig, BenchmarkOrchestrator};
use netgauge_core::{NetworkProber, SessionReport, SessionStore};

use crate::catalog_yaml;
use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.store.output);
    let config = run_config(&args).await?;
    out.print_header(&config);

    let mut orchestrator = BenchmarkOrchestrator::new(NetworkProber::new(config.upload_bytes));
    if let Some(progress) = out.progress() {
        orchestrator = orchestrator.with_progress(progress);
    }

    let cancel = orchestrator.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after in-flight probes");
            cancel.cancel();
        }
    });

    let session = orchestrator.run_session(&config).await;
    interrupt.abort();
    let session = session?;

    let report = SessionReport::from_session(&session);
    out.print_report(&report).map_err(RunError::RuntimeError)?;

    if args.no_save {
        return Ok(ExitCode::Success);
    }

    let store = SessionStore::new(&args.store.results_dir);
    match store.save(&report) {
        Ok(path) => {
            out.print_saved(&path);
            Ok(ExitCode::Success)
        }
        Err(err) => {
            tracing::warn!(error = %err, dir = %store.dir().display(), "report not saved");
            eprintln!("failed to save report: {err}");
            Ok(ExitCode::PersistenceFailed)
        }
    }
}

/// Profile defaults, then flags, then the catalog file.
async fn run_config(args: &RunArgs) -> Result<BenchmarkConfig, RunError> {
    let mut config = if args.quick {
        BenchmarkConfig::quick()
    } else {
        BenchmarkConfig::default()
    };

    if let Some(duration) = args.duration {
        config.duration = duration;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.no_comprehensive {
        config.comprehensive = false;
    }
    if let Some(timeout) = args.probe_timeout {
        config.probe_timeout = timeout;
    }
    if let Some(bytes) = args.upload_bytes {
        config.upload_bytes = bytes;
    }
    if let Some(path) = &args.catalog {
        let catalog = catalog_yaml::load(path)
            .await
            .map_err(|err| RunError::InvalidInput(err.into()))?;
        config = config.with_catalog(catalog);
    }

    config.validate()?;
    Ok(config)
}
