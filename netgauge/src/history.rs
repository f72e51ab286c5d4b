use netgauge_core::SessionStore;

use crate::cli::{CompareArgs, ShowArgs, StoreArgs};
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub fn list(args: StoreArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);
    let store = SessionStore::new(&args.results_dir);

    let mut reports = Vec::new();
    for id in store.list()? {
        match store.load(&id) {
            Ok(report) => reports.push(report),
            Err(err) => tracing::warn!(%id, error = %err, "skipping unreadable report"),
        }
    }

    out.print_list(&reports).map_err(RunError::RuntimeError)?;
    Ok(ExitCode::Success)
}

pub fn show(args: ShowArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.store.output);
    let report = SessionStore::new(&args.store.results_dir).load(&args.id)?;

    out.print_report(&report).map_err(RunError::RuntimeError)?;
    Ok(ExitCode::Success)
}

pub fn compare(args: CompareArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.store.output);
    let store = SessionStore::new(&args.store.results_dir);
    let comparison = netgauge_core::compare_sessions(&store, &args.before, &args.after)?;

    out.print_comparison(&comparison)
        .map_err(RunError::RuntimeError)?;
    Ok(ExitCode::Success)
}
