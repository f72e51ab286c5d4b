use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use netgauge_http::{Error as HttpError, HttpClient, Transfer};

use crate::measurement::ProbeFailure;

/// Upload body of `len` bytes; a repeating pattern so it is not trivially compressible to zero.
pub(crate) fn payload(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>().into()
}

/// Downloads `url` into a private temp file and returns throughput in Mbps.
///
/// The temp file is removed when this future completes or is dropped.
pub(crate) async fn download(
    client: &HttpClient,
    url: &str,
    timeout: Duration,
    scratch_dir: Option<&Path>,
) -> Result<f64, ProbeFailure> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("netgauge-dl-");
    let scratch = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|err| ProbeFailure::unavailable(format!("scratch file: {err}")))?;

    let file = scratch
        .reopen()
        .map_err(|err| ProbeFailure::unavailable(format!("scratch file: {err}")))?;
    let mut sink = tokio::fs::File::from_std(file);

    let transfer = client
        .download(url, timeout, &mut sink)
        .await
        .map_err(from_http)?;

    drop(sink);
    drop(scratch);

    throughput(transfer)
}

pub(crate) async fn upload(
    client: &HttpClient,
    url: &str,
    body: Bytes,
    timeout: Duration,
) -> Result<f64, ProbeFailure> {
    let transfer = client.upload(url, body, timeout).await.map_err(from_http)?;
    throughput(transfer)
}

fn throughput(transfer: Transfer) -> Result<f64, ProbeFailure> {
    transfer
        .mbps()
        .ok_or_else(|| ProbeFailure::protocol("transfer moved no measurable data"))
}

fn from_http(err: HttpError) -> ProbeFailure {
    let message = format!("{}: {err}", err.transfer_error_kind());
    match err {
        HttpError::Timeout(after) => ProbeFailure::timeout(after),
        HttpError::Request(_) | HttpError::BodyRead(_) => ProbeFailure::transport(message),
        HttpError::Sink(_) => ProbeFailure::unavailable(message),
        HttpError::InvalidUrl(_)
        | HttpError::UnsupportedScheme(_)
        | HttpError::RequestBuild(_)
        | HttpError::Status(_) => ProbeFailure::protocol(message),
    }
}
