pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`concurrency` must be a positive integer")]
    InvalidConcurrency,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("`probe_timeout` must be a positive duration")]
    InvalidProbeTimeout,

    #[error("`upload_bytes` must be a positive integer")]
    InvalidUploadBytes,

    #[error("endpoint catalog has nothing to probe")]
    EmptyCatalog,

    #[error("session launch failed: {0}")]
    Launch(String),
}

impl Error {
    /// True when the caller handed in a configuration that can never run.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Launch(_))
    }
}
