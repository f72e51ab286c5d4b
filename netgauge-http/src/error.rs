use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TransferErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    RequestBuild,
    Request,
    Status,
    Timeout,
    BodyRead,
    Sink,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("only http:// and https:// URLs are supported: {0}")]
    UnsupportedScheme(String),

    #[error("http request build failed: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("http request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("http transfer timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    BodyRead(#[from] hyper::Error),

    #[error("failed to write response body: {0}")]
    Sink(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn transfer_error_kind(&self) -> TransferErrorKind {
        match self {
            Self::InvalidUrl(_) => TransferErrorKind::InvalidUrl,
            Self::UnsupportedScheme(_) => TransferErrorKind::UnsupportedScheme,
            Self::RequestBuild(_) => TransferErrorKind::RequestBuild,
            Self::Request(_) => TransferErrorKind::Request,
            Self::Status(_) => TransferErrorKind::Status,
            Self::Timeout(_) => TransferErrorKind::Timeout,
            Self::BodyRead(_) => TransferErrorKind::BodyRead,
            Self::Sink(_) => TransferErrorKind::Sink,
        }
    }

    /// True for failures that happened before any bytes hit the network.
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::UnsupportedScheme(_) | Self::RequestBuild(_)
        )
    }
}
