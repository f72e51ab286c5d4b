use std::time::Duration;

use crate::catalog::EndpointCatalog;
use crate::error::{Error, Result};

pub const DEFAULT_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    /// Wall-clock budget after which no unit starts another probe.
    pub duration: Duration,
    /// Number of parallel download streams.
    pub concurrency: usize,
    /// Adds the upload and interface-error collectors.
    pub comprehensive: bool,
    pub probe_timeout: Duration,
    pub upload_bytes: usize,
    pub catalog: EndpointCatalog,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(15),
            concurrency: 3,
            comprehensive: true,
            probe_timeout: Duration::from_secs(5),
            upload_bytes: DEFAULT_UPLOAD_BYTES,
            catalog: EndpointCatalog::builtin(),
        }
    }
}

impl BenchmarkConfig {
    /// Short readiness-check profile.
    pub fn quick() -> Self {
        Self {
            duration: Duration::from_secs(8),
            concurrency: 2,
            comprehensive: false,
            ..Self::default()
        }
    }

    pub fn with_catalog(mut self, catalog: EndpointCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConcurrency);
        }
        if self.duration.is_zero() {
            return Err(Error::InvalidDuration);
        }
        if self.probe_timeout.is_zero() {
            return Err(Error::InvalidProbeTimeout);
        }
        if self.upload_bytes == 0 {
            return Err(Error::InvalidUploadBytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_quick_profile() {
        let full = BenchmarkConfig::default();
        assert_eq!(full.duration, Duration::from_secs(15));
        assert_eq!(full.concurrency, 3);
        assert!(full.comprehensive);

        let quick = BenchmarkConfig::quick();
        assert_eq!(quick.duration, Duration::from_secs(8));
        assert_eq!(quick.concurrency, 2);
        assert!(!quick.comprehensive);
        assert_eq!(quick.probe_timeout, full.probe_timeout);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        assert!(BenchmarkConfig::default().validate().is_ok());

        let cfg = BenchmarkConfig {
            concurrency: 0,
            ..BenchmarkConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConcurrency)));

        let cfg = BenchmarkConfig {
            duration: Duration::ZERO,
            ..BenchmarkConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidDuration)));

        let cfg = BenchmarkConfig {
            probe_timeout: Duration::ZERO,
            ..BenchmarkConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidProbeTimeout)));

        let cfg = BenchmarkConfig {
            upload_bytes: 0,
            ..BenchmarkConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidUploadBytes)));
    }
}
