use std::time::Duration;

/// Payload bytes moved by one transfer and the wall time it took, request to last body byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl Transfer {
    /// Throughput in megabits per second (`bits / seconds / 1e6`).
    ///
    /// `None` when nothing was transferred or no measurable time elapsed.
    #[must_use]
    pub fn mbps(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if self.bytes == 0 || secs <= 0.0 {
            return None;
        }

        let bits = (self.bytes as f64) * 8.0;
        Some(bits / secs / 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mbps_is_bits_over_seconds() {
        let t = Transfer {
            bytes: 1_250_000,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(t.mbps(), Some(10.0));
    }

    #[test]
    fn mbps_is_none_without_payload_or_time() {
        let empty = Transfer {
            bytes: 0,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(empty.mbps(), None);

        let instant = Transfer {
            bytes: 10,
            elapsed: Duration::ZERO,
        };
        assert_eq!(instant.mbps(), None);
    }
}
