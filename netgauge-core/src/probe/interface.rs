use sysinfo::Networks;

use crate::catalog::Target;
use crate::measurement::ProbeFailure;

/// Packet and error counters of one interface, accumulated by the OS since boot.
///
/// Samples are absolute totals, not deltas over a session. Two reports taken minutes apart
/// therefore show nearly the same rate unless the interface was reset in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceCounters {
    pub packets_received: u64,
    pub packets_transmitted: u64,
    pub errors_received: u64,
    pub errors_transmitted: u64,
}

impl InterfaceCounters {
    /// Receive plus transmit errors over packets since boot, in percent.
    ///
    /// An interface that has never carried a packet reports 0 unless it has logged errors.
    #[must_use]
    pub fn error_rate_percent(&self) -> f64 {
        let packets = self
            .packets_received
            .saturating_add(self.packets_transmitted);
        let errors = self.errors_received.saturating_add(self.errors_transmitted);

        if packets == 0 {
            return if errors == 0 { 0.0 } else { 100.0 };
        }

        (errors as f64 * 100.0 / packets as f64).min(100.0)
    }
}

pub(crate) fn counters(name: &str) -> Option<InterfaceCounters> {
    let networks = Networks::new_with_refreshed_list();
    networks.list().get(name).map(|data| InterfaceCounters {
        packets_received: data.total_packets_received(),
        packets_transmitted: data.total_packets_transmitted(),
        errors_received: data.total_errors_on_received(),
        errors_transmitted: data.total_errors_on_transmitted(),
    })
}

/// Reads `name`'s counters on the blocking pool; sysinfo walks the OS tables synchronously.
pub(crate) async fn sample(name: String) -> Result<InterfaceCounters, ProbeFailure> {
    let counters = tokio::task::spawn_blocking({
        let name = name.clone();
        move || counters(&name)
    })
    .await
    .map_err(|err| ProbeFailure::unavailable(format!("interface sampling failed: {err}")))?;

    counters.ok_or_else(|| ProbeFailure::unavailable(format!("no such interface `{name}`")))
}

pub(crate) fn discover() -> Vec<Target> {
    let networks = Networks::new_with_refreshed_list();
    let mut names: Vec<&String> = networks
        .list()
        .keys()
        .filter(|name| !is_loopback(name))
        .collect();
    names.sort();

    names.into_iter().map(|n| Target::interface(n.clone())).collect()
}

pub(crate) fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.starts_with("Loopback")
}
