use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMicroSeconds};
use std::fmt;
use std::time::Duration;

/// Aggregated outcome of a run, read once every virtual user has finished.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub bids_success: u64,
    pub bids_failed: u64,
    /// Share of bid attempts that were accepted. `0.0` when nothing was sent.
    pub success_rate: f64,
    pub logins_ok: u64,
    pub logins_failed: u64,
    pub latency: LatencySummary,
}

impl MetricsSnapshot {
    pub fn bids_total(&self) -> u64 {
        self.bids_success + self.bids_failed
    }
}

/// Bid round-trip latency quantiles.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySummary {
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub p50: Duration,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub p90: Duration,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub p99: Duration,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bids ok={}, failed={}, rate={:.2}; logins ok={}, failed={}; p50={:?}, p90={:?}, p99={:?}",
            self.bids_success,
            self.bids_failed,
            self.success_rate,
            self.logins_ok,
            self.logins_failed,
            self.latency.p50,
            self.latency.p90,
            self.latency.p99,
        )
    }
}
