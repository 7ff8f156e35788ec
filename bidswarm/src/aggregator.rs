//! Process-wide bid counters.
use crate::submit::Outcome;
use bidswarm_core::{LatencySummary, MetricsSnapshot};
use metrics_util::AtomicBucket;
use pdatastructs::tdigest::{TDigest, K1};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::error;

pub const BIDS_SUCCESS: &str = "bids_success";
pub const BIDS_FAILED: &str = "bids_failed";
pub const BID_LATENCY: &str = "bid_latency";
pub const LOGINS_FAILED: &str = "logins_failed";

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Commutative counters shared by every virtual user of a run.
///
/// Increments are lock-free; [`BidMetrics::snapshot`] is meant to be read once
/// after all users are done.
pub struct BidMetrics {
    success: AtomicU64,
    failed: AtomicU64,
    rate_ok: AtomicU64,
    rate_total: AtomicU64,
    logins_ok: AtomicU64,
    logins_failed: AtomicU64,
    latency: AtomicBucket<Duration>,
}

impl Default for BidMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BidMetrics {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rate_ok: AtomicU64::new(0),
            rate_total: AtomicU64::new(0),
            logins_ok: AtomicU64::new(0),
            logins_failed: AtomicU64::new(0),
            latency: AtomicBucket::new(),
        }
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(BIDS_SUCCESS).increment(1);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(BIDS_FAILED).increment(1);
    }

    /// Add one sample to the success rate.
    pub fn sample_ok(&self, ok: bool) {
        if ok {
            self.rate_ok.fetch_add(1, Ordering::Relaxed);
        }
        self.rate_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.latency.push(elapsed);
        #[cfg(feature = "metrics")]
        metrics::histogram!(BID_LATENCY).record(elapsed.as_secs_f64());
    }

    pub fn record_login(&self, ok: bool) {
        if ok {
            self.logins_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.logins_failed.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            metrics::counter!(LOGINS_FAILED).increment(1);
        }
    }

    /// Fold one completed bid attempt into the totals.
    pub fn record_bid(&self, outcome: &Outcome, elapsed: Duration) {
        let ok = outcome.is_success();
        if ok {
            self.record_success();
        } else {
            self.record_failure();
        }
        self.sample_ok(ok);
        self.record_latency(elapsed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let rate_ok = self.rate_ok.load(Ordering::Relaxed);
        let rate_total = self.rate_total.load(Ordering::Relaxed);
        let success_rate = if rate_total == 0 {
            0.
        } else {
            rate_ok as f64 / rate_total as f64
        };

        MetricsSnapshot {
            bids_success: self.success.load(Ordering::Relaxed),
            bids_failed: self.failed.load(Ordering::Relaxed),
            success_rate,
            logins_ok: self.logins_ok.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            latency: self.latency_summary(),
        }
    }

    fn latency_summary(&self) -> LatencySummary {
        let samples = self.latency.data();
        if samples.is_empty() {
            return LatencySummary::default();
        }

        let mut digest = TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE);
        for sample in samples {
            digest.insert(sample.as_secs_f64());
        }

        LatencySummary {
            p50: quantile(&digest, 0.5),
            p90: quantile(&digest, 0.9),
            p99: quantile(&digest, 0.99),
        }
    }
}

fn quantile(digest: &TDigest<K1>, quantile: f64) -> Duration {
    let secs = digest.quantile(quantile);

    // TDigest can hand back NaN for tiny sample sets.
    if secs.is_finite() && secs >= 0. {
        Duration::from_secs_f64(secs)
    } else {
        error!("Non-finite latency quantile {quantile}, reporting zero.");
        Duration::ZERO
    }
}
