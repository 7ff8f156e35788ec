//! The hand-off to whatever renders results.
use crate::driver::{DriverState, UserReport};
use bidswarm_core::{BidConfig, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUMMARY_FILE: &str = "summary.json";

/// How the virtual users of a run ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub done: u32,
    /// Stopped after a failed login.
    pub aborted: u32,
    /// Cut off by the run deadline.
    pub interrupted: u32,
}

impl UserCounts {
    pub fn record(&mut self, report: &UserReport) {
        match report.state {
            DriverState::Done => self.done += 1,
            DriverState::Aborted => self.aborted += 1,
            _ => self.interrupted += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.done + self.aborted + self.interrupted
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub config: BidConfig,
    pub snapshot: MetricsSnapshot,
    pub users: UserCounts,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub elapsed: Duration,
    pub deadline_hit: bool,
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON export into `dir`, creating it if needed.
    pub fn write_json(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(SUMMARY_FILE);
        fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = &self.snapshot;
        writeln!(f, "{}", self.config)?;
        writeln!(f)?;
        writeln!(
            f,
            "elapsed     {}{}",
            humantime::format_duration(round_millis(self.elapsed)),
            if self.deadline_hit { " (deadline hit)" } else { "" }
        )?;
        writeln!(
            f,
            "users       {} done, {} aborted, {} interrupted",
            self.users.done, self.users.aborted, self.users.interrupted
        )?;
        writeln!(
            f,
            "logins      {} ok, {} failed",
            snapshot.logins_ok, snapshot.logins_failed
        )?;
        writeln!(
            f,
            "bids        {} ok, {} failed ({:.2}% accepted)",
            snapshot.bids_success,
            snapshot.bids_failed,
            snapshot.success_rate * 100.
        )?;
        write!(
            f,
            "latency     p50={:?} p90={:?} p99={:?}",
            snapshot.latency.p50, snapshot.latency.p90, snapshot.latency.p99
        )
    }
}

fn round_millis(dur: Duration) -> Duration {
    Duration::from_millis(dur.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            config: BidConfig::new("http://mock").auction_id(42).users(3),
            snapshot: MetricsSnapshot {
                bids_success: 5,
                bids_failed: 1,
                success_rate: 5. / 6.,
                logins_ok: 3,
                logins_failed: 0,
                ..Default::default()
            },
            users: UserCounts {
                done: 3,
                aborted: 0,
                interrupted: 0,
            },
            elapsed: Duration::from_millis(1_234),
            deadline_hit: false,
        }
    }

    #[test]
    fn summary_mentions_totals() {
        let text = report().to_string();
        assert!(text.contains("auction     42"), "{text}");
        assert!(text.contains("3 done, 0 aborted, 0 interrupted"), "{text}");
        assert!(text.contains("5 ok, 1 failed (83.33% accepted)"), "{text}");
        assert!(text.contains("1s 234ms"), "{text}");
    }

    #[test]
    fn json_export_round_trips_totals() {
        let dir = std::env::temp_dir().join(format!("bidswarm-report-{}", std::process::id()));
        let path = report().write_json(&dir).unwrap();
        assert_eq!(path.file_name().unwrap(), SUMMARY_FILE);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["snapshot"]["bids_success"], 5);
        assert_eq!(json["users"]["done"], 3);
        assert_eq!(json["elapsed"], 1_234);
        assert_eq!(json["config"]["auction_id"], 42);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unfinished_states_count_as_interrupted() {
        let mut users = UserCounts::default();
        for state in [DriverState::Done, DriverState::Aborted, DriverState::Bidding] {
            users.record(&UserReport {
                ordinal: 1,
                login: None,
                state,
                bids_sent: 0,
            });
        }
        assert_eq!(users.total(), 3);
        assert_eq!(users.interrupted, 1);
    }
}
