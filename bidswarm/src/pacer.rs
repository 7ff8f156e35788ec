use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};

/// Suspend the calling user until `pace` has passed since `last_event`.
///
/// Returns immediately when there is no previous event, when `pace` is zero, or
/// when enough time has already gone by.
pub async fn wait_if_needed(last_event: Option<Instant>, pace: Duration) {
    if pace.is_zero() {
        return;
    }

    if let Some(last_event) = last_event {
        let ready_at = last_event + pace;
        if ready_at > Instant::now() {
            sleep_until(ready_at).await;
        }
    }
}

/// Sleep for a random duration below `max`. Used once after login so users
/// that started together drift apart.
pub async fn jitter(max: Duration) {
    if max.is_zero() {
        return;
    }

    let delay = rand::thread_rng().gen_range(Duration::ZERO..max);
    sleep(delay).await;
}

/// Minimum spacing between the bids of a single virtual user.
#[derive(Debug)]
pub struct Pacer {
    pace: Duration,
    last_event: Option<Instant>,
}

impl Pacer {
    pub fn new(pace: Duration) -> Self {
        Self {
            pace,
            last_event: None,
        }
    }

    pub async fn wait(&self) {
        wait_if_needed(self.last_event, self.pace).await;
    }

    /// Record that a bid just completed.
    pub fn mark(&mut self) {
        self.last_event = Some(Instant::now());
    }

    pub fn last_event(&self) -> Option<Instant> {
        self.last_event
    }
}
