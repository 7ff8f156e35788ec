use bidswarm_core::BidConfig;
use mock_service::{Behavior, MockAuction};
use std::sync::{Arc, OnceLock};
use tracing_subscriber::FmtSubscriber;

pub const AUCTION_ID: i64 = 42;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter("bidswarm=debug,mock_service=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Start a mock auction and point a config at it.
#[allow(unused)]
pub async fn mock(behavior: Behavior) -> (BidConfig, Arc<MockAuction>) {
    init();
    let (addr, state) = mock_service::spawn(behavior)
        .await
        .expect("mock auction failed to start");

    let config = BidConfig::new(&format!("http://{addr}"))
        .auction_id(AUCTION_ID)
        .without_delays();
    (config, state)
}
