use mock_service::{Behavior, MockAuction};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_ADDR: &str = "0.0.0.0:3333";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mock_service=debug,tower_http=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let addr: SocketAddr = std::env::var("MOCK_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let mut behavior = Behavior::default();
    if let Ok(delay_ms) = std::env::var("MOCK_BID_DELAY_MS") {
        behavior = behavior.bid_delay(Duration::from_millis(delay_ms.parse()?));
    }
    if let Ok(tps) = std::env::var("MOCK_BID_TPS") {
        behavior = behavior.bid_tps_limit(tps.parse()?);
    }

    let state = Arc::new(MockAuction::new(behavior));
    tokio::spawn(tps_measure_task(state.clone()));

    tracing::info!("Mock auction listening on {addr}");
    mock_service::run(addr, state).await
}

/** TPS Printer **/

async fn tps_measure_task(state: Arc<MockAuction>) {
    let mut last = state.requests();
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let now = state.requests();
        if now != last {
            println!(
                "{} TPS ({} logins, {} bids)",
                now - last,
                state.total_logins(),
                state.bids().len()
            );
        }
        last = now;
    }
}
