mod utils;
use utils::*;

use bidswarm::prelude::*;
use mock_service::{Behavior, RecordedBid, StatusCode};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn three_users_two_bids_each() {
    let (config, mock) = mock(Behavior::default()).await;

    let report = Run::new(config.users(3), ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_success, 6);
    assert_eq!(report.snapshot.bids_failed, 0);
    assert_eq!(report.snapshot.success_rate, 1.0);
    assert_eq!(report.users.done, 3);
    assert_eq!(mock.bids().len(), 6);
    for ordinal in 1..=3 {
        let email = format!("k6buyer00{ordinal}@example.com");
        assert_eq!(mock.logins_for(&email), 1);
        assert_eq!(mock.bids_for(&email), 2);
    }
}

#[tokio::test]
async fn rejected_login_contributes_nothing() {
    let behavior = Behavior::default().reject_login("k6buyer001@example.com");
    let (config, mock) = mock(behavior).await;
    let sink = RecordingSink::new();

    let report = Run::new(config.users(2), ReqwestTransport::new())
        .sink(Arc::new(sink.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_success, 2);
    assert_eq!(report.snapshot.bids_failed, 0);
    assert_eq!(report.users.aborted, 1);
    assert_eq!(mock.logins_for("k6buyer001@example.com"), 1);
    assert_eq!(mock.bids_for("k6buyer001@example.com"), 0);
    assert_eq!(mock.bids_for("k6buyer002@example.com"), 2);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, Some(401));
    assert!(events[0]
        .body
        .as_deref()
        .unwrap_or_default()
        .contains("Email atau password salah"));
}

#[tokio::test]
async fn one_login_per_user_regardless_of_iterations() {
    let (config, mock) = mock(Behavior::default()).await;

    let report = Run::new(config.users(5).iterations(4), ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_success, 20);
    assert_eq!(mock.total_logins(), 5);
}

#[tokio::test]
async fn identities_cycle_through_the_pool() {
    let (mut config, mock) = mock(Behavior::default()).await;
    config = config.users(150).iterations(1);
    config.index_min = 1;
    config.index_max = Some(100);

    let report = Run::new(config, ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_success, 150);
    assert_eq!(mock.total_logins(), 150);
    assert_eq!(mock.logins_for("k6buyer001@example.com"), 2);
    assert_eq!(mock.logins_for("k6buyer050@example.com"), 2);
    assert_eq!(mock.logins_for("k6buyer051@example.com"), 1);
    assert_eq!(mock.logins_for("k6buyer100@example.com"), 1);
}

#[tokio::test]
async fn bids_stay_on_the_grid() {
    let (config, mock) = mock(Behavior::default()).await;
    let config = config
        .users(4)
        .iterations(5)
        .bids(BidRange::new(1_100, 9_000, 250));

    Run::new(config, ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    let bids: Vec<RecordedBid> = mock.bids();
    assert_eq!(bids.len(), 20);
    for bid in bids {
        assert_eq!(bid.auction_id, AUCTION_ID);
        assert!((1_250..=9_000).contains(&bid.amount), "{}", bid.amount);
        assert_eq!(bid.amount % 250, 0);
    }
}

#[tokio::test]
async fn empty_bid_grid_clamps_upwards() {
    let (config, mock) = mock(Behavior::default()).await;
    let config = config.users(2).bids(BidRange::new(300, 310, 250));

    Run::new(config, ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    assert!(mock.bids().iter().all(|bid| bid.amount == 500));
}

#[tokio::test]
async fn server_errors_are_failures() {
    let behavior = Behavior::default().bid_status(StatusCode::INTERNAL_SERVER_ERROR);
    let (config, _mock) = mock(behavior).await;
    let sink = RecordingSink::new();

    let report = Run::new(config.users(2), ReqwestTransport::new())
        .sink(Arc::new(sink.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_failed, 4);
    assert_eq!(report.snapshot.bids_success, 0);
    assert_eq!(report.snapshot.success_rate, 0.);

    let events = sink.events();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.status == Some(500)));
    assert!(events
        .iter()
        .all(|e| e.body.as_deref().unwrap_or_default().contains("Penawaran")));
}

#[tokio::test]
async fn slow_bids_time_out() {
    let behavior = Behavior::default().bid_delay(Duration::from_secs(2));
    let (mut config, _mock) = mock(behavior).await;
    config = config.users(2).iterations(1);
    config.request_timeout = Duration::from_millis(200);
    let sink = RecordingSink::new();

    let report = Run::new(config, ReqwestTransport::new())
        .sink(Arc::new(sink.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_failed, 2);
    let events = sink.events();
    assert!(events
        .iter()
        .all(|e| e.status.is_none() && e.error.contains("timed out")));
}

#[tokio::test]
async fn deadline_interrupts_the_run() {
    let behavior = Behavior::default().bid_delay(Duration::from_secs(10));
    let (mut config, mock) = mock(behavior).await;
    config = config.users(3);
    config.max_duration = Duration::from_millis(500);

    let report = Run::new(config, ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    assert!(report.deadline_hit);
    assert_eq!(report.users.interrupted, 3);
    assert_eq!(report.snapshot.bids_total(), 0);
    assert_eq!(mock.total_logins(), 3);
    assert!(report.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn missing_auction_id_sends_nothing() {
    let (mut config, mock) = mock(Behavior::default()).await;
    config.auction_id = None;

    let err = Run::new(config, ReqwestTransport::new())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err, ConfigError::MissingAuctionId);
    assert_eq!(mock.requests(), 0);
}

#[tokio::test]
async fn throttled_bids_are_failures() {
    let (config, _mock) = mock(Behavior::default().bid_tps_limit(NonZeroU32::MIN)).await;

    let report = Run::new(config.users(5).iterations(1), ReqwestTransport::new())
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_total(), 5);
    assert!(report.snapshot.bids_success >= 1);
    assert!(report.snapshot.bids_failed >= 1);
}
