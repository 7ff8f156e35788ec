mod utils;
use utils::*;

use bidswarm_runtime::BidswarmRuntime;
use mock_service::Behavior;

#[tokio::test]
async fn runtime_writes_json_summary() {
    let (config, mock) = mock(Behavior::default()).await;
    let dir = std::env::temp_dir().join(format!("bidswarm-runtime-{}", std::process::id()));

    let report = BidswarmRuntime::new(config.users(2))
        .report_dir(&dir)
        .run()
        .await
        .unwrap();

    assert_eq!(report.snapshot.bids_success, 4);
    assert_eq!(mock.bids().len(), 4);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(json["snapshot"]["bids_success"], 4);
    assert_eq!(json["config"]["auction_id"], AUCTION_ID);

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn runtime_refuses_invalid_config() {
    let (mut config, mock) = mock(Behavior::default()).await;
    config.auction_id = Some(-7);

    let err = BidswarmRuntime::new(config).run().await.unwrap_err();

    assert!(format!("{err:#}").contains("auction id must be positive"));
    assert_eq!(mock.requests(), 0);
}
