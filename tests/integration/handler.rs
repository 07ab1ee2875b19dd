//! Request boundary over the mock fleet

use crate::mock_server::{settings, MockFleet};
use fleet_warmer::WarmupHandler;
use serde_json::json;

fn fixture_path() -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("fleet.yaml")
        .to_string_lossy()
        .to_string()
}

async fn serve_fixture_fleet(fleet_mock: &mut MockFleet) {
    fleet_mock.function("checkout", 2.0, settings("python3.12", 512)).await;
    fleet_mock.function("resizer", 3.0, settings("nodejs20.x", 1024)).await;
    fleet_mock.function("reports", 4.0, settings("dotnet8", 256)).await;
}

#[tokio::test]
async fn plan_action_returns_batches() {
    let mut fleet_mock = MockFleet::new().await;
    serve_fixture_fleet(&mut fleet_mock).await;

    let handler = WarmupHandler::new(fleet_mock.orchestrator());
    let envelope = handler
        .handle(json!({"action": "plan", "config": fixture_path()}))
        .await;

    assert!(envelope.is_success(), "{:?}", envelope.error);
    let data = envelope.data.unwrap();
    assert_eq!(data["global_max_concurrency"], json!(5));
    let batches = data["batches"].as_array().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0]["sum"], json!(5));
    // reports is capped by its own max_containers of 2.
    assert_eq!(batches[1]["entries"][0]["target"]["name"], json!("reports"));
    assert_eq!(batches[1]["entries"][0]["warm_count"], json!(2));
}

#[tokio::test]
async fn warm_up_action_reports_results() {
    let mut fleet_mock = MockFleet::new().await;
    serve_fixture_fleet(&mut fleet_mock).await;
    let checkout = fleet_mock.invocations("checkout", 200, 2).await;
    let resizer = fleet_mock.invocations("resizer", 200, 3).await;
    let reports = fleet_mock.invocations("reports", 200, 2).await;

    let handler = WarmupHandler::new(fleet_mock.orchestrator());
    let event = json!({"action": "warm_up", "config": fixture_path()});
    let envelope = handler.handle(event.clone()).await;

    checkout.assert_async().await;
    resizer.assert_async().await;
    reports.assert_async().await;

    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.original_request, event);
    let data = envelope.data.unwrap();
    assert_eq!(data["batches"], json!(2));
    assert_eq!(data["failed_calls"], json!(0));
    assert_eq!(data["warm_results"].as_array().unwrap().len(), 7);
    assert!(data["run_id"].as_str().is_some());
}

#[tokio::test]
async fn unknown_action_is_rejected_without_calls() {
    let mut fleet_mock = MockFleet::new().await;
    let checkout = fleet_mock.invocations("checkout", 200, 0).await;

    let handler = WarmupHandler::new(fleet_mock.orchestrator());
    let envelope = handler
        .handle(json!({"action": "cool_down", "config": fixture_path()}))
        .await;

    checkout.assert_async().await;
    assert_eq!(envelope.status, 500);
    let error = envelope.error.unwrap();
    assert_eq!(error.kind, "InvalidRequest");
    assert!(error.description.contains("warm_up"));
}
