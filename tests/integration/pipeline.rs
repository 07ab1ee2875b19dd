//! End-to-end warm-up runs over HTTP

use crate::mock_server::{settings, MockFleet};
use fleet_warmer::{ErrorKind, FleetConfig};
use mockito::Matcher;
use serde_json::json;

fn fleet(max_concurrency: u32, functions: serde_json::Value) -> FleetConfig {
    FleetConfig::from_value(json!({
        "default": {
            "region": "us-east-1",
            "scaling": {"max_concurrency": max_concurrency, "min_containers": 1, "max_containers": 10},
            "warm_payload": {"source": "fleet-warmer"},
        },
        "lambda_functions": functions,
    }))
    .expect("valid fleet")
}

#[tokio::test]
async fn single_failed_call_is_excluded() {
    let mut fleet_mock = MockFleet::new().await;
    fleet_mock.function("checkout", 3.0, settings("python3.12", 512)).await;
    fleet_mock.function("resizer", 2.0, settings("nodejs20.x", 1024)).await;
    fleet_mock.function("reports", 1.0, settings("java17", 1024)).await;

    let checkout = fleet_mock.invocations("checkout", 200, 3).await;
    let resizer = fleet_mock.invocations("resizer", 200, 2).await;
    let reports = fleet_mock.invocations("reports", 500, 1).await;

    let config = fleet(
        5,
        json!([
            {"name": "checkout"},
            {"name": "resizer", "region": "eu-west-1"},
            {"name": "reports"},
        ]),
    );
    let report = fleet_mock.orchestrator().run(&config).await.unwrap();

    checkout.assert_async().await;
    resizer.assert_async().await;
    reports.assert_async().await;

    assert_eq!(report.batches, 2);
    assert_eq!(report.total_calls, 6);
    assert_eq!(report.failed_calls, 1);
    assert_eq!(report.warm_results.len(), 5);
    assert!(report.warm_results.iter().all(|o| o.success && o.target != "reports"));
    assert!(report
        .warm_results
        .iter()
        .any(|o| o.target == "resizer" && o.region == "eu-west-1"));
}

#[tokio::test]
async fn payload_carries_formatted_settings() {
    let mut fleet_mock = MockFleet::new().await;
    fleet_mock.function("checkout", 2.0, settings("python3.12", 512)).await;

    let mock = fleet_mock
        .server
        .mock("POST", "/2015-03-31/functions/checkout/invocations")
        .match_body(Matcher::PartialJson(json!({
            "action": "warm_up",
            "source": "fleet-warmer",
            "settings": {
                "runtime": "python",
                "memory_size": 512,
                "timeout": 30,
                "network_isolation": false,
                "startup_time_ms": 12,
            },
        })))
        .with_status(200)
        .with_body(r#"{"status":200,"msg":"warm"}"#)
        .expect(2)
        .create_async()
        .await;

    let report = fleet_mock
        .orchestrator()
        .run(&fleet(10, json!([{"name": "checkout"}])))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(report.warm_results.len(), 2);
    assert_eq!(
        report.warm_results[0].data,
        Some(json!({"status": 200, "msg": "warm"}))
    );
}

#[tokio::test]
async fn settings_failure_aborts_before_any_call() {
    let mut fleet_mock = MockFleet::new().await;
    fleet_mock
        .server
        .mock("GET", "/functions/checkout/concurrency")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"samples":[{"timestamp":0,"value":4}]}"#)
        .create_async()
        .await;
    fleet_mock
        .server
        .mock("GET", "/functions/checkout/settings")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    let invocations = fleet_mock.invocations("checkout", 200, 0).await;

    let err = fleet_mock
        .orchestrator()
        .run(&fleet(10, json!([{"name": "checkout"}])))
        .await
        .unwrap_err();

    invocations.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::GetSettingsFailed);
    assert_eq!(err.context().unwrap().status_code, Some(404));
}

#[tokio::test]
async fn plan_only_never_invokes() {
    let mut fleet_mock = MockFleet::new().await;
    fleet_mock.function("checkout", 8.0, settings("python3.12", 512)).await;
    fleet_mock.function("resizer", 4.0, settings("nodejs20.x", 256)).await;
    let checkout = fleet_mock.invocations("checkout", 200, 0).await;

    let plan = fleet_mock
        .orchestrator()
        .plan_only(&fleet(10, json!([{"name": "checkout"}, {"name": "resizer"}])))
        .await
        .unwrap();

    checkout.assert_async().await;
    let names: Vec<Vec<&str>> = plan.batches.iter().map(|b| b.names()).collect();
    assert_eq!(names, vec![vec!["checkout"], vec!["resizer"]]);
    assert_eq!(plan.total_calls(), 12);
}
