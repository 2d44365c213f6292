//! Fetch tests against an in-process HTTP server speaking the netdata v1 API.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use netdata_client::{
    fetch_all, ChartSelection, DataQuery, FetchError, FrameOptions, NetdataClient, RowKey,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

async fn data(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("chart").map(String::as_str) {
        Some("slow") => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!({"labels": ["time", "v"], "data": [[1, 1]]})).into_response()
        }
        Some("bad") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("late_bad") => {
            tokio::time::sleep(Duration::from_secs(1)).await;
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Some("garbled") => "not json".into_response(),
        Some(chart) => Json(json!({
            "labels": ["time", "user", "system"],
            "data": [[1002, 3.0, 1.0], [1001, 2.0, 1.0], [1000, 1.0, 1.0]],
            "chart": chart
        }))
        .into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn charts() -> Json<serde_json::Value> {
    Json(json!({
        "charts": {
            "system.cpu": {"title": "CPU"},
            "system.load": {"title": "Load"},
            "disk.io": {"title": "Disk"}
        }
    }))
}

async fn alarm_log() -> Json<serde_json::Value> {
    Json(json!([
        {"name": "10min_cpu_usage", "status": "WARNING", "when": 1600000000, "delay_up_to_timestamp": 1600000060}
    ]))
}

async fn allmetrics() -> Json<serde_json::Value> {
    Json(json!({
        "system.cpu": {
            "last_updated": 1600000000,
            "dimensions": {"user": {"name": "user", "value": 4.0}}
        }
    }))
}

fn router() -> Router {
    Router::new()
        .route("/api/v1/data", get(data))
        .route("/api/v1/charts", get(charts))
        .route("/api/v1/alarm_log", get(alarm_log))
        .route("/api/v1/allmetrics", get(allmetrics))
}

async fn protected(headers: HeaderMap) -> Response {
    // user:pass
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Basic dXNlcjpwYXNz") => Json(json!({
            "labels": ["time", "v"],
            "data": [[1, 1.0]]
        }))
        .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

fn charts_named(names: &[&str]) -> ChartSelection {
    ChartSelection::Charts(names.iter().map(|c| c.to_string()).collect())
}

#[tokio::test]
async fn fetches_every_chart_before_deadline() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();
    let plan = client
        .plan(
            &[host.clone()],
            &charts_named(&["system.cpu", "system.load"]),
            &DataQuery::default(),
        )
        .await
        .unwrap();

    let outcome = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(10),
    )
    .await
    .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.frames.len(), 2);
    let cpu = outcome
        .frames
        .iter()
        .find(|f| f.chart == "system.cpu")
        .unwrap();
    assert_eq!(cpu.frame.n_rows(), 3);
    assert_eq!(cpu.frame.index()[0], RowKey::new(host.as_str(), 1002));
}

#[tokio::test]
async fn deadline_before_any_completion_yields_empty_outcome() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();
    let plan = client
        .plan(&[host], &charts_named(&["slow", "slow"]), &DataQuery::default())
        .await
        .unwrap();

    let outcome = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_millis(200),
    )
    .await
    .unwrap();

    assert!(outcome.timed_out);
    assert!(outcome.frames.is_empty());
}

#[tokio::test]
async fn deadline_keeps_completed_frames() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();
    let plan = client
        .plan(&[host], &charts_named(&["system.cpu", "slow"]), &DataQuery::default())
        .await
        .unwrap();

    let outcome = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(2),
    )
    .await
    .unwrap();

    assert!(outcome.timed_out);
    assert_eq!(outcome.frames.len(), 1);
    assert_eq!(outcome.frames[0].chart, "system.cpu");
}

#[tokio::test]
async fn failure_after_deadline_is_a_timeout() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();
    let plan = client
        .plan(&[host], &charts_named(&["system.cpu", "late_bad"]), &DataQuery::default())
        .await
        .unwrap();

    let outcome = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_millis(300),
    )
    .await
    .unwrap();

    assert!(outcome.timed_out);
    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.frames.len(), 1);
    assert_eq!(outcome.frames[0].chart, "system.cpu");
}

#[tokio::test]
async fn request_timeout_fails_the_chart() {
    let host = serve(router()).await;
    let client = NetdataClient::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let plan = client
        .plan(&[host], &charts_named(&["slow"]), &DataQuery::default())
        .await
        .unwrap();

    let err = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(5),
    )
    .await
    .unwrap_err();

    match err {
        FetchError::Chart { chart, source, .. } => {
            assert_eq!(chart, "slow");
            assert!(matches!(*source, FetchError::Timeout));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn one_failure_aborts_the_batch() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();
    let plan = client
        .plan(
            &[host.clone()],
            &charts_named(&["system.cpu", "slow", "bad"]),
            &DataQuery::default(),
        )
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let err = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(30),
    )
    .await
    .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        FetchError::Chart {
            host: failed_host,
            chart,
            source,
        } => {
            assert_eq!(failed_host, host);
            assert_eq!(chart, "bad");
            assert!(matches!(*source, FetchError::Http(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_a_parse_error() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();
    let plan = client
        .plan(&[host], &charts_named(&["garbled"]), &DataQuery::default())
        .await
        .unwrap();

    let err = fetch_all(
        &client,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(10),
    )
    .await
    .unwrap_err();

    match err {
        FetchError::Chart { source, .. } => assert!(matches!(*source, FetchError::Parse(_))),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn basic_auth_is_sent_with_every_request() {
    let host = serve(Router::new().route("/api/v1/data", get(protected))).await;
    let selection = charts_named(&["a", "b"]);

    let authed = NetdataClient::builder()
        .credentials("user", "pass")
        .build()
        .unwrap();
    let plan = authed
        .plan(&[host.clone()], &selection, &DataQuery::default())
        .await
        .unwrap();
    let outcome = fetch_all(
        &authed,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(10),
    )
    .await
    .unwrap();
    assert_eq!(outcome.frames.len(), 2);

    let anonymous = NetdataClient::builder().build().unwrap();
    let plan = anonymous
        .plan(&[host], &selection, &DataQuery::default())
        .await
        .unwrap();
    let err = fetch_all(
        &anonymous,
        plan.requests,
        &FrameOptions::default(),
        Duration::from_secs(10),
    )
    .await
    .unwrap_err();
    match err {
        FetchError::Chart { source, .. } => assert!(matches!(*source, FetchError::Auth(_))),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn catalog_lookup_with_prefix() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();

    let all = client.chart_list(&host, None).await.unwrap();
    assert_eq!(all, vec!["disk.io", "system.cpu", "system.load"]);

    let system = client.chart_list(&host, Some("system.")).await.unwrap();
    assert_eq!(system, vec!["system.cpu", "system.load"]);
}

#[tokio::test]
async fn all_sentinel_plans_every_chart_per_host() {
    let a = serve(router()).await;
    let b = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();

    let plan = client
        .plan(
            &[a.clone(), b.clone()],
            &ChartSelection::All {
                starts_with: Some("system.".to_string()),
            },
            &DataQuery::default(),
        )
        .await
        .unwrap();

    assert_eq!(plan.requests.len(), 4);
    assert_eq!(plan.requests[0].host, a);
    assert_eq!(plan.requests[3].host, b);
    assert_eq!(plan.requests[3].chart, "system.load");
}

#[tokio::test]
async fn alarm_log_with_datetimes() {
    let host = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();

    let log = client.alarm_log(&host, true).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log.column("when").unwrap(),
        vec![&json!("2020-09-13T12:26:40+00:00")]
    );

    let raw = client.alarm_log(&host, false).await.unwrap();
    assert_eq!(raw.column("when").unwrap(), vec![&json!(1600000000)]);
}

#[tokio::test]
async fn allmetrics_across_hosts() {
    let a = serve(router()).await;
    let b = serve(router()).await;
    let client = NetdataClient::builder().build().unwrap();

    let samples = client
        .allmetrics_hosts(&[a.clone(), b.clone()], None, "|")
        .await
        .unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].host, a);
    assert_eq!(samples[1].host, b);
    assert_eq!(samples[1].dimension, "system.cpu|user");
    assert_eq!(netdata_client::allmetrics::wide(&samples, true), vec![("system.cpu|user".to_string(), 4.0)]);
}
