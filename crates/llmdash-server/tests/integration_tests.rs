//! Router tests against a temporary log database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use llmdash_server::{AppState, create_router};
use llmdash_usage::{LogStore, QuerySettings, UsageQuery};
use rusqlite::{Connection, params};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const MARKER: &str = "chat.completion.chunk";

fn chunk(prompt: u64, completion: u64, cost: f64) -> String {
    json!({
        "object": MARKER,
        "usage": {
            "prompt_tokens": prompt,
            "completion_tokens": completion,
            "total_tokens": prompt + completion,
            "cost": cost
        }
    })
    .to_string()
}

fn create_app(rows: &[(&str, &str, String)]) -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "CREATE TABLE responses (id INTEGER PRIMARY KEY, model TEXT, response_json TEXT, datetime_utc TEXT)",
        [],
    )
    .unwrap();
    for (model, ts, body) in rows {
        conn.execute(
            "INSERT INTO responses (model, response_json, datetime_utc) VALUES (?1, ?2, ?3)",
            params![model, body, ts],
        )
        .unwrap();
    }
    drop(conn);

    let query = UsageQuery::new(LogStore::new(path, MARKER), QuerySettings::default());
    (dir, create_router(AppState::new(query), true))
}

fn sample_app() -> (TempDir, Router) {
    create_app(&[
        ("gpt-4", "2024-03-01T09:00:00.123456+00:00", chunk(60, 40, 1.50)),
        ("gpt-4", "2024-03-01T10:00:00", chunk(120, 80, 2.50)),
        ("claude-3-opus", "2024-03-05 12:00:00", chunk(10, 10, 0.30)),
    ])
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = sample_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "success": true}));
}

#[tokio::test]
async fn test_usage_report() {
    let (_dir, app) = sample_app();
    let (status, body) = get(&app, "/usage?start_date=2024-03-01&end_date=2024-03-31").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["overall_stats"]["total_requests"], 3);
    assert_eq!(body["skipped_records"], 0);

    let models = body["model_data"].as_array().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[1]["model"], "gpt-4");
    assert_eq!(models[1]["requests"], 2);
    assert_eq!(models[1]["total_tokens"], 300);
    let per_1k = models[1]["cost_per_1k_tokens"].as_f64().unwrap();
    assert!((per_1k - 13.33).abs() < 0.01);

    let dates = body["date_data"].as_array().unwrap();
    assert_eq!(dates[0]["date"], "2024-03-01");
    assert_eq!(dates[1]["date"], "2024-03-05");
}

#[tokio::test]
async fn test_usage_with_no_matches() {
    let (_dir, app) = sample_app();
    let (status, body) = get(&app, "/usage?start_date=2024-01-01&end_date=2024-01-01&model=all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["model_data"], json!([]));
    assert_eq!(body["date_data"], json!([]));
    assert_eq!(body["overall_stats"]["total_requests"], 0);
}

#[tokio::test]
async fn test_missing_start_date() {
    let (_dir, app) = sample_app();
    let (status, body) = get(&app, "/usage?end_date=2024-01-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Start date and end date are required", "success": false})
    );
}

#[tokio::test]
async fn test_invalid_dates() {
    let (_dir, app) = sample_app();

    let (status, body) = get(&app, "/top-cost-records?start_date=2024-01-01&end_date=tomorrow").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid date format for end_date: tomorrow. Expected YYYY-MM-DD."
    );

    let (status, body) = get(&app, "/usage?start_date=2024-02-01&end_date=2024-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_query_string_is_json() {
    let (_dir, app) = sample_app();

    for uri in [
        "/usage?start_date=2024-03-01&start_date=2024-03-02&end_date=2024-03-31",
        "/api/sample-records?start_date=2024-03-01&end_date=2024-03-31&end_date=2024-04-01",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
    }
}

#[tokio::test]
async fn test_text_row_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "CREATE TABLE responses (id TEXT PRIMARY KEY, model TEXT, response_json TEXT, datetime_utc TEXT)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO responses VALUES (?1, 'gpt-4', ?2, '2024-03-10T08:00:00')",
        params!["01hr8z3k4m5n6p7q8r9s0t1v2w", chunk(100, 50, 0.75)],
    )
    .unwrap();
    drop(conn);

    let query = UsageQuery::new(LogStore::new(path, MARKER), QuerySettings::default());
    let app = create_router(AppState::new(query), false);

    let (status, body) = get(&app, "/usage?start_date=2024-03-01&end_date=2024-03-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_stats"]["total_requests"], 1);

    let (status, body) = get(&app, "/top-cost-records?start_date=2024-03-01&end_date=2024-03-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"][0]["id"], "01hr8z3k4m5n6p7q8r9s0t1v2w");

    let (status, body) = get(&app, "/debug-info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sample_record"]["id"], "01hr8z3k4m5n6p7q8r9s0t1v2w");
}

#[tokio::test]
async fn test_models_and_date_bounds() {
    let (_dir, app) = sample_app();

    let (status, body) = get(&app, "/models").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"], json!(["claude-3-opus", "gpt-4"]));

    let (status, body) = get(&app, "/date-bounds").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["min_date"], "2024-03-01");
    assert_eq!(body["max_date"], "2024-03-05");
    assert_eq!(body["raw_max_date"], "2024-03-05 12:00:00");
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_top_cost_records() {
    let (_dir, app) = sample_app();
    let (status, body) = get(&app, "/top-cost-records?start_date=2024-03-01&end_date=2024-03-31&model=gpt-4").await;

    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["cost"], 2.5);
    assert_eq!(records[0]["datetime"], "2024-03-01 10:00:00");
    assert_eq!(records[1]["datetime"], "2024-03-01 09:00:00");
}

#[tokio::test]
async fn test_legacy_routes() {
    let (_dir, app) = sample_app();

    let (status, body) = get(&app, "/api/date-range").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["min_date"], "2024-03-01");

    let (status, body) = get(&app, "/api/token-data?start_date=2024-03-01&end_date=2024-03-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_stats"]["total_requests"], 3);

    let (status, body) = get(&app, "/api/sample-records?start_date=2024-03-01&end_date=2024-03-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"].as_array().unwrap().len(), 3);

    let (status, body) = get(&app, "/api/debug-info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db_exists"], true);
    assert_eq!(body["usage_record_count"], 3);
}

#[tokio::test]
async fn test_missing_store_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let query = UsageQuery::new(
        LogStore::new(dir.path().join("absent.db"), MARKER),
        QuerySettings::default(),
    );
    let app = create_router(AppState::new(query), false);

    let (status, body) = get(&app, "/models").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("absent.db"));

    let (status, body) = get(&app, "/debug-info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db_exists"], false);
}

#[tokio::test]
async fn test_cors_header() {
    let (_dir, app) = sample_app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
