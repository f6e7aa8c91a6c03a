use std::sync::Arc;

use serde_json::{Value as JsonValue, json};
use taskboard::board::{Board, BoardApi, BoardPhase, MOVE_FAILED};
use taskboard::{NewLabel, NewTask, TaskBoardDbBuilder, TaskStatus};
use taskboard_server::{HttpBoardApi, serve};
use tokio::net::TcpListener;

/// Start a server on a random port backed by a fresh in-memory store.
async fn start_server() -> String {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = TaskBoardDbBuilder::new("sqlite::memory:")
        .build()
        .await
        .expect("Failed to create TaskBoardDb");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(serve(listener, Arc::new(db), false));
    format!("http://{addr}")
}

#[tokio::test]
async fn test_board_over_http() {
    let base = start_server().await;
    let api = HttpBoardApi::new(&base);

    let label = api
        .add_label(NewLabel {
            name: "Work".into(),
            description: None,
            color: Some("#10B981".into()),
        })
        .await
        .expect("Failed to add label");
    let task = api
        .add_task(NewTask {
            title: "Ship it".into(),
            description: "Release 1.0".into(),
            status: None,
            label_id: Some(label.id),
        })
        .await
        .expect("Failed to add task");
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.label.as_ref().map(|l| l.name.as_str()), Some("Work"));

    let mut board = Board::new(&api);
    board.refresh().await;
    assert_eq!(board.phase(), &BoardPhase::Ready);
    assert_eq!(board.stats().todo, 1);

    board.drop_card(task.id, Some(TaskStatus::Done)).await;
    assert!(board.alerts().is_empty());
    let moved = board.tasks().iter().find(|t| t.id == task.id).expect("task loaded");
    assert_eq!(moved.status, TaskStatus::Done);
    assert!(moved.is_completed);

    // Moving a task that is gone surfaces as an alert.
    assert!(board.delete_card(task.id).await);
    board.drop_card(task.id, Some(TaskStatus::Todo)).await;
    assert_eq!(board.take_alerts(), [MOVE_FAILED]);
    assert_eq!(board.phase(), &BoardPhase::Ready);
    assert!(board.tasks().is_empty());
}

#[tokio::test]
async fn test_error_envelope_over_http() {
    let base = start_server().await;
    let http = reqwest::Client::new();

    let body: JsonValue = http
        .post(format!("{base}/graphql"))
        .json(&json!({
            "operationName": "updateTaskStatus",
            "variables": { "id": 1, "status": "WHENEVER" }
        }))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(body["data"]["updateTaskStatus"], JsonValue::Null);
    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"][0]["path"][0], "updateTaskStatus");
    assert!(
        body["errors"][0]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("WHENEVER")
    );

    let api = HttpBoardApi::new(&base);
    let err = api.update_task_status(1, "DONE").await.unwrap_err();
    assert!(err.to_string().contains("NOT_FOUND"));
}

#[tokio::test]
async fn test_get_queries_and_cors() {
    let base = start_server().await;
    let http = reqwest::Client::new();

    let resp = http
        .get(format!("{base}/graphql"))
        .query(&[("operationName", "labels"), ("variables", "{\"first\":5}")])
        .send()
        .await
        .expect("request failed");
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: JsonValue = resp.json().await.expect("invalid json");
    assert_eq!(body["data"]["labels"]["totalCount"], 0);

    let body: JsonValue = http
        .get(format!("{base}/graphql"))
        .query(&[("operationName", "clearAllData")])
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid json");
    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");

    let resp = http
        .request(reqwest::Method::OPTIONS, format!("{base}/graphql"))
        .send()
        .await
        .expect("request failed");
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn test_unreadable_requests_get_an_envelope() {
    let base = start_server().await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/graphql"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: JsonValue = resp.json().await.expect("invalid json");
    assert_eq!(body["data"], JsonValue::Null);
    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");

    let resp = http
        .post(format!("{base}/graphql"))
        .json(&json!({ "variables": {} }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: JsonValue = resp.json().await.expect("invalid json");
    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");

    let resp = http
        .get(format!("{base}/graphql"))
        .query(&[("operationName", "labels"), ("variables", "not-json")])
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: JsonValue = resp.json().await.expect("invalid json");
    assert_eq!(body["data"], JsonValue::Null);
    assert_eq!(body["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
    assert!(
        body["errors"][0]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("invalid variables")
    );
}
