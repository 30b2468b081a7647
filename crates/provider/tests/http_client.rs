//! Exercises [`HiggsfieldApi`] against a local stub of the provider.

use std::net::SocketAddr;

use assert_matches::assert_matches;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use twyn_provider::{HiggsfieldApi, ProviderError, RemoteJobClient, TrainingRequest};

const API_KEY: &str = "test-key";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {API_KEY}"))
}

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route(
            "/higgsfield/character",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                if !authorized(&headers) {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
                }
                if body["input_images"].as_array().map_or(true, |a| a.is_empty()) {
                    return (StatusCode::BAD_REQUEST, Json(json!({"error": "no images"})));
                }
                (StatusCode::OK, Json(json!({"task_id": "task-1"})))
            }),
        )
        .route(
            "/higgsfield/character/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "char_42" {
                    (StatusCode::OK, Json(json!({"id": id})))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
                }
            }),
        )
        .route(
            "/higgsfield/task/{id}/fetch",
            get(|Path(id): Path<String>| async move {
                Json(json!({"id": id, "status": "completed", "character_id": 99}))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, key: &str) -> HiggsfieldApi {
    HiggsfieldApi::with_client(reqwest::Client::new(), format!("http://{addr}"), key.into())
}

#[tokio::test]
async fn submit_training_returns_task_id() {
    let addr = spawn_stub().await;
    let api = client(addr, API_KEY);

    let task_id = api
        .submit_training(&TrainingRequest {
            name: "Me".into(),
            input_images: vec!["https://b/1.jpg".into()],
        })
        .await
        .unwrap();
    assert_eq!(task_id, "task-1");
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let addr = spawn_stub().await;
    let api = client(addr, "wrong");

    let err = api
        .submit_training(&TrainingRequest {
            name: "Me".into(),
            input_images: vec!["https://b/1.jpg".into()],
        })
        .await
        .unwrap_err();
    assert_matches!(err, ProviderError::Api { status: 401, .. });
}

#[tokio::test]
async fn fetch_task_parses_numeric_ids() {
    let addr = spawn_stub().await;
    let task = client(addr, API_KEY).fetch_task("task-1").await.unwrap();
    assert_eq!(task.status.as_deref(), Some("completed"));
    assert_eq!(task.character_id.as_deref(), Some("99"));
}

#[tokio::test]
async fn character_exists_maps_404_to_false() {
    let addr = spawn_stub().await;
    let api = client(addr, API_KEY);
    assert!(api.character_exists("char_42").await.unwrap());
    assert!(!api.character_exists("char_gone").await.unwrap());
}
