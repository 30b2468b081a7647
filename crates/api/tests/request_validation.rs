//! Requests rejected before any database access, run against a router whose
//! pool never connects.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_offline_app, get, multipart_body, post_json, post_multipart, JPEG};
use serde_json::json;

#[tokio::test]
async fn missing_token_returns_401() {
    let response = get(build_offline_app(), "/api/v1/train", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_token_returns_401() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/generate/gen_x")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = common::send(build_offline_app(), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_prompt_returns_400() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/generate",
        uuid::Uuid::new_v4(),
        json!({ "prompt": "", "style_id": "style-1" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_aspect_ratio_returns_400() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/generate",
        uuid::Uuid::new_v4(),
        json!({ "prompt": "a lighthouse", "style_id": "style-1", "aspect_ratio": "wide" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_image_upload_returns_400() {
    let body = multipart_body(&[("name", "Portrait")], &[b"definitely not an image".as_slice()]);
    let response =
        post_multipart(build_offline_app(), "/api/v1/train", uuid::Uuid::new_v4(), body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("Image 0"));
}

#[tokio::test]
async fn too_few_onboarding_images_returns_400() {
    let images = vec![JPEG; 3];
    let body = multipart_body(&[], &images);
    let response = post_multipart(
        build_offline_app(),
        "/api/v1/onboarding/batch-upload",
        uuid::Uuid::new_v4(),
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn too_many_onboarding_images_returns_400() {
    let images = vec![JPEG; 26];
    let body = multipart_body(&[], &images);
    let response = post_multipart(
        build_offline_app(),
        "/api/v1/onboarding/batch-upload",
        uuid::Uuid::new_v4(),
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn response_carries_request_id() {
    let response = get(build_offline_app(), "/api/v1/train", None).await;

    assert!(response.headers().get("x-request-id").is_some());
}
