#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use vattu::app::{AppState, router};
use vattu::{Inventory, MemoryStorage};

const LIMIT: usize = 1024 * 1024;

fn app() -> Router {
    app_with_limit(LIMIT)
}

fn app_with_limit(limit: usize) -> Router {
    let inventory = Inventory::open(MemoryStorage::new()).unwrap();
    router(Arc::new(AppState::new(inventory)), limit)
}

fn image_form(boundary: &str, payload: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\n{payload}\r\n--{boundary}--\r\n"
    )
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn add(app: &Router, name: &str, quantity: &str) -> Value {
    let (status, _) = json(
        app,
        Method::PUT,
        "/api/draft",
        Some(json!({ "name": name, "quantity": quantity })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, state) = json(app, Method::POST, "/api/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    state
}

#[tokio::test]
async fn serves_the_page() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("QL Vật Tư"));
}

#[tokio::test]
async fn submit_without_login_is_a_user_error() {
    let app = app();
    json(&app, Method::PUT, "/api/draft", Some(json!({ "name": "Cát" }))).await;

    let (status, body) = json(&app, Method::POST, "/api/submit", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Vui lòng đăng nhập trước khi thêm vật tư.");

    let (_, state) = json(&app, Method::GET, "/api/state", None).await;
    assert_eq!(state["total"], 0);
}

#[tokio::test]
async fn login_add_edit_delete_flow() {
    let app = app();

    let (_, state) = json(&app, Method::POST, "/api/login/open", None).await;
    assert_eq!(state["panel"], "login");

    let (status, state) = json(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "name": "Tuấn", "email": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["user_label"], "Tuấn");
    assert_eq!(state["panel"], "closed");

    let state = add(&app, "Xi măng", "40").await;
    let id = state["items"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(state["items"][0]["quantity"], 40.0);
    assert_eq!(state["draft"]["name"], "");

    let (status, state) =
        json(&app, Method::POST, &format!("/api/items/{id}/edit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["editing_id"], id.as_str());
    assert_eq!(state["draft"]["quantity"], "40");

    json(&app, Method::PUT, "/api/draft", Some(json!({ "quantity": "35" }))).await;
    let (_, state) = json(&app, Method::POST, "/api/submit", None).await;
    assert_eq!(state["items"][0]["quantity"], 35.0);
    assert!(state["editing_id"].is_null());

    let (status, state) = json(&app, Method::DELETE, "/api/items/local_nope", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["total"], 1);

    let (_, state) = json(&app, Method::DELETE, &format!("/api/items/{id}"), None).await;
    assert_eq!(state["total"], 0);

    let (_, state) = json(&app, Method::POST, "/api/logout", None).await;
    assert!(state["user"].is_null());
}

#[tokio::test]
async fn editing_unknown_item_is_rejected() {
    let app = app();
    let (status, body) = json(&app, Method::POST, "/api/items/local_x/edit", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Không tìm thấy vật tư: local_x");
}

#[tokio::test]
async fn blank_login_is_rejected() {
    let app = app();
    let (status, body) = json(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "name": " ", "email": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nhập tên hoặc email để đăng nhập (demo)");
}

#[tokio::test]
async fn search_filters_state_and_export() {
    let app = app();
    json(&app, Method::POST, "/api/login", Some(json!({ "email": "a@b.vn" }))).await;
    add(&app, "Xi măng", "40").await;
    add(&app, "Cát", "3").await;
    add(&app, "xi măng trắng", "2").await;

    let (_, state) = json(&app, Method::PUT, "/api/search", Some(json!({ "term": "MĂNG" }))).await;
    assert_eq!(state["items"].as_array().unwrap().len(), 2);
    assert_eq!(state["total"], 3);

    let (status, csv) = send(&app, Method::GET, "/api/export?format=csv", None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(csv).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("Tên vật tư,Số lượng"));
    assert!(!csv.contains("Cát"));
}

#[tokio::test]
async fn xlsx_export_is_an_attachment() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/api/export").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"vattu_export_"));
    assert!(disposition.ends_with(".xlsx\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn image_upload_is_embedded_in_the_draft() {
    let app = app();
    let boundary = "XBOUNDARY";
    let body = image_form(boundary, "abc");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/draft/image")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let state: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(state["draft"]["image"], "data:image/png;base64,YWJj");

    let (_, state) = json(&app, Method::POST, "/api/cancel", None).await;
    assert!(state["draft"]["image"].is_null());
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let app = app_with_limit(256);
    let boundary = "XBOUNDARY";
    let body = image_form(boundary, &"a".repeat(1024));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/draft/image")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let (_, state) = json(&app, Method::GET, "/api/state", None).await;
    assert!(state["draft"]["image"].is_null());
}

#[tokio::test]
async fn upload_under_the_limit_is_accepted() {
    let app = app_with_limit(1024);
    let boundary = "XBOUNDARY";
    let body = image_form(boundary, "abc");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/draft/image")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
