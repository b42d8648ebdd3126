//! Error responses never reveal which failure occurred.

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

mod common;

async fn assert_denied(res: reqwest::Response) {
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "access denied or error occurred"}));
}

#[tokio::test]
async fn unknown_routes_are_denied_once_verified() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();
    common::verify(&client, &server).await;

    assert_denied(client.get(server.url("/admin")).send().await.unwrap()).await;
    assert_denied(
        client
            .get(server.url("/static/missing.css"))
            .send()
            .await
            .unwrap(),
    )
    .await;
}

#[tokio::test]
async fn wrong_methods_are_denied_once_verified() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();
    common::verify(&client, &server).await;

    assert_denied(client.get(server.url("/verify_robot")).send().await.unwrap()).await;
    assert_denied(
        client
            .request(Method::DELETE, server.url("/api/data"))
            .send()
            .await
            .unwrap(),
    )
    .await;
}

#[tokio::test]
async fn request_id_is_assigned_or_echoed() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();

    let res = client.get(server.url("/robot")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let res = client
        .get(server.url("/robot"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");
}
