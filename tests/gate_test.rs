//! Session gate behavior over real HTTP.

use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn unverified_clients_are_sent_to_robot_page() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();

    for path in ["/", "/api/data?q=hello", "/does-not-exist", "/verify_robot"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FOUND, "GET {path}");
        assert_eq!(common::location(&res), "/robot", "GET {path}");
    }

    let res = client.post(server.url("/api/data?q=hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/robot");
}

#[tokio::test]
async fn allow_listed_routes_are_reachable_unverified() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();

    let res = client.get(server.url("/robot")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains(r#"action="/verify_robot""#));

    let res = client.get(server.url("/static/style.css")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains(".card"));
}

#[tokio::test]
async fn verification_unlocks_protected_routes() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();

    common::verify(&client, &server).await;

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains("<h1>Welcome</h1>"));

    let res = client.get(server.url("/api/data?q=hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn verification_is_per_session() {
    let server = common::spawn_server(common::test_config()).await;
    let verified = common::client();
    let stranger = common::client();

    common::verify(&verified, &server).await;

    let res = stranger.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/robot");
}

#[tokio::test]
async fn tampered_session_cookie_is_not_verified() {
    let server = common::spawn_server(common::test_config()).await;
    let client = common::client();

    let res = client.post(server.url("/verify_robot")).send().await.unwrap();
    let cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let forged = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();
    let res = forged
        .get(server.url("/"))
        .header("cookie", "session=forged-session-id")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/robot");
}
