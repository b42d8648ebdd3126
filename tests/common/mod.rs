//! Shared utilities for integration tests.

use std::net::SocketAddr;

use reqwest::redirect::Policy;
use reqwest::StatusCode;
use robot_gate::{GateConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;

pub const SECRET: &str =
    "integration-test-secret-integration-test-secret-integration-test-secret";

/// Defaults plus a usable secret and the repository's static directory.
pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.session.secret_key = SECRET.into();
    config.assets.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").into();
    config
}

/// A server running on a loopback port. Stops when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Bind a loopback port and serve `config` on it.
pub async fn spawn_server(config: GateConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).expect("server builds");
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer { addr, shutdown }
}

/// A browser-like client: keeps cookies, does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Click through the verification page.
#[allow(dead_code)]
pub async fn verify(client: &reqwest::Client, server: &TestServer) {
    let res = client.post(server.url("/verify_robot")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/");
}

#[allow(dead_code)]
pub fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
