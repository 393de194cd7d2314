//! Helpers shared by unit tests.

use std::time::Duration;

use axum::Router;
use reqwest::Client;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve upstream");
    });
    format!("http://{}", addr)
}

/// Client with a short timeout for talking to [`spawn_upstream`] servers.
pub fn test_client() -> Client {
    crate::http::build_http_client(Duration::from_secs(5)).expect("build client")
}
