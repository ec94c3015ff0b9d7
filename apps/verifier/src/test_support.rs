//! Loopback HTTP stubs for the outbound client tests.

use axum::Router;
use tokio::net::TcpListener;

/// Serves the router on an ephemeral loopback port and returns its base URL.
/// `build` receives that URL so the stub can emit absolute links to itself.
pub async fn serve_stub(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let router = build(base_url.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base_url
}

/// Base URL of a loopback port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}
