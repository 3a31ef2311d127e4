//! Local JSON-RPC fixtures for tests.

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serve a JSON-RPC endpoint answering with `handler(method, params)`.
///
/// The handler returns the response object without `jsonrpc`/`id`; both are
/// filled in from the request.
pub async fn serve_rpc(handler: fn(&str, Value) -> Value) -> String {
    let router = Router::new().route(
        "/",
        post(move |Json(req): Json<Value>| async move {
            let method = req["method"].as_str().unwrap_or_default().to_string();
            let mut response = handler(&method, req["params"].clone());
            response["jsonrpc"] = json!("2.0");
            response["id"] = req["id"].clone();
            Json(response)
        }),
    );
    serve(router).await
}
