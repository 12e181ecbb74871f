/* demos/server.rs */

use axum::{
    Router,
    extract::ConnectInfo,
    http::HeaderMap,
    response::Json,
    routing::get,
};
use remote_addr::{ForwardedChain, ResolvedAddr, ResolvedAddrLayer, X_FORWARDED_FOR};
use serde_json::json;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = create_app();
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test endpoints:");
    println!("  • GET /remote_address - Raw header and resolved client address");
    println!("  • GET /debug          - JSON breakdown of the resolution");
    println!();
    println!("Test with headers:");
    println!("  curl http://localhost:3000/remote_address");
    println!("  curl -H 'X-Forwarded-For: 203.0.113.7, 10.0.0.5' http://localhost:3000/remote_address");
    println!("  curl -H 'X-Forwarded-For: 10.0.0.9, 10.0.0.5' http://localhost:3000/debug");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn create_app() -> Router {
    Router::new()
        .route("/remote_address", get(remote_address_handler))
        .route("/debug", get(debug_handler))
        .layer(ResolvedAddrLayer::default())
}

/// Echoes the raw forwarding header and the resolved client address.
async fn remote_address_handler(headers: HeaderMap, resolved: ResolvedAddr) -> String {
    let raw = headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    format!(
        "X-Forwarded-For: {}\ngetRemoteAddress() returns {}",
        raw, resolved
    )
}

/// Debug handler showing how the chain was resolved.
async fn debug_handler(
    resolved: ResolvedAddr,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let raw = headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok());

    let hops: Vec<String> = raw
        .map(|value| {
            ForwardedChain::parse(value)
                .iter()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let hop_count = hops.len();

    Json(json!({
        "resolved_address": resolved.to_string(),
        "resolved_host": resolved.host(),
        "resolved_port": resolved.port(),
        "connection_info": {
            "remote_addr": addr.to_string(),
            "remote_ip": addr.ip().to_string(),
            "remote_port": addr.port(),
        },
        "x_forwarded_for": raw,
        "hops": hops,
        "analysis": {
            "address_source": if raw.is_none() {
                "connection_fallback"
            } else {
                "forwarded_chain"
            },
            "hop_count": hop_count,
            "matches_connection": resolved.socket_addr() == Some(addr),
        }
    }))
}
