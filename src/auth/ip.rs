//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, http::Extensions};

/// Client IP from the connection info axum attaches to each request.
///
/// Only present when the app is served with `into_make_service_with_connect_info`.
pub fn extract_client_ip(extensions: &Extensions) -> Result<String, &'static str> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .ok_or("No client IP available")
}
