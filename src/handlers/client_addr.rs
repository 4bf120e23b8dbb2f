use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::state::AppState;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Client network identifier used as the rate limit key. Never rejects.
///
/// Forwarding headers are client-controlled. They are read only when
/// `AppState::trust_proxy` is set (`--trust-proxy`), i.e. when a reverse
/// proxy in front of the service overwrites them. Otherwise the socket
/// peer is the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientAddr(resolve(parts, state.trust_proxy)))
    }
}

// forwarding headers (when trusted), then socket peer, then "unknown"
fn resolve(parts: &Parts, trust_proxy: bool) -> String {
    let forwarded = if trust_proxy {
        from_headers(&parts.headers)
    } else {
        None
    };
    let peer = || {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };

    forwarded
        .or_else(peer)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

// first x-forwarded-for hop, then x-real-ip
fn from_headers(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .or_else(|| header_value(headers, "x-real-ip"))
        .map(|s| s.to_string())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
