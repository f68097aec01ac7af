//! Request provenance for audit entries.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use lectern_core::lifecycle::RequestContext;

/// Client IP address and user agent, both best effort.
///
/// The IP comes from the first `X-Forwarded-For` entry, then `X-Real-IP`,
/// then the socket peer address when the server was started with connect
/// info. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub RequestContext);

impl ClientMeta {
    pub fn into_context(self) -> RequestContext {
        self.0
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn client_ip(parts: &Parts) -> Option<String> {
    if let Some(forwarded) = header_str(&parts.headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return Some(first.to_string());
        }
    }
    if let Some(real_ip) = header_str(&parts.headers, "x-real-ip") {
        return Some(real_ip.to_string());
    }
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta(RequestContext {
            ip_address: client_ip(parts),
            user_agent: header_str(&parts.headers, "user-agent").map(str::to_string),
        }))
    }
}
