//! Login rate-limiting middleware.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::AppState;
use crate::error::AppError;

/// Client identity for throttling.
///
/// The TCP peer is the client unless it is one of `trusted_proxies`. Behind a
/// trusted proxy the `X-Forwarded-For` chain is walked from the right and the
/// first hop that is not itself a trusted proxy wins. Hops left of that point
/// are client-supplied and never consulted.
pub fn client_key(request: &Request, trusted_proxies: &[IpAddr]) -> String {
    let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() else {
        return "unknown".to_string();
    };
    let peer = peer.ip();
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let hops: Vec<&str> = request
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    for hop in hops.iter().rev() {
        match hop.parse::<IpAddr>() {
            Ok(ip) if trusted_proxies.contains(&ip) => continue,
            Ok(ip) => return ip.to_string(),
            Err(_) => break,
        }
    }
    peer.to_string()
}

pub async fn limit_attempts(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request, &state.config.trusted_proxies);
    if let Err(retry_after_secs) = state.limiter.check(&client) {
        warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return Err(AppError::TooManyRequests { retry_after_secs });
    }
    Ok(next.run(request).await)
}
