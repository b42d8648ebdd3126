//! Client address derivation behind reverse proxies.
//!
//! # Responsibilities
//! - Determine the real client IP for rate limiting and logs
//! - Honor `X-Forwarded-For` only for a configured number of trusted hops
//!
//! # Design Decisions
//! - Each trusted proxy appends the address it saw, so the entry `n` from
//!   the right is the one written by the outermost trusted proxy
//! - Fewer entries than trusted hops means the header is not trustworthy;
//!   fall back to the TCP peer
//! - Unparseable entries fall back to the TCP peer

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the client IP from forwarding headers and the peer address.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trusted_hops: usize) -> IpAddr {
    if trusted_hops == 0 {
        return peer;
    }

    let entries: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .collect();

    if entries.len() < trusted_hops {
        return peer;
    }

    entries[entries.len() - trusted_hops]
        .parse()
        .unwrap_or(peer)
}

/// Client IP for a request served through `into_make_service_with_connect_info`.
///
/// Requests without connection info (in-process test harnesses) are
/// attributed to the unspecified address.
pub fn request_client_ip(req: &Request<Body>, trusted_hops: usize) -> IpAddr {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));

    client_ip(req.headers(), peer, trusted_hops)
}
