//! Client IP resolution for rate limiting: prefers the first hop recorded by
//! a trusted reverse proxy, falls back to the TCP peer address.

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use std::net::SocketAddr;

pub fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(value) = headers.get("x-forwarded-for") {
        if let Ok(value) = value.to_str() {
            if let Some(first) = value.split(',').next() {
                let trimmed = first.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_owned();
                }
            }
        }
    }
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}
