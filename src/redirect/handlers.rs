use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::resolve::{Outcome, Resolver};

use super::timer::RedirectTimer;

pub struct RedirectState {
    pub resolver: Resolver,
    /// Pause before answering a successful resolution
    pub delay: Duration,
}

/// Resolve a shortcode and redirect to its destination.
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> axum::response::Response {
    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let client_ip = extract_client_ip(&headers, addr.ip());

    let outcome = state
        .resolver
        .resolve(&code, Some(client_ip), referrer.as_deref(), Utc::now())
        .await;

    match outcome {
        Ok(Outcome::Redirect { target }) => {
            if !state.delay.is_zero() {
                let (timer, _handle) = RedirectTimer::new(state.delay);
                timer.wait().await;
            }
            Redirect::temporary(&target).into_response()
        }
        Ok(Outcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Shortcode not found.").into_response()
        }
        Ok(Outcome::Expired) => (StatusCode::GONE, "This link has expired.").into_response(),
        Ok(Outcome::MissingCode) => {
            (StatusCode::BAD_REQUEST, "No shortcode provided.").into_response()
        }
        Err(err) => {
            tracing::error!(shortcode = %code, "resolution failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Client IP for geolocation enrichment: forwarded headers first, socket
/// address as the fallback.
fn extract_client_ip(headers: &HeaderMap, socket_ip: IpAddr) -> IpAddr {
    for name in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if let Some(ip) = value
                .split(',')
                .next()
                .map(str::trim)
                .and_then(|s| s.parse::<IpAddr>().ok())
            {
                return ip;
            }
        }
    }
    socket_ip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_header_wins_over_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());

        let ip = extract_client_ip(&headers, "127.0.0.1".parse().unwrap());
        assert_eq!(ip, "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn unparseable_header_falls_back_to_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "not-an-ip".parse().unwrap());

        let ip = extract_client_ip(&headers, "192.0.2.7".parse().unwrap());
        assert_eq!(ip, "192.0.2.7".parse::<IpAddr>().unwrap());
    }
}
