//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Only the unauthenticated credential endpoints (login, registration and
//! the password reset pair) are limited. Everything else requires a token.
//!
//! Clients are keyed by the TCP peer address. `X-Forwarded-For` and
//! `X-Real-IP` are client-controlled, so they are only read when the
//! deployment opts in with `EMARKET_TRUST_PROXY` (the service then sits
//! behind a proxy that overwrites them).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{extract::ConnectInfo, http::Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that uses the peer address of the TCP connection, or the
/// reverse proxy headers when the proxy is trusted.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    /// Key on the TCP peer address only.
    #[must_use]
    pub const fn peer_address() -> Self {
        Self {
            trust_proxy_headers: false,
        }
    }

    /// Key on the address reported by a trusted reverse proxy.
    #[must_use]
    pub const fn behind_proxy() -> Self {
        Self {
            trust_proxy_headers: true,
        }
    }

    fn forwarded_ip<T>(req: &Request<T>) -> Option<IpAddr> {
        let headers = req.headers();

        // Try X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Some(ip);
        }

        // Try X-Real-IP
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = Self::forwarded_ip(req)
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for credential endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
/// This slows brute force attempts against login and password reset.
/// Proxy headers are only honoured when `trust_proxy_headers` is set.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn credentials_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let key_extractor = if trust_proxy_headers {
        ClientIpKeyExtractor::behind_proxy()
    } else {
        ClientIpKeyExtractor::peer_address()
    };
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5) // Allow burst of 5 requests
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request_from_peer(forwarded_for: Option<&str>) -> Request<()> {
        let mut builder = Request::builder();
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("198.51.100.4:5000".parse::<SocketAddr>().unwrap()));
        req
    }

    #[test]
    fn test_forged_forwarded_for_ignored_by_default() {
        let req = request_from_peer(Some("203.0.113.7"));
        let ip = ClientIpKeyExtractor::peer_address().extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());

        let mut req = request_from_peer(None);
        req.headers_mut()
            .insert("x-real-ip", "203.0.113.9".parse().unwrap());
        let ip = ClientIpKeyExtractor::peer_address().extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_trusted_proxy_forwarded_for_takes_first_hop() {
        let req = request_from_peer(Some("203.0.113.7, 10.0.0.1"));
        let ip = ClientIpKeyExtractor::behind_proxy().extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_trusted_proxy_falls_back_to_peer_address() {
        let req = request_from_peer(Some("not-an-ip"));
        let ip = ClientIpKeyExtractor::behind_proxy().extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_no_source_is_an_error() {
        let req = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor::peer_address().extract(&req).is_err());
        assert!(ClientIpKeyExtractor::behind_proxy().extract(&req).is_err());
    }
}
