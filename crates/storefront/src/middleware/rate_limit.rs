//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for the login flow (~10/min)
//! - `mutation_rate_limiter`: relaxed limits for writes (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor for the client address.
///
/// Keys on the peer address. Proxy headers are honoured only when
/// `trust_proxy_headers` is set, since any client can send them.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor {
    pub trust_proxy_headers: bool,
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = forwarded_ip(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Client address reported by a reverse proxy.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // X-Forwarded-For (first IP in the chain)
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded_for.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Build a limiter replenishing one token every `period_secs`, with `burst`.
///
/// Returns `None` if the builder rejects the values (zero period or burst).
fn limiter(period_secs: u64, burst: u32, trust_proxy_headers: bool) -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor {
            trust_proxy_headers,
        })
        .per_second(period_secs)
        .burst_size(burst)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}

/// Rate limiter for the login flow: ~10 requests per minute per IP, burst of 5.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> Option<RateLimiterLayer> {
    limiter(6, 5, trust_proxy_headers)
}

/// Rate limiter for mutations: one token per second, burst of 50.
#[must_use]
pub fn mutation_rate_limiter(trust_proxy_headers: bool) -> Option<RateLimiterLayer> {
    limiter(1, 50, trust_proxy_headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    const DIRECT: ClientIpKeyExtractor = ClientIpKeyExtractor {
        trust_proxy_headers: false,
    };
    const BEHIND_PROXY: ClientIpKeyExtractor = ClientIpKeyExtractor {
        trust_proxy_headers: true,
    };

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((Ipv4Addr::LOCALHOST, 4000))));
        req
    }

    #[test]
    fn test_spoofed_headers_ignored_by_default() {
        let peer = IpAddr::V4(Ipv4Addr::LOCALHOST);
        for spoofed in ["203.0.113.7", "198.51.100.1"] {
            let req = request(&[("x-forwarded-for", spoofed), ("x-real-ip", spoofed)]);
            assert_eq!(DIRECT.extract(&req).unwrap(), peer);
        }
    }

    #[test]
    fn test_forwarded_header_wins_behind_proxy() {
        let req = request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        let ip = BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());

        let req = request(&[("x-real-ip", "198.51.100.1")]);
        let ip = BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let ip = BEHIND_PROXY.extract(&request(&[])).unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_missing_peer_address() {
        let req = Request::builder().body(()).unwrap();
        assert!(DIRECT.extract(&req).is_err());
    }

    #[test]
    fn test_limiters_build() {
        assert!(auth_rate_limiter(false).is_some());
        assert!(mutation_rate_limiter(true).is_some());
    }
}
