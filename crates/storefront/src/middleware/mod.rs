//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Panic boundary (render fallback page)
//! 2. Sentry layer (capture errors)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. CSP nonce (generate per-request nonce for inline scripts)
//! 6. Session layer (tower-sessions, in-memory store)
//! 7. Security headers (CSP, frame options, etc.)
//! 8. Rate limiting on auth and mutation routes (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalIdentity, RequireIdentity, clear_identity, is_htmx, set_identity};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{RateLimiterLayer, auth_rate_limiter, mutation_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
