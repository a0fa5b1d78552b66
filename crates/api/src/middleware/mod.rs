//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. CORS
//! 6. Rate limiting on credential endpoints (governor)
//!
//! Bearer authentication is not a layer; handlers opt in with the
//! [`RequireAuth`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{AuthUser, RequireAdmin, RequireAuth};
pub use rate_limit::credentials_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
