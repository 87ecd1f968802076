//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with a moka-backed store)

pub mod customer;
pub mod request_id;
pub mod session;

pub use customer::OptionalCustomer;
pub use request_id::request_id_middleware;
pub use session::{MokaSessionStore, create_session_layer};
