//! HTTP middleware for the chat service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `CatchPanicLayer` (panics become 500 responses)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. CORS

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
