//! Before/after hooks around dispatch.

mod core;
mod json;
mod tracing;

pub use core::Middleware;
pub use json::JsonEncodeMiddleware;
pub use tracing::TracingMiddleware;
