use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::resource::{Request, Response};
use crate::router::Resolution;

/// Logs each dispatched request with its outcome and latency.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &Request, resolution: &Resolution) -> Option<Response> {
        debug!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %req.path(),
            resolution = %resolution,
            "Request started"
        );
        None
    }

    fn after(&self, req: &Request, resolution: &Resolution, res: &mut Response, latency: Duration) {
        info!(
            request_id = %req.request_id(),
            method = %req.method(),
            path = %req.path(),
            resolution = %resolution,
            status = res.status(),
            latency_ms = latency.as_millis() as u64,
            "Request completed"
        );
    }
}
