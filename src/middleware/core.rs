use std::time::Duration;

use crate::resource::{Request, Response};
use crate::router::Resolution;

/// Hooks run around link and handler dispatch.
///
/// Every `before` hook runs; the first one to return a response
/// short-circuits the action. Every `after` hook runs, in registration order,
/// whether or not the action was skipped.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &Request, _resolution: &Resolution) -> Option<Response> {
        None
    }
    fn after(&self, _req: &Request, _resolution: &Resolution, _res: &mut Response, _latency: Duration) {}
}
