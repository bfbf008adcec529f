use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use super::Middleware;
use crate::resource::{Request, Response};
use crate::router::Resolution;

/// Serializes structured bodies of `application/json` responses into their
/// final JSON text.
///
/// String bodies are assumed to be encoded already and are left alone, as are
/// responses of any other content type.
pub struct JsonEncodeMiddleware;

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

impl Middleware for JsonEncodeMiddleware {
    fn after(&self, _req: &Request, _resolution: &Resolution, res: &mut Response, _latency: Duration) {
        if !res.header("content-type").is_some_and(is_json) {
            return;
        }
        if matches!(res.get(), Value::String(_) | Value::Null) {
            return;
        }
        match serde_json::to_string(res.get()) {
            Ok(encoded) => res.set(Value::String(encoded)),
            Err(e) => warn!(error = %e, "Failed to encode JSON response body"),
        }
    }
}
