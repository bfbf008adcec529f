use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use ulid::Ulid;

use crate::router::ParamVec;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage. Names are `Arc<str>` so common names
/// clone cheaply.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Header used to carry a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// An incoming request as seen by the routing engine.
///
/// The engine only needs the method and path; headers, query parameters and
/// body are carried through to actions.
#[derive(Debug, Clone)]
pub struct Request {
    request_id: Ulid,
    method: Method,
    path: String,
    headers: HeaderVec,
    query_params: ParamVec,
    body: Option<Value>,
}

impl Request {
    /// Build a request from a method and request target.
    ///
    /// The query string, if any, is split off and decoded into
    /// [`Request::query_param`] values.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query_params(query)),
            None => (target, ParamVec::new()),
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            request_id: Ulid::new(),
            method,
            path: path.to_string(),
            headers: HeaderVec::new(),
            query_params,
            body: None,
        }
    }

    /// Add a header. An `x-request-id` holding a valid ULID replaces the
    /// generated id so logs correlate with the caller.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            if let Ok(id) = Ulid::from_string(value.trim()) {
                self.request_id = id;
            }
        }
        self.headers.push((Arc::from(name.to_ascii_lowercase()), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn request_id(&self) -> Ulid {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the request was made with `method`. A HEAD request also
    /// satisfies a check for GET.
    #[inline]
    #[must_use]
    pub fn check_method(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::GET && self.method == Method::HEAD)
    }

    /// HEAD requests are answered with headers only.
    #[inline]
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Get a query parameter by name. Last occurrence wins.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_params(&self) -> &ParamVec {
        &self.query_params
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Decode a query string (`a=1&b=two`) into ordered pairs.
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
