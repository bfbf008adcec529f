use std::io::{self, Write};
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;

use super::request::HeaderVec;
use super::states::ResponseStates;
use crate::router::RedirectType;

/// Reason phrase for a status code, `"Unknown"` when there is none.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

fn strip_line_breaks(text: String) -> String {
    if text.contains(['\r', '\n']) {
        text.replace(['\r', '\n'], "")
    } else {
        text
    }
}

/// Outgoing response built up by the engine and actions.
///
/// The body is a JSON value: strings are sent as text, `null` as nothing,
/// anything else as serialized JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: HeaderVec,
    body: Value,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// A `200 OK` response with no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Value::Null,
        }
    }

    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Set the status from a named state. Returns `false`, leaving the
    /// response untouched, when the state is unknown.
    pub fn set_state(&mut self, states: &ResponseStates, name: &str) -> bool {
        match states.get(name) {
            Some(state) => {
                self.status = state.code;
                if let Some(body) = &state.body {
                    self.body = Value::String(body.clone());
                }
                true
            }
            None => false,
        }
    }

    /// Replace the body.
    pub fn set(&mut self, body: Value) {
        self.body = body;
    }

    #[must_use]
    pub fn get(&self) -> &Value {
        &self.body
    }

    pub fn take_body(&mut self) -> Value {
        std::mem::take(&mut self.body)
    }

    /// Get a header by name (case-insensitive)
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

    /// Add or update a header
    ///
    /// CR and LF are removed from the name and value so a value carrying
    /// request data (a redirect `Location`) cannot start a new header line.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let name = strip_line_breaks(name.to_string());
        let value = strip_line_breaks(value.into());
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((Arc::from(name), value));
    }

    /// Turn this into a bodiless redirect to `location`.
    pub fn redirect(&mut self, location: &str, kind: RedirectType) {
        self.status = kind.status();
        self.body = Value::Null;
        self.set_header("Location", location);
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.header("location").is_some()
    }

    /// Body as bytes plus the content type implied by its shape.
    fn encode_body(&self) -> io::Result<(Vec<u8>, Option<&'static str>)> {
        match &self.body {
            Value::Null => Ok((Vec::new(), None)),
            Value::String(s) => Ok((s.as_bytes().to_vec(), Some("text/plain; charset=utf-8"))),
            other => serde_json::to_vec(other)
                .map(|bytes| (bytes, Some("application/json")))
                .map_err(io::Error::other),
        }
    }

    /// Write this response as an HTTP/1.1 message.
    ///
    /// With `headers_only` (HEAD requests) the status line and headers are
    /// written, including the `Content-Length` the body would have had, but
    /// not the body itself.
    pub fn send<W: Write>(&self, out: &mut W, headers_only: bool) -> io::Result<()> {
        let (body, implied_type) = self.encode_body()?;

        write!(out, "HTTP/1.1 {} {}\r\n", self.status, status_reason(self.status))?;
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            write!(out, "{name}: {value}\r\n")?;
        }
        if let Some(content_type) = implied_type {
            if self.header("content-type").is_none() {
                write!(out, "Content-Type: {content_type}\r\n")?;
            }
        }
        write!(out, "Content-Length: {}\r\n\r\n", body.len())?;

        if !headers_only {
            out.write_all(&body)?;
        }
        out.flush()
    }
}
