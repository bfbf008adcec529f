//! Named response states: short aliases for status codes and their default
//! bodies.
//!
//! The table is an ordinary value built at boot and handed to the engine.
//! Nothing about it is process-global.

use serde::Deserialize;

/// Code and default body for one response state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseState {
    pub code: u16,
    #[serde(default)]
    pub body: Option<String>,
}

impl ResponseState {
    #[must_use]
    pub fn new(code: u16, body: Option<&str>) -> Self {
        Self {
            code,
            body: body.map(str::to_string),
        }
    }
}

/// Ordered table of response states keyed by normalized name.
///
/// Names are matched case-insensitively with spaces and dashes folded to
/// underscores, so `"Not Found"`, `"not-found"` and `"not_found"` are the
/// same state. Redirects never appear here; they are answered with a
/// location and no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStates {
    states: Vec<(String, ResponseState)>,
}

/// Fold a state name into its lookup key.
#[must_use]
pub fn normalize_state_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl Default for ResponseStates {
    fn default() -> Self {
        let defaults: [(&str, u16, Option<&str>); 13] = [
            ("ok", 200, None),
            ("created", 201, None),
            ("accepted", 202, None),
            ("no_content", 204, None),
            ("bad_request", 400, Some("The request could not be understood")),
            (
                "not_authorized",
                401,
                Some("The requested resource requires authorization"),
            ),
            (
                "forbidden",
                403,
                Some("You do not have permission to view the requested resource"),
            ),
            ("not_found", 404, Some("The requested resource could not be found")),
            (
                "not_allowed",
                405,
                Some("The requested resource does not support this method"),
            ),
            (
                "not_acceptable",
                406,
                Some("The requested resource is not available in the accepted parameters"),
            ),
            (
                "unsupported_mimetype",
                415,
                Some("The requested media type is not supported for this resource"),
            ),
            (
                "server_error",
                500,
                Some("The requested resource is not available due to an internal error"),
            ),
            (
                "unavailable",
                503,
                Some("The requested resource is temporarily unavailable"),
            ),
        ];

        Self {
            states: defaults
                .into_iter()
                .map(|(name, code, body)| (name.to_string(), ResponseState::new(code, body)))
                .collect(),
        }
    }
}

impl ResponseStates {
    /// An empty table with no states at all.
    #[must_use]
    pub fn empty() -> Self {
        Self { states: Vec::new() }
    }

    /// Add or replace a state.
    pub fn insert(&mut self, name: &str, state: ResponseState) {
        let key = normalize_state_name(name);
        match self.states.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = state,
            None => self.states.push((key, state)),
        }
    }

    /// Apply overrides in order on top of the current table.
    #[must_use]
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a ResponseState)>,
    {
        for (name, state) in overrides {
            self.insert(name, state.clone());
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResponseState> {
        let key = normalize_state_name(name);
        self.states.iter().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    /// Status code for a named state.
    #[must_use]
    pub fn code_for(&self, name: &str) -> Option<u16> {
        self.get(name).map(|s| s.code)
    }

    /// Default body for a status code, from the first state that uses it.
    #[must_use]
    pub fn message_for(&self, code: u16) -> Option<&str> {
        self.states
            .iter()
            .find(|(_, s)| s.code == code)
            .and_then(|(_, s)| s.body.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResponseState)> {
        self.states.iter().map(|(k, s)| (k.as_str(), s))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
