//! Routing engine: resolves a request to exactly one outcome and executes it.
//!
//! Resolution order for a request path:
//!
//! 1. Links, in registration order. The first whose pattern and method both
//!    accept the request wins.
//! 2. In restless mode, links again with the trailing slash toggled.
//! 3. 405 when some link matched the path but none accepted the method.
//!    Redirects on the same path are not consulted.
//! 4. Redirects, in registration order.
//! 5. A status handler for the default status (404).
//!
//! Matching never fails; only dispatch does.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use http::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::collection::{Collection, Link, RedirectType, RouteError};
use super::compiler::BuildError;
use super::ParamVec;
use crate::config::AppConfig;
use crate::dispatcher::{invoke, ActionContext, ActionReference, DispatchError, Resolver};
use crate::middleware::Middleware;
use crate::resource::{Request, Response, ResponseStates};

/// Status answered when no route matches.
pub const DEFAULT_STATUS: u16 = 404;

/// Status answered when a path matched but its method did not.
pub const METHOD_NOT_ALLOWED: u16 = 405;

/// Outcome of matching a method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Run the action of the link at `index` in the collection.
    Dispatch {
        index: usize,
        action: String,
        pattern: String,
        params: ParamVec,
    },
    /// Answer with a redirect and no body.
    Redirect { location: String, kind: RedirectType },
    /// Answer with a status, through its handler if one is registered.
    Handle { status: u16 },
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Dispatch {
                action,
                pattern,
                params,
                ..
            } => {
                write!(f, "dispatch {action} via {pattern}")?;
                if !params.is_empty() {
                    let rendered: Vec<String> =
                        params.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    write!(f, " [{}]", rendered.join(", "))?;
                }
                Ok(())
            }
            Resolution::Redirect { location, kind } => {
                write!(f, "redirect {} -> {location}", kind.status())
            }
            Resolution::Handle { status } => write!(f, "handle {status}"),
        }
    }
}

enum LinkMatch<'c> {
    Found(usize, &'c Link, ParamVec),
    MethodRejected,
    None,
}

fn match_links<'c>(links: &'c [Link], method: &Method, path: &str) -> LinkMatch<'c> {
    let mut rejected = false;
    for (index, link) in links.iter().enumerate() {
        let Some(params) = link.match_path(path) else {
            continue;
        };
        if link.accepts_method(method) {
            return LinkMatch::Found(index, link, params);
        }
        debug!(
            method = %method,
            path = %path,
            pattern = %link.full_pattern(),
            "Route matched path but not method"
        );
        rejected = true;
    }
    if rejected {
        LinkMatch::MethodRejected
    } else {
        LinkMatch::None
    }
}

/// Toggle the trailing slash of `path`. `None` for the root.
fn toggle_trailing_slash(path: &str) -> Option<String> {
    if path == "/" || path.is_empty() {
        None
    } else if let Some(stripped) = path.strip_suffix('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("{path}/"))
    }
}

/// A resolution still borrowing the matched link from its snapshot.
enum Outcome<'c> {
    Dispatch {
        index: usize,
        link: &'c Link,
        params: ParamVec,
    },
    Redirect {
        location: String,
        kind: RedirectType,
    },
    Handle {
        status: u16,
    },
}

impl Outcome<'_> {
    fn to_resolution(&self) -> Resolution {
        match self {
            Outcome::Dispatch {
                index,
                link,
                params,
            } => Resolution::Dispatch {
                index: *index,
                action: link.action.to_string(),
                pattern: link.full_pattern(),
                params: params.clone(),
            },
            Outcome::Redirect { location, kind } => Resolution::Redirect {
                location: location.clone(),
                kind: *kind,
            },
            Outcome::Handle { status } => Resolution::Handle { status: *status },
        }
    }
}

/// The routing engine.
///
/// Holds the route collection behind an [`ArcSwap`] so it can be replaced
/// while requests are in flight; each request works against one snapshot.
pub struct Engine {
    collection: ArcSwap<Collection>,
    resolver: Arc<dyn Resolver>,
    middlewares: Vec<Arc<dyn Middleware>>,
    states: ResponseStates,
    mutable: bool,
    restless: bool,
    default_status: u16,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let collection = self.collection.load();
        f.debug_struct("Engine")
            .field("links", &collection.links().len())
            .field("redirects", &collection.redirects().len())
            .field("handlers", &collection.handlers().len())
            .field("middlewares", &self.middlewares.len())
            .field("mutable", &self.mutable)
            .field("restless", &self.restless)
            .field("default_status", &self.default_status)
            .finish()
    }
}

impl Engine {
    /// An engine over `collection`, mutable and restless, answering 404
    /// with the default response states.
    pub fn new(collection: Collection, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            collection: ArcSwap::from_pointee(collection),
            resolver,
            middlewares: Vec::new(),
            states: ResponseStates::default(),
            mutable: true,
            restless: true,
            default_status: DEFAULT_STATUS,
        }
    }

    /// Build the collection and engine settings from configuration.
    pub fn from_config(config: &AppConfig, resolver: Arc<dyn Resolver>) -> Result<Self, RouteError> {
        let collection = Collection::from_config(&config.routes, &config.routing.word_separator)?;
        let states = ResponseStates::default().with_overrides(config.http.response_states.iter());
        let mut engine = Self::new(collection, resolver).with_states(states);
        engine.set_mutable(config.routing.mutable);
        engine.set_restless(config.routing.restless);
        engine.set_default_status(config.http.default_status);
        Ok(engine)
    }

    /// When set, captured action output replaces the returned value.
    pub fn set_mutable(&mut self, mutable: bool) {
        self.mutable = mutable;
    }

    /// When set, `/p` and `/p/` are treated as the same link path.
    pub fn set_restless(&mut self, restless: bool) {
        self.restless = restless;
    }

    pub fn set_default_status(&mut self, status: u16) {
        self.default_status = status;
    }

    #[must_use]
    pub fn with_states(mut self, states: ResponseStates) -> Self {
        self.states = states;
        self
    }

    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    #[must_use]
    pub fn is_restless(&self) -> bool {
        self.restless
    }

    #[must_use]
    pub fn default_status(&self) -> u16 {
        self.default_status
    }

    #[must_use]
    pub fn states(&self) -> &ResponseStates {
        &self.states
    }

    /// Current collection snapshot.
    #[must_use]
    pub fn collection(&self) -> Arc<Collection> {
        self.collection.load_full()
    }

    /// Atomically swap in a new collection. Requests already running keep
    /// the snapshot they started with.
    pub fn replace_collection(&self, collection: Collection) {
        info!(
            links = collection.links().len(),
            redirects = collection.redirects().len(),
            handlers = collection.handlers().len(),
            "Replacing route collection"
        );
        self.collection.store(Arc::new(collection));
    }

    /// Match `method` and `path` against the current collection.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let collection = self.collection.load();
        self.resolve_in(&collection, method, path).to_resolution()
    }

    fn resolve_in<'c>(&self, collection: &'c Collection, method: &Method, path: &str) -> Outcome<'c> {
        debug!(method = %method, path = %path, "Route match attempt");

        let links = collection.links();
        let mut outcome = match_links(links, method, path);

        if self.restless && matches!(outcome, LinkMatch::None) {
            if let Some(toggled) = toggle_trailing_slash(path) {
                debug!(path = %path, toggled = %toggled, "Retrying with trailing slash toggled");
                outcome = match_links(links, method, &toggled);
            }
        }

        match outcome {
            LinkMatch::Found(index, link, params) => {
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %link.full_pattern(),
                    action = %link.action,
                    params = ?params,
                    "Route matched"
                );
                return Outcome::Dispatch {
                    index,
                    link,
                    params,
                };
            }
            LinkMatch::MethodRejected => {
                debug!(method = %method, path = %path, "Method not allowed");
                return Outcome::Handle {
                    status: METHOD_NOT_ALLOWED,
                };
            }
            LinkMatch::None => {}
        }

        for redirect in collection.redirects() {
            if let Some(params) = redirect.match_path(path) {
                let location = redirect.location(&params);
                debug!(
                    path = %path,
                    location = %location,
                    status = redirect.kind.status(),
                    "Route redirected"
                );
                return Outcome::Redirect {
                    location,
                    kind: redirect.kind,
                };
            }
        }

        debug!(method = %method, path = %path, status = self.default_status, "No route matched");
        Outcome::Handle {
            status: self.default_status,
        }
    }

    /// Resolve `request` and execute the outcome on `response`.
    ///
    /// Action and resolver failures are returned unchanged. The engine never
    /// turns them into a response.
    pub fn run(&self, request: &Request, mut response: Response) -> Result<Response, DispatchError> {
        let collection = self.collection.load_full();
        let outcome = self.resolve_in(&collection, request.method(), request.path());
        let resolution = outcome.to_resolution();

        match outcome {
            Outcome::Dispatch { link, params, .. } => {
                self.dispatch(request, &resolution, &link.action, response, params)
            }
            Outcome::Redirect { location, kind } => {
                info!(
                    request_id = %request.request_id(),
                    path = %request.path(),
                    location = %location,
                    status = kind.status(),
                    "Redirecting"
                );
                response.redirect(&location, kind);
                Ok(response)
            }
            Outcome::Handle { status } => {
                response.set_status(status);
                match collection.handler_for(request.path(), status) {
                    Some(handler) => {
                        debug!(
                            request_id = %request.request_id(),
                            status,
                            base_url = %handler.base_url,
                            action = %handler.action,
                            "Handler dispatch"
                        );
                        self.dispatch(request, &resolution, &handler.action, response, ParamVec::new())
                    }
                    None => {
                        debug!(
                            request_id = %request.request_id(),
                            status,
                            "No handler registered, using default state message"
                        );
                        response.set(
                            self.states
                                .message_for(status)
                                .map_or(Value::Null, |m| Value::String(m.to_string())),
                        );
                        Ok(response)
                    }
                }
            }
        }
    }

    fn dispatch(
        &self,
        request: &Request,
        resolution: &Resolution,
        action: &ActionReference,
        response: Response,
        params: ParamVec,
    ) -> Result<Response, DispatchError> {
        let mut early: Option<Response> = None;
        for mw in &self.middlewares {
            if early.is_none() {
                early = mw.before(request, resolution);
            } else {
                mw.before(request, resolution);
            }
        }

        let (mut response, latency) = match early {
            Some(r) => (r, Duration::ZERO),
            None => {
                let start = Instant::now();
                let mut ctx = ActionContext::new(request, response, params);
                let returned = invoke(action, self.resolver.as_ref(), &mut ctx)?;
                (ctx.finish(self.mutable, returned), start.elapsed())
            }
        };

        for mw in &self.middlewares {
            mw.after(request, resolution, &mut response, latency);
        }

        if response.status() >= 500 {
            warn!(
                request_id = %request.request_id(),
                action = %action,
                status = response.status(),
                "Action completed with server error status"
            );
        } else {
            debug!(
                request_id = %request.request_id(),
                action = %action,
                status = response.status(),
                latency_us = latency.as_micros() as u64,
                "Action complete"
            );
        }
        Ok(response)
    }

    /// Reverse routing against the current collection.
    pub fn url_for<'a, I>(&self, action_name: &str, params: I) -> Result<String, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.collection.load().url_for(action_name, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_trailing_slash() {
        assert_eq!(toggle_trailing_slash("/"), None);
        assert_eq!(toggle_trailing_slash("/p"), Some("/p/".to_string()));
        assert_eq!(toggle_trailing_slash("/p/"), Some("/p".to_string()));
    }

    #[test]
    fn test_resolution_display() {
        let mut params = ParamVec::new();
        params.push((Arc::from("id"), "42".to_string()));
        let r = Resolution::Dispatch {
            index: 0,
            action: "Users::show".into(),
            pattern: "/users/:id".into(),
            params,
        };
        assert_eq!(r.to_string(), "dispatch Users::show via /users/:id [id=42]");
        let r = Resolution::Redirect {
            location: "/new".into(),
            kind: RedirectType::Permanent,
        };
        assert_eq!(r.to_string(), "redirect 301 -> /new");
        assert_eq!(Resolution::Handle { status: 404 }.to_string(), "handle 404");
    }
}
