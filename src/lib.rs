//! # inkwell-routing
//!
//! **inkwell-routing** is a route-matching and dispatch engine for MVC-style web
//! applications. Route definitions are compiled into matchers once at boot;
//! each request is then resolved to exactly one outcome: a controller action,
//! a redirect, or a status handler.
//!
//! ## Overview
//!
//! The crate does not own a transport. A host server builds a
//! [`Request`](resource::Request), hands it to [`Engine::run`] together with a
//! fresh [`Response`](resource::Response), and writes back whatever comes out.
//!
//! ## Architecture
//!
//! - **[`router`]** - Pattern parsing and compilation, the route collection and the engine
//! - **[`dispatcher`]** - Action references, the resolver boundary and action invocation
//! - **[`resource`]** - Request, response and named response states
//! - **[`middleware`]** - Hooks around dispatch (tracing, JSON body encoding)
//! - **[`config`]** - YAML/JSON/TOML route configuration
//! - **[`runtime_config`]** - `INKWELL_*` environment overrides
//! - **[`logging`]** - `tracing-subscriber` setup
//! - **[`hot_reload`]** - Swap in a new route collection when the config changes
//! - **[`cli`]** - The `inkwell` command-line tool
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host server
//!     participant Engine
//!     participant Collection
//!     participant Middleware as Middleware Chain
//!     participant Resolver
//!     participant Action
//!
//!     Host->>Engine: run(request, response)
//!     Engine->>Collection: load snapshot
//!     Engine->>Engine: match links in order<br/>(literal prefix, regex, method)
//!
//!     alt No link matched and restless
//!         Engine->>Engine: retry with trailing slash toggled
//!     end
//!
//!     alt Link matched
//!         Engine->>Middleware: before()
//!         Engine->>Resolver: make(class, params)
//!         Resolver-->>Engine: controller
//!         Engine->>Action: call(method, ctx)
//!         Action-->>Engine: returned value + captured output
//!         Engine->>Engine: settle body (mutable policy)
//!         Engine->>Middleware: after()
//!     else Path matched, method did not
//!         Engine->>Collection: handler_for(path, 405)
//!     else Redirect matched
//!         Engine->>Engine: 3xx + Location, empty body
//!     else Nothing matched
//!         Engine->>Collection: handler_for(path, 404)
//!         Engine->>Action: run handler, or use the state message
//!     end
//!
//!     Engine-->>Host: Response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use inkwell_routing::dispatcher::ActionReference;
//! use inkwell_routing::resource::{Request, Response};
//! use inkwell_routing::router::{Collection, RedirectType};
//! use inkwell_routing::{ControllerResolver, Engine};
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut routes = Collection::default();
//! routes.link(
//!     "/",
//!     "/hello/:name",
//!     ActionReference::callable("hello", |ctx| {
//!         Ok(json!(format!("Hello, {}!", ctx.param("name").unwrap_or("world"))))
//!     }),
//! )?;
//! routes.redirect("/", "/hi/:name", "/hello/:name", RedirectType::Permanent)?;
//!
//! let engine = Engine::new(routes, Arc::new(ControllerResolver::new()));
//!
//! let res = engine.run(&Request::new(Method::GET, "/hello/ada"), Response::new())?;
//! assert_eq!(res.get(), &json!("Hello, ada!"));
//!
//! let res = engine.run(&Request::new(Method::GET, "/hi/ada"), Response::new())?;
//! assert_eq!(res.status(), 301);
//! assert_eq!(res.header("location"), Some("/hello/ada"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Routes are usually loaded from a file; see [`config`] for the layout and
//! [`Engine::from_config`] for wiring it up.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod hot_reload;
pub mod logging;
pub mod middleware;
pub mod resource;
pub mod router;
pub mod runtime_config;

pub use config::{load_config, load_effective_config, AppConfig};
pub use dispatcher::{ActionReference, Controller, ControllerResolver, Resolver};
pub use router::{Collection, Engine, Resolution};
