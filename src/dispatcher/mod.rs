//! # Dispatcher Module
//!
//! Turns an [`ActionReference`] into a running action.
//!
//! ## Overview
//!
//! Links and handlers are bound to an action reference, which is one of:
//!
//! - a **callable**: a closure registered directly on the collection, or
//! - a **controller reference** (`Class::method`), constructed on demand
//!   through a [`Resolver`] and then invoked by method name.
//!
//! References are resolved lazily, at dispatch time. Registering a route for
//! a controller that does not exist is not an error until a request reaches
//! it.
//!
//! ## Resolver Boundary
//!
//! The [`Resolver`] trait is the seam with whatever dependency-injection
//! container the host uses. [`ControllerResolver`] is a plain registry of
//! factories by class name, with optional `prepare` hooks run on every
//! freshly constructed controller:
//!
//! ```rust
//! use inkwell_routing::dispatcher::{ActionContext, Controller, ControllerResolver};
//! use serde_json::{json, Value};
//!
//! struct Users;
//!
//! impl Controller for Users {
//!     fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
//!         match method {
//!             "show" => Ok(json!({ "id": ctx.param("id") })),
//!             other => anyhow::bail!("Users has no method '{other}'"),
//!         }
//!     }
//! }
//!
//! let mut resolver = ControllerResolver::new();
//! resolver.register("UsersController", |_params| Ok(Box::new(Users)));
//! assert_eq!(resolver.classes(), vec!["UsersController"]);
//! ```
//!
//! ## Captured Output
//!
//! Actions receive an [`ActionContext`] with an `output` buffer. Whether that
//! buffer or the returned value becomes the body is decided by
//! [`ActionContext::finish`] according to the engine's mutable setting.
//!
//! ## Error Handling
//!
//! Resolution and action failures surface as [`DispatchError`] and are
//! returned from `Engine::run` unchanged.

mod core;

pub use core::{
    invoke, ActionContext, ActionFn, ActionParseError, ActionReference, Configurator, Controller,
    ControllerFactory, ControllerResolver, DispatchError, ResolveError, Resolver,
};
