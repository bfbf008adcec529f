//! # Router Module
//!
//! Route patterns, their compiled matchers, the collection that holds them and
//! the engine that resolves requests against it.
//!
//! ## Overview
//!
//! Routing happens in two phases:
//!
//! 1. **Boot**: each pattern is parsed into [`Segment`]s and compiled into a
//!    [`CompiledRoute`] (an anchored regex plus ordered parameter names). Parse
//!    and compile errors are fatal here; nothing is compiled lazily.
//!
//! 2. **Request**: the [`Engine`] walks the [`Collection`] and produces a
//!    [`Resolution`]: dispatch to a link, redirect, or handle a status.
//!
//! ## Pattern syntax
//!
//! | Syntax          | Matches                                   |
//! |-----------------|-------------------------------------------|
//! | `:name`         | any non-slash text                        |
//! | `:name(regex)`  | text matching `regex`                     |
//! | `[!:name]`      | any non-slash text                        |
//! | `[#:name]`      | signed integer                            |
//! | `[+:name]`      | unsigned integer                          |
//! | `[%:name]`      | decimal number                            |
//! | `[$:name]`      | words joined by `_` or the word separator |
//! | `[*:name]`      | the rest of the path, slashes included    |
//!
//! ## Example
//!
//! ```rust
//! use inkwell_routing::router::{Collection, Resolution};
//! use inkwell_routing::{ControllerResolver, Engine};
//! use http::Method;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut routes = Collection::default();
//! routes.link("/", "/users/:id", "UsersController::show".parse()?)?;
//!
//! let engine = Engine::new(routes, Arc::new(ControllerResolver::new()));
//! match engine.resolve(&Method::GET, "/users/42") {
//!     Resolution::Dispatch { action, params, .. } => {
//!         assert_eq!(action, "UsersController::show");
//!         assert_eq!(params[0].1, "42");
//!     }
//!     other => panic!("unexpected {other}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Performance
//!
//! Matching is linear in the number of links. Each link first checks the
//! literal prefix of its pattern with `starts_with` and only runs the regex
//! when that passes. Parameters are collected into a [`ParamVec`], which stays
//! on the stack for up to [`MAX_INLINE_PARAMS`] values.

use smallvec::SmallVec;
use std::sync::Arc;

mod collection;
mod compiler;
mod engine;
mod parser;
#[cfg(test)]
mod tests;

/// Maximum inline parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered `(name, value)` pairs extracted from a path or query string.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

pub use collection::{
    join_url, normalize_base_url, remaining_path, Collection, Handler, Link, RedirectType,
    Redirect, RouteError,
};
pub use compiler::{BuildError, CompileError, CompiledRoute, Compiler, DEFAULT_WORD_SEPARATOR};
pub use engine::{Engine, Resolution, DEFAULT_STATUS, METHOD_NOT_ALLOWED};
pub use parser::{param_count, parse, Constraint, Param, ParamType, ParseError, Segment};
