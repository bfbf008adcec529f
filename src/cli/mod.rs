//! # CLI Module
//!
//! Command-line tooling for route configuration files, available as the
//! `inkwell` binary.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print every compiled link, redirect and handler:
//!
//! ```bash
//! inkwell routes --config routes.yaml
//! ```
//!
//! ### `check`
//!
//! Compile every route and exit non-zero on the first error:
//!
//! ```bash
//! inkwell check --config routes.yaml
//! ```
//!
//! ### `resolve`
//!
//! Show the outcome for one request without running any action:
//!
//! ```bash
//! inkwell resolve --config routes.yaml --method POST /users
//! ```
//!
//! ### `watch`
//!
//! Reprint the route table whenever the file changes.
//!
//! `--config` may also be given through `INKWELL_CONFIG`. Routing settings
//! honour the `INKWELL_*` overrides described in [`crate::runtime_config`].

mod commands;


pub use commands::{run_cli, run_cli_to, Cli, Commands};
