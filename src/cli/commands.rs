use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use http::Method;
use tracing::warn;

use crate::config::load_effective_config;
use crate::dispatcher::ControllerResolver;
use crate::hot_reload::watch_config;
use crate::router::{Collection, Engine, Resolution};

/// Command-line interface for inkwell routing
///
/// Inspects, validates and exercises route configuration files without
/// running an application.
#[derive(Parser)]
#[command(name = "inkwell")]
#[command(about = "Inspect and test inkwell route configurations", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print every compiled link, redirect and handler
    Routes {
        /// Route configuration file (.yaml, .yml, .json or .toml)
        #[arg(short, long, env = "INKWELL_CONFIG")]
        config: PathBuf,
    },
    /// Compile every route and report the first error
    Check {
        /// Route configuration file (.yaml, .yml, .json or .toml)
        #[arg(short, long, env = "INKWELL_CONFIG")]
        config: PathBuf,
    },
    /// Show how a request would be resolved
    Resolve {
        /// Route configuration file (.yaml, .yml, .json or .toml)
        #[arg(short, long, env = "INKWELL_CONFIG")]
        config: PathBuf,

        /// HTTP method of the request
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, optionally with a query string
        path: String,
    },
    /// Watch the configuration and print the route table on every change
    Watch {
        /// Route configuration file (.yaml, .yml, .json or .toml)
        #[arg(short, long, env = "INKWELL_CONFIG")]
        config: PathBuf,
    },
}

fn load_engine(path: &Path) -> anyhow::Result<Engine> {
    let config = load_effective_config(path)?;
    Engine::from_config(&config, Arc::new(ControllerResolver::new()))
        .with_context(|| format!("Failed to compile routes from '{}'", path.display()))
}

fn write_routes<W: Write>(collection: &Collection, out: &mut W) -> anyhow::Result<()> {
    for line in collection.dump() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Run `cli`, writing command output to `out`.
pub fn run_cli_to<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Routes { config } => {
            let engine = load_engine(config)?;
            write_routes(&engine.collection(), out)?;
        }
        Commands::Check { config } => {
            let engine = load_engine(config)?;
            let collection = engine.collection();
            writeln!(
                out,
                "OK: {} links, {} redirects, {} handlers",
                collection.links().len(),
                collection.redirects().len(),
                collection.handlers().len()
            )?;
        }
        Commands::Resolve {
            config,
            method,
            path,
        } => {
            let engine = load_engine(config)?;
            let Ok(method) = Method::from_bytes(method.to_ascii_uppercase().as_bytes()) else {
                bail!("Invalid HTTP method '{method}'");
            };
            let request_path = path.split_once('?').map_or(path.as_str(), |(p, _)| p);
            let resolution = engine.resolve(&method, request_path);
            write!(out, "{resolution}")?;
            if let Resolution::Handle { status } = resolution {
                match engine.collection().handler_for(request_path, status) {
                    Some(handler) => write!(out, " via {}", handler.action)?,
                    None => write!(out, " (no handler)")?,
                }
            }
            writeln!(out)?;
        }
        Commands::Watch { config } => {
            let engine = Arc::new(load_engine(config)?);
            write_routes(&engine.collection(), out)?;
            out.flush()?;
            let _watcher = watch_config(config, Arc::clone(&engine), |collection| {
                let mut stdout = std::io::stdout().lock();
                let written = writeln!(stdout, "--- reloaded ---")
                    .map_err(anyhow::Error::from)
                    .and_then(|()| write_routes(collection, &mut stdout));
                if let Err(e) = written {
                    warn!(error = %e, "Failed to print reloaded routes");
                }
            })
            .with_context(|| format!("Failed to watch '{}'", config.display()))?;
            loop {
                std::thread::park();
            }
        }
    }
    Ok(())
}

/// Parse arguments and run, printing to stdout.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    run_cli_to(&cli, &mut stdout)
}
