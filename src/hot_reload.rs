//! # Hot Reload Module
//!
//! Watches the route configuration file and swaps a freshly built
//! [`Collection`] into a running [`Engine`] when it changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inkwell_routing::hot_reload::watch_config;
//! use std::sync::Arc;
//!
//! let engine = Arc::new(Engine::from_config(&config, resolver)?);
//! let watcher = watch_config("routes.yaml", Arc::clone(&engine), |collection| {
//!     println!("Reloaded {} links", collection.links().len());
//! })?;
//!
//! // Reloading stops when the watcher is dropped
//! ```
//!
//! ## Reload Process
//!
//! 1. The watcher sees a modify or create event for the file.
//! 2. The file is loaded with environment overrides applied.
//! 3. Every route is parsed and compiled into a new collection.
//! 4. The new collection is swapped in atomically. In-flight requests finish
//!    on the snapshot they started with.
//! 5. The callback runs with the new collection.
//!
//! Only routes are reloaded. Engine settings (`mutable`, `restless`, default
//! status, response states) keep their boot values.
//!
//! ## Error Handling
//!
//! A file that fails to load or compile is logged and ignored; the previous
//! collection stays active.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{error, info, warn};

use crate::config::load_effective_config;
use crate::router::{Collection, Engine};

/// Rebuild the collection from `path` and swap it into `engine`.
///
/// On error the engine is left untouched.
pub fn reload(path: &Path, engine: &Engine) -> anyhow::Result<Arc<Collection>> {
    let config = load_effective_config(path)?;
    let collection = Collection::from_config(&config.routes, &config.routing.word_separator)
        .with_context(|| format!("Failed to compile routes from '{}'", path.display()))?;
    engine.replace_collection(collection);
    Ok(engine.collection())
}

/// Watch `config_path` and reload `engine` when it changes.
///
/// The watcher stops when the returned handle is dropped.
pub fn watch_config<P, F>(
    config_path: P,
    engine: Arc<Engine>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&Collection) + Send + 'static,
{
    let path: PathBuf = config_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                match reload(&watch_path, &engine) {
                    Ok(collection) => {
                        info!(
                            path = %watch_path.display(),
                            links = collection.links().len(),
                            "hot-reload: applied route updates"
                        );
                        on_reload(&collection);
                    }
                    Err(e) => warn!(
                        path = %watch_path.display(),
                        error = %format!("{e:#}"),
                        "hot-reload: keeping previous routes"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
