//! # Runtime Configuration Module
//!
//! Environment variable overrides for the routing settings in the
//! configuration file.
//!
//! ## Environment Variables
//!
//! | Variable                 | Overrides                 | Example |
//! |--------------------------|---------------------------|---------|
//! | `INKWELL_MUTABLE`        | `routing.mutable`         | `false` |
//! | `INKWELL_RESTLESS`       | `routing.restless`        | `0`     |
//! | `INKWELL_WORD_SEPARATOR` | `routing.word_separator`  | `+`     |
//! | `INKWELL_DEFAULT_STATUS` | `http.default_status`     | `410`   |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`. Values that do
//! not parse are logged and ignored.
//!
//! ## Usage
//!
//! ```rust
//! use inkwell_routing::config::AppConfig;
//! use inkwell_routing::runtime_config::RuntimeOverrides;
//!
//! let mut config = AppConfig::default();
//! RuntimeOverrides::from_env().apply(&mut config);
//! ```

use std::env;

use tracing::{debug, warn};

use crate::config::AppConfig;

pub const ENV_MUTABLE: &str = "INKWELL_MUTABLE";
pub const ENV_RESTLESS: &str = "INKWELL_RESTLESS";
pub const ENV_WORD_SEPARATOR: &str = "INKWELL_WORD_SEPARATOR";
pub const ENV_DEFAULT_STATUS: &str = "INKWELL_DEFAULT_STATUS";

/// Settings taken from the environment. `None` leaves the file value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOverrides {
    pub mutable: Option<bool>,
    pub restless: Option<bool>,
    pub word_separator: Option<String>,
    pub default_status: Option<u16>,
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl RuntimeOverrides {
    /// Load overrides from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load overrides through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            let raw = lookup(key)?;
            let parsed = parse_bool(&raw);
            if parsed.is_none() {
                warn!(variable = key, value = %raw, "Ignoring non-boolean override");
            }
            parsed
        };

        let default_status = lookup(ENV_DEFAULT_STATUS).and_then(|raw| {
            match raw.trim().parse::<u16>() {
                Ok(code) if (100..=599).contains(&code) => Some(code),
                _ => {
                    warn!(variable = ENV_DEFAULT_STATUS, value = %raw, "Ignoring invalid status override");
                    None
                }
            }
        });

        RuntimeOverrides {
            mutable: flag(ENV_MUTABLE),
            restless: flag(ENV_RESTLESS),
            word_separator: lookup(ENV_WORD_SEPARATOR),
            default_status,
        }
    }

    /// Write every present override into `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mutable) = self.mutable {
            debug!(mutable, "Applying mutable override");
            config.routing.mutable = mutable;
        }
        if let Some(restless) = self.restless {
            debug!(restless, "Applying restless override");
            config.routing.restless = restless;
        }
        if let Some(sep) = &self.word_separator {
            debug!(word_separator = %sep, "Applying word separator override");
            config.routing.word_separator = sep.clone();
        }
        if let Some(status) = self.default_status {
            debug!(default_status = status, "Applying default status override");
            config.http.default_status = status;
        }
    }
}
