//! # Configuration Module
//!
//! Route and engine configuration loaded from a YAML, JSON or TOML file.
//!
//! ## File Layout
//!
//! ```yaml
//! routing:
//!   mutable: true          # captured output replaces returned values
//!   restless: true         # /p and /p/ resolve the same way
//!   word_separator: "-"    # interchangeable with "_" in literals
//! http:
//!   default_status: 404
//!   response_states:
//!     not_found: { code: 404, body: "Nothing here" }
//! routes:
//!   - base_url: /
//!     links:
//!       /users/:id: UsersController::show
//!       /users:
//!         action: UsersController::create
//!         methods: [POST]
//!     handlers:
//!       404: ErrorController::not_found
//!     redirects:
//!       permanent:
//!         /old: /new
//! ```
//!
//! Every section is optional. `links`, `handlers`, `redirects` and
//! `response_states` keep the order they are written in, since the first
//! matching link wins.
//!
//! Environment overrides from [`crate::runtime_config`] are applied on top by
//! [`load_effective_config`].

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use anyhow::{bail, Context};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::resource::ResponseState;
use crate::router::{DEFAULT_STATUS, DEFAULT_WORD_SEPARATOR};
use crate::runtime_config::RuntimeOverrides;

/// A map that keeps its entries in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K, V> OrderedMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, value: V) {
        self.entries.push((key, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

struct OrderedMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K, V> Visitor<'de> for OrderedMapVisitor<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = OrderedMap<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry()? {
            entries.push((key, value));
        }
        Ok(OrderedMap { entries })
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::default())
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// A status code used as a map key. Accepts `404` or `"404"`, since YAML
/// keys may be integers while JSON and TOML keys are always strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusKey(pub u16);

struct StatusKeyVisitor;

impl Visitor<'_> for StatusKeyVisitor {
    type Value = StatusKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an HTTP status code")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<StatusKey, E> {
        u16::try_from(v)
            .map(StatusKey)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<StatusKey, E> {
        u16::try_from(v)
            .map(StatusKey)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<StatusKey, E> {
        v.trim()
            .parse()
            .map(StatusKey)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for StatusKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StatusKeyVisitor)
    }
}

/// Value of a `links` entry: a bare `Class::method`, or an action with a
/// method restriction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LinkTarget {
    Action(String),
    Detailed {
        action: String,
        #[serde(default)]
        methods: Vec<String>,
    },
}

impl LinkTarget {
    #[must_use]
    pub fn action(&self) -> &str {
        match self {
            LinkTarget::Action(action) | LinkTarget::Detailed { action, .. } => action,
        }
    }

    /// Allowed methods; empty means any.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        match self {
            LinkTarget::Action(_) => &[],
            LinkTarget::Detailed { methods, .. } => methods,
        }
    }
}

/// Routes registered under one base URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteBlock {
    pub base_url: String,
    pub links: OrderedMap<String, LinkTarget>,
    pub handlers: OrderedMap<StatusKey, String>,
    /// Redirects grouped by type (`permanent`, `found`, ...), then pattern
    /// to target.
    pub redirects: OrderedMap<String, OrderedMap<String, String>>,
}

impl Default for RouteBlock {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            links: OrderedMap::default(),
            handlers: OrderedMap::default(),
            redirects: OrderedMap::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub mutable: bool,
    pub restless: bool,
    pub word_separator: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mutable: true,
            restless: true,
            word_separator: DEFAULT_WORD_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub default_status: u16,
    /// Overrides and additions to the built-in response states.
    pub response_states: OrderedMap<String, ResponseState>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            default_status: DEFAULT_STATUS,
            response_states: OrderedMap::default(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub routing: RoutingConfig,
    pub http: HttpConfig,
    pub routes: Vec<RouteBlock>,
}

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick a format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Parse configuration text in the given format.
    pub fn from_str_with_format(contents: &str, format: ConfigFormat) -> anyhow::Result<Self> {
        let config = match format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(contents).context("Failed to parse YAML configuration")?
            }
            ConfigFormat::Json => {
                serde_json::from_str(contents).context("Failed to parse JSON configuration")?
            }
            ConfigFormat::Toml => {
                toml::from_str(contents).context("Failed to parse TOML configuration")?
            }
        };
        Ok(config)
    }

    /// Parse YAML configuration text.
    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        Self::from_str_with_format(contents, ConfigFormat::Yaml)
    }
}

/// Load configuration from `path`, picking the format by extension.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let Some(format) = ConfigFormat::from_path(path) else {
        bail!(
            "Unsupported configuration file '{}': expected .yaml, .yml, .json or .toml",
            path.display()
        );
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'", path.display()))?;
    AppConfig::from_str_with_format(&contents, format)
        .with_context(|| format!("Invalid configuration in '{}'", path.display()))
}

/// Load configuration from `path` and apply environment overrides.
pub fn load_effective_config(path: &Path) -> anyhow::Result<AppConfig> {
    let mut config = load_config(path)?;
    RuntimeOverrides::from_env().apply(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
routing:
  restless: false
routes:
  - base_url: /
    links:
      /zeta: Z::z
      /alpha: A::a
      /items:
        action: Items::create
        methods: [POST]
    handlers:
      404: Errors::not_found
      "500": Errors::crash
    redirects:
      permanent:
        /old: /new
  - base_url: /admin
"#;

    #[test]
    fn test_yaml_keeps_link_order() {
        let config = AppConfig::from_yaml_str(YAML).unwrap();
        let links: Vec<&str> = config.routes[0].links.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(links, vec!["/zeta", "/alpha", "/items"]);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_yaml_str(YAML).unwrap();
        assert!(config.routing.mutable);
        assert!(!config.routing.restless);
        assert_eq!(config.routing.word_separator, "-");
        assert_eq!(config.http.default_status, 404);
        assert_eq!(config.routes[1].base_url, "/admin");
        assert!(config.routes[1].links.is_empty());
    }

    #[test]
    fn test_link_targets_and_status_keys() {
        let config = AppConfig::from_yaml_str(YAML).unwrap();
        let block = &config.routes[0];
        let (_, items) = block.links.iter().nth(2).unwrap();
        assert_eq!(items.action(), "Items::create");
        assert_eq!(items.methods(), ["POST".to_string()]);

        let statuses: Vec<u16> = block.handlers.iter().map(|(k, _)| k.0).collect();
        assert_eq!(statuses, vec![404, 500]);
    }

    #[test]
    fn test_json_config() {
        let json = r#"{
            "http": {"default_status": 410, "response_states": {"gone": {"code": 410, "body": "Gone"}}},
            "routes": [{"handlers": {"410": "Errors::gone"}}]
        }"#;
        let config = AppConfig::from_str_with_format(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.http.default_status, 410);
        assert_eq!(config.http.response_states.len(), 1);
        assert_eq!(config.routes[0].base_url, "/");
        assert_eq!(config.routes[0].handlers.iter().next().unwrap().0 .0, 410);
    }

    #[test]
    fn test_toml_config() {
        let toml = r#"
[routing]
word_separator = "+"

[[routes]]
base_url = "/blog"

[routes.links]
"/posts/:id" = "Posts::show"
"#;
        let config = AppConfig::from_str_with_format(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.routing.word_separator, "+");
        assert_eq!(config.routes[0].base_url, "/blog");
        assert_eq!(config.routes[0].links.len(), 1);
    }

    #[test]
    fn test_toml_keeps_link_order() {
        let toml = r#"
[[routes]]
base_url = "/"

[routes.links]
"/zeta/:x" = "Z::first"
"/alpha" = "A::show"
"/[!:any]/:y" = "Z::second"
"#;
        let config = AppConfig::from_str_with_format(toml, ConfigFormat::Toml).unwrap();
        let links: Vec<&str> = config.routes[0].links.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(links, vec!["/zeta/:x", "/alpha", "/[!:any]/:y"]);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/routes.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("r.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("r.ini")), None);
        assert!(load_config(Path::new("routes.ini")).is_err());
    }
}
