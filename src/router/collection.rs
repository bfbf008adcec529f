//! Route collection: the registry of links, handlers and redirects.
//!
//! Every pattern is parsed and compiled when it is registered, so a bad route
//! fails at boot rather than on the first request that reaches it. Entries are
//! kept in registration order and duplicates are allowed; the engine takes the
//! first match.

use std::fmt;
use std::str::FromStr;

use http::Method;
use tracing::{debug, info};

use super::compiler::{BuildError, CompileError, CompiledRoute, Compiler};
use super::parser::{parse, ParseError};
use super::ParamVec;
use crate::config::RouteBlock;
use crate::dispatcher::{ActionParseError, ActionReference};

/// Kind of redirect, and the status it is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectType {
    /// 301
    Permanent,
    /// 302, also spelled `internal` in route configuration
    Found,
    /// 303
    SeeOther,
    /// 307
    Temporary,
}

impl RedirectType {
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            RedirectType::Permanent => 301,
            RedirectType::Found => 302,
            RedirectType::SeeOther => 303,
            RedirectType::Temporary => 307,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectType::Permanent => "permanent",
            RedirectType::Found => "found",
            RedirectType::SeeOther => "see_other",
            RedirectType::Temporary => "temporary",
        }
    }
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedirectType {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "permanent" | "301" => Ok(RedirectType::Permanent),
            "found" | "internal" | "302" => Ok(RedirectType::Found),
            "see_other" | "303" => Ok(RedirectType::SeeOther),
            "temporary" | "307" => Ok(RedirectType::Temporary),
            _ => Err(RouteError::InvalidRedirectType {
                value: s.to_string(),
            }),
        }
    }
}

/// Error raised while registering a route. Always fatal at boot.
#[derive(Debug)]
pub enum RouteError {
    Parse(ParseError),
    Compile(CompileError),
    InvalidAction(ActionParseError),
    InvalidRedirectType { value: String },
    InvalidMethod { value: String },
    InvalidStatus { status: u16 },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Parse(e) => write!(f, "{e}"),
            RouteError::Compile(e) => write!(f, "{e}"),
            RouteError::InvalidAction(e) => write!(f, "{e}"),
            RouteError::InvalidRedirectType { value } => write!(
                f,
                "unknown redirect type '{value}' (expected permanent, found, internal, see_other, temporary or a 3xx code)"
            ),
            RouteError::InvalidMethod { value } => write!(f, "invalid HTTP method '{value}'"),
            RouteError::InvalidStatus { status } => {
                write!(f, "handler status {status} is not an HTTP status code")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Parse(e) => Some(e),
            RouteError::Compile(e) => Some(e),
            RouteError::InvalidAction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for RouteError {
    fn from(e: ParseError) -> Self {
        RouteError::Parse(e)
    }
}

impl From<CompileError> for RouteError {
    fn from(e: CompileError) -> Self {
        RouteError::Compile(e)
    }
}

impl From<ActionParseError> for RouteError {
    fn from(e: ActionParseError) -> Self {
        RouteError::InvalidAction(e)
    }
}

/// Normalize a base URL: leading slash present, trailing slash stripped,
/// root is `/`.
#[must_use]
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Ensure a route pattern starts with `/`. An empty pattern is the root.
fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim();
    if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    }
}

/// The part of `path` below `base_url`, or `None` when the path is outside it.
///
/// A path equal to the base URL leaves `/`. The base URL with a trailing
/// slash leaves `None`; only the restless retry reaches the base root that way.
#[inline]
#[must_use]
pub fn remaining_path<'a>(base_url: &str, path: &'a str) -> Option<&'a str> {
    if base_url == "/" {
        return Some(path);
    }
    let rest = path.strip_prefix(base_url)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') && rest != "/" {
        Some(rest)
    } else {
        None
    }
}

/// Whether `path` is `base_url` itself or lies below it.
fn within_base(base_url: &str, path: &str) -> bool {
    base_url == "/"
        || path
            .strip_prefix(base_url)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Join a path written relative to `base_url` back onto it.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    if base_url == "/" {
        path.to_string()
    } else if path == "/" || path.is_empty() {
        base_url.to_string()
    } else {
        format!("{base_url}{path}")
    }
}

/// A pattern bound to an action.
#[derive(Debug, Clone)]
pub struct Link {
    pub base_url: String,
    pub pattern: String,
    pub action: ActionReference,
    pub methods: Option<Vec<Method>>,
    pub compiled: CompiledRoute,
}

impl Link {
    /// Match `path` against this link, ignoring the method.
    #[inline]
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let rest = remaining_path(&self.base_url, path)?;
        self.compiled.captures(rest)
    }

    /// Whether `method` is allowed. HEAD is allowed wherever GET is.
    #[must_use]
    pub fn accepts_method(&self, method: &Method) -> bool {
        match &self.methods {
            None => true,
            Some(allowed) => {
                allowed.contains(method)
                    || (*method == Method::HEAD && allowed.contains(&Method::GET))
            }
        }
    }

    /// Full pattern including the base URL.
    #[must_use]
    pub fn full_pattern(&self) -> String {
        join_url(&self.base_url, &self.pattern)
    }
}

/// An action answering a status under a base URL.
#[derive(Debug, Clone)]
pub struct Handler {
    pub base_url: String,
    pub status: u16,
    pub action: ActionReference,
}

/// A pattern that answers with a redirect instead of an action.
#[derive(Debug, Clone)]
pub struct Redirect {
    pub base_url: String,
    pub pattern: String,
    pub target: String,
    pub kind: RedirectType,
    pub compiled: CompiledRoute,
}

impl Redirect {
    #[inline]
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let rest = remaining_path(&self.base_url, path)?;
        self.compiled.captures(rest)
    }

    /// Final `Location` for a match: `:name` placeholders are filled from
    /// `params`, and a target starting with `/` is joined onto the base URL.
    #[must_use]
    pub fn location(&self, params: &ParamVec) -> String {
        let target = substitute_placeholders(&self.target, params);
        if target.starts_with('/') {
            join_url(&self.base_url, &target)
        } else {
            target
        }
    }
}

/// Replace `:name` in `target` with the matching captured value. Unknown
/// names are left as written.
fn substitute_placeholders(target: &str, params: &ParamVec) -> String {
    if params.is_empty() || !target.contains(':') {
        return target.to_string();
    }
    let mut out = String::with_capacity(target.len());
    let mut rest = target;
    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .char_indices()
            .find(|(i, c)| {
                !(c.is_ascii_alphanumeric() || *c == '_') || (*i == 0 && c.is_ascii_digit())
            })
            .map_or(after.len(), |(i, _)| i);
        let name = &after[..name_len];
        match params.iter().rfind(|(k, _)| k.as_ref() == name) {
            Some((_, value)) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

/// Ordered registry of links, handlers and redirects.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    compiler: Compiler,
    links: Vec<Link>,
    handlers: Vec<Handler>,
    redirects: Vec<Redirect>,
}

impl Collection {
    /// An empty collection whose patterns use `word_separator`.
    #[must_use]
    pub fn new(word_separator: &str) -> Self {
        Self {
            compiler: Compiler::new(word_separator),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn word_separator(&self) -> &str {
        self.compiler.word_separator()
    }

    fn compile(&self, pattern: &str) -> Result<CompiledRoute, RouteError> {
        let segments = parse(pattern)?;
        Ok(self.compiler.compile(pattern, &segments)?)
    }

    /// Bind `pattern` under `base_url` to `action` for any method.
    pub fn link(
        &mut self,
        base_url: &str,
        pattern: &str,
        action: ActionReference,
    ) -> Result<&mut Self, RouteError> {
        self.link_with_methods(base_url, pattern, action, None)
    }

    /// Bind `pattern` under `base_url` to `action`, restricted to `methods`
    /// when given.
    pub fn link_with_methods(
        &mut self,
        base_url: &str,
        pattern: &str,
        action: ActionReference,
        methods: Option<Vec<Method>>,
    ) -> Result<&mut Self, RouteError> {
        let base_url = normalize_base_url(base_url);
        let pattern = normalize_pattern(pattern);
        let compiled = self.compile(&pattern)?;
        debug!(
            base_url = %base_url,
            pattern = %pattern,
            action = %action,
            params = compiled.param_names().len(),
            "Registered link"
        );
        self.links.push(Link {
            base_url,
            pattern,
            action,
            methods,
            compiled,
        });
        Ok(self)
    }

    /// Register `action` as the handler for `status` under `base_url`.
    pub fn handle(
        &mut self,
        base_url: &str,
        status: u16,
        action: ActionReference,
    ) -> Result<&mut Self, RouteError> {
        if !(100..=599).contains(&status) {
            return Err(RouteError::InvalidStatus { status });
        }
        let base_url = normalize_base_url(base_url);
        debug!(base_url = %base_url, status, action = %action, "Registered handler");
        self.handlers.push(Handler {
            base_url,
            status,
            action,
        });
        Ok(self)
    }

    /// Redirect `pattern` under `base_url` to `target`.
    pub fn redirect(
        &mut self,
        base_url: &str,
        pattern: &str,
        target: &str,
        kind: RedirectType,
    ) -> Result<&mut Self, RouteError> {
        let base_url = normalize_base_url(base_url);
        let pattern = normalize_pattern(pattern);
        let compiled = self.compile(&pattern)?;
        debug!(
            base_url = %base_url,
            pattern = %pattern,
            target = %target,
            kind = %kind,
            "Registered redirect"
        );
        self.redirects.push(Redirect {
            base_url,
            pattern,
            target: target.trim().to_string(),
            kind,
            compiled,
        });
        Ok(self)
    }

    /// Build a collection from configured route blocks.
    ///
    /// Within each block links are registered first, then redirects grouped
    /// by type, then handlers, each in the order written.
    pub fn from_config(blocks: &[RouteBlock], word_separator: &str) -> Result<Self, RouteError> {
        let mut collection = Collection::new(word_separator);
        for block in blocks {
            let base_url = block.base_url.as_str();

            for (pattern, target) in block.links.iter() {
                let action: ActionReference = target.action().parse()?;
                let methods = match target.methods() {
                    [] => None,
                    names => Some(
                        names
                            .iter()
                            .map(|m| parse_method(m))
                            .collect::<Result<Vec<_>, _>>()?,
                    ),
                };
                collection.link_with_methods(base_url, pattern, action, methods)?;
            }

            for (kind, redirects) in block.redirects.iter() {
                let kind: RedirectType = kind.parse()?;
                for (pattern, target) in redirects.iter() {
                    collection.redirect(base_url, pattern, target, kind)?;
                }
            }

            for (status, action) in block.handlers.iter() {
                collection.handle(base_url, status.0, action.parse()?)?;
            }
        }

        info!(
            links = collection.links.len(),
            redirects = collection.redirects.len(),
            handlers = collection.handlers.len(),
            "Route collection built"
        );
        Ok(collection)
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    #[must_use]
    pub fn redirects(&self) -> &[Redirect] {
        &self.redirects
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.handlers.is_empty() && self.redirects.is_empty()
    }

    /// Handler for `status` whose base URL is the longest one containing
    /// `path`. Ties go to the first registered.
    #[must_use]
    pub fn handler_for(&self, path: &str, status: u16) -> Option<&Handler> {
        let mut best: Option<&Handler> = None;
        for handler in &self.handlers {
            if handler.status != status || !within_base(&handler.base_url, path) {
                continue;
            }
            if best.is_none_or(|b| handler.base_url.len() > b.base_url.len()) {
                best = Some(handler);
            }
        }
        best
    }

    /// Reverse routing: compose a URL for the first link bound to
    /// `action_name` (`Class::method` or a callable's label).
    pub fn url_for<'a, I>(&self, action_name: &str, params: I) -> Result<String, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let link = self
            .links
            .iter()
            .find(|l| l.action.to_string() == action_name)
            .ok_or_else(|| BuildError::UnknownAction {
                action: action_name.to_string(),
            })?;
        let path = link.compiled.build(params)?;
        Ok(join_url(&link.base_url, &path))
    }

    /// One human-readable line per entry, links first.
    #[must_use]
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.links.len() + self.redirects.len() + self.handlers.len());
        for link in &self.links {
            let methods = match &link.methods {
                None => "*".to_string(),
                Some(m) => m.iter().map(Method::as_str).collect::<Vec<_>>().join(","),
            };
            lines.push(format!(
                "LINK     {:<8} {:<40} {}",
                methods,
                link.full_pattern(),
                link.action
            ));
        }
        for redirect in &self.redirects {
            lines.push(format!(
                "REDIRECT {:<8} {:<40} {}",
                redirect.kind.status(),
                join_url(&redirect.base_url, &redirect.pattern),
                redirect.target
            ));
        }
        for handler in &self.handlers {
            lines.push(format!(
                "HANDLER  {:<8} {:<40} {}",
                handler.status, handler.base_url, handler.action
            ));
        }
        lines
    }
}

fn parse_method(name: &str) -> Result<Method, RouteError> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
        RouteError::InvalidMethod {
            value: name.to_string(),
        }
    })
}
