//! Action references, the resolver boundary and action invocation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::resource::{Request, Response};
use crate::router::ParamVec;

/// Signature of a bare callable action.
///
/// The returned value becomes the response body unless output was captured
/// (see [`ActionContext::finish`]). Return [`Value::Null`] to leave the body
/// alone.
pub type ActionFn = dyn Fn(&mut ActionContext<'_>) -> anyhow::Result<Value> + Send + Sync;

/// What a link or handler is bound to.
///
/// Resolved lazily at dispatch time, never at registration.
#[derive(Clone)]
pub enum ActionReference {
    /// A closure registered directly, labelled for logs and reverse routing
    Callable { name: Arc<str>, func: Arc<ActionFn> },
    /// A controller class and method, constructed through the [`Resolver`]
    Controller { class: String, method: String },
}

impl ActionReference {
    /// Wrap a closure as an action.
    pub fn callable<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut ActionContext<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        ActionReference::Callable {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Reference `class::method`.
    pub fn controller(class: impl Into<String>, method: impl Into<String>) -> Self {
        ActionReference::Controller {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Name used in logs and by [`crate::router::Collection::url_for`].
    #[must_use]
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionReference::Callable { name, .. } => f.write_str(name),
            ActionReference::Controller { class, method } => write!(f, "{class}::{method}"),
        }
    }
}

impl fmt::Debug for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionReference::Callable { name, .. } => {
                f.debug_struct("Callable").field("name", name).finish()
            }
            ActionReference::Controller { class, method } => f
                .debug_struct("Controller")
                .field("class", class)
                .field("method", method)
                .finish(),
        }
    }
}

/// Error for an action string that is not `Class::method`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParseError {
    pub input: String,
}

impl fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid action '{}': expected 'Class::method'",
            self.input
        )
    }
}

impl std::error::Error for ActionParseError {}

impl FromStr for ActionReference {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.rsplit_once("::") {
            Some((class, method))
                if !class.is_empty()
                    && !method.is_empty()
                    && !method.contains(':')
                    && !class.ends_with(':') =>
            {
                Ok(ActionReference::controller(class, method))
            }
            _ => Err(ActionParseError {
                input: s.to_string(),
            }),
        }
    }
}

/// Everything an action sees while it runs.
///
/// `output` is the captured-output buffer. When the engine runs in mutable
/// mode, anything written here replaces the action's return value as the
/// response body.
pub struct ActionContext<'a> {
    pub request: &'a Request,
    pub response: Response,
    pub params: ParamVec,
    pub output: String,
}

impl<'a> ActionContext<'a> {
    #[must_use]
    pub fn new(request: &'a Request, response: Response, params: ParamVec) -> Self {
        Self {
            request,
            response,
            params,
            output: String::new(),
        }
    }

    /// Get a route parameter by name (last write wins).
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append text to the captured output buffer.
    pub fn echo(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Settle the response body from the two possible sources.
    ///
    /// With `mutable` set, a non-empty output buffer wins over the returned
    /// value. Otherwise a non-null returned value becomes the body, and
    /// failing that the body already on the response is kept.
    #[must_use]
    pub fn finish(self, mutable: bool, returned: Value) -> Response {
        let ActionContext {
            mut response,
            output,
            ..
        } = self;

        if mutable && !output.is_empty() {
            if !returned.is_null() {
                debug!(
                    output_len = output.len(),
                    "Captured output overrides returned value"
                );
            }
            response.set(Value::String(output));
        } else {
            if !output.is_empty() {
                debug!(
                    output_len = output.len(),
                    "Discarding captured output (engine is not mutable)"
                );
            }
            if !returned.is_null() {
                response.set(returned);
            }
        }
        response
    }
}

/// A controller instance produced by a [`Resolver`].
pub trait Controller: Send {
    /// Invoke `method` on this controller.
    ///
    /// Unknown methods should return an error; the engine propagates it
    /// unchanged.
    fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value>;
}

/// Boundary with the dependency-injection container.
pub trait Resolver: Send + Sync {
    /// Construct a controller for `class`.
    fn make(&self, class: &str, params: &ParamVec) -> Result<Box<dyn Controller>, ResolveError>;
}

/// Error raised when a controller cannot be constructed.
#[derive(Debug)]
pub enum ResolveError {
    /// Nothing is registered under this class name
    UnknownController { class: String },
    /// The factory failed
    Construction { class: String, source: anyhow::Error },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownController { class } => {
                write!(f, "no controller registered as '{class}'")
            }
            ResolveError::Construction { class, source } => {
                write!(f, "failed to construct controller '{class}': {source}")
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::UnknownController { .. } => None,
            ResolveError::Construction { source, .. } => Some(source.as_ref()),
        }
    }
}

/// Error propagated out of dispatch. The engine never turns these into a
/// response; the host decides what a failure looks like.
#[derive(Debug)]
pub enum DispatchError {
    Resolve(ResolveError),
    Action {
        action: String,
        source: anyhow::Error,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Resolve(e) => write!(f, "{e}"),
            DispatchError::Action { action, source } => {
                write!(f, "action '{action}' failed: {source}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Resolve(e) => Some(e),
            DispatchError::Action { source, .. } => Some(source.as_ref()),
        }
    }
}

impl From<ResolveError> for DispatchError {
    fn from(e: ResolveError) -> Self {
        DispatchError::Resolve(e)
    }
}

/// Factory building a controller from the matched route parameters.
pub type ControllerFactory =
    Arc<dyn Fn(&ParamVec) -> anyhow::Result<Box<dyn Controller>> + Send + Sync>;

/// Post-construction hook run on every controller of a class.
pub type Configurator = Arc<dyn Fn(&mut dyn Controller) + Send + Sync>;

/// Default [`Resolver`]: a registry of controller factories by class name,
/// plus `prepare` hooks applied after construction.
#[derive(Clone, Default)]
pub struct ControllerResolver {
    factories: HashMap<String, ControllerFactory>,
    configurators: HashMap<String, Vec<Configurator>>,
}

impl ControllerResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `class`, replacing any previous one.
    pub fn register<F>(&mut self, class: &str, factory: F) -> &mut Self
    where
        F: Fn(&ParamVec) -> anyhow::Result<Box<dyn Controller>> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(class.to_string(), Arc::new(factory))
            .is_some()
        {
            debug!(class = %class, "Replaced controller factory");
        }
        self
    }

    /// Add a hook run on each freshly constructed `class` controller.
    pub fn prepare<F>(&mut self, class: &str, configurator: F) -> &mut Self
    where
        F: Fn(&mut dyn Controller) + Send + Sync + 'static,
    {
        self.configurators
            .entry(class.to_string())
            .or_default()
            .push(Arc::new(configurator));
        self
    }

    /// Names of all registered controller classes.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Resolver for ControllerResolver {
    fn make(&self, class: &str, params: &ParamVec) -> Result<Box<dyn Controller>, ResolveError> {
        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| ResolveError::UnknownController {
                class: class.to_string(),
            })?;
        let mut controller = factory(params).map_err(|source| ResolveError::Construction {
            class: class.to_string(),
            source,
        })?;
        if let Some(hooks) = self.configurators.get(class) {
            for hook in hooks {
                hook(controller.as_mut());
            }
        }
        Ok(controller)
    }
}

/// Resolve `action` and run it against `ctx`.
///
/// This is the single dispatch point for both action shapes.
pub fn invoke(
    action: &ActionReference,
    resolver: &dyn Resolver,
    ctx: &mut ActionContext<'_>,
) -> Result<Value, DispatchError> {
    let result = match action {
        ActionReference::Callable { func, .. } => func(ctx),
        ActionReference::Controller { class, method } => {
            let mut controller = resolver.make(class, &ctx.params).map_err(|e| {
                error!(action = %action, error = %e, "Controller resolution failed");
                e
            })?;
            controller.call(method, ctx)
        }
    };

    result.map_err(|source| {
        error!(
            request_id = %ctx.request.request_id(),
            action = %action,
            error = %source,
            "Action failed"
        );
        DispatchError::Action {
            action: action.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Greeter {
        greeting: String,
    }

    impl Controller for Greeter {
        fn call(&mut self, method: &str, ctx: &mut ActionContext<'_>) -> anyhow::Result<Value> {
            match method {
                "hello" => Ok(json!(format!(
                    "{} {}",
                    self.greeting,
                    ctx.param("name").unwrap_or("nobody")
                ))),
                other => Err(anyhow::anyhow!("no method '{other}'")),
            }
        }
    }

    fn request() -> Request {
        Request::new(Method::GET, "/hello/ada")
    }

    fn params() -> ParamVec {
        let mut p = ParamVec::new();
        p.push((Arc::from("name"), "ada".to_string()));
        p
    }

    #[test]
    fn test_parse_action_reference() {
        let action: ActionReference = "Admin::UsersController::show".parse().unwrap();
        assert!(matches!(
            action,
            ActionReference::Controller { ref class, ref method }
                if class == "Admin::UsersController" && method == "show"
        ));
        assert_eq!(action.to_string(), "Admin::UsersController::show");
        assert!("UsersController".parse::<ActionReference>().is_err());
        assert!("::show".parse::<ActionReference>().is_err());
        assert!("Users::".parse::<ActionReference>().is_err());
    }

    #[test]
    fn test_invoke_controller_with_prepare_hook() {
        let hooks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hooks);

        let mut resolver = ControllerResolver::new();
        resolver.register("Greeter", |_| {
            Ok(Box::new(Greeter {
                greeting: "hi".into(),
            }))
        });
        resolver.prepare("Greeter", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let req = request();
        let mut ctx = ActionContext::new(&req, Response::new(), params());
        let value = invoke(
            &ActionReference::controller("Greeter", "hello"),
            &resolver,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(value, json!("hi ada"));
        assert_eq!(hooks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_controller_is_resolve_error() {
        let resolver = ControllerResolver::new();
        let req = request();
        let mut ctx = ActionContext::new(&req, Response::new(), ParamVec::new());
        let err = invoke(
            &ActionReference::controller("Missing", "x"),
            &resolver,
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Resolve(ResolveError::UnknownController { .. })
        ));
    }

    #[test]
    fn test_action_error_propagates() {
        let action = ActionReference::callable("boom", |_| Err(anyhow::anyhow!("kaput")));
        let req = request();
        let mut ctx = ActionContext::new(&req, Response::new(), ParamVec::new());
        let err = invoke(&action, &ControllerResolver::new(), &mut ctx).unwrap_err();
        assert!(err.to_string().contains("kaput"));
        assert!(matches!(err, DispatchError::Action { ref action, .. } if action == "boom"));
    }

    #[test]
    fn test_mutable_output_wins_over_return() {
        let req = request();
        let mut ctx = ActionContext::new(&req, Response::new(), ParamVec::new());
        ctx.echo("printed");
        let resp = ctx.finish(true, json!("returned"));
        assert_eq!(resp.get(), &json!("printed"));
    }

    #[test]
    fn test_return_used_when_nothing_written() {
        let req = request();
        let ctx = ActionContext::new(&req, Response::new(), ParamVec::new());
        let resp = ctx.finish(true, json!({"ok": true}));
        assert_eq!(resp.get(), &json!({"ok": true}));
    }

    #[test]
    fn test_output_ignored_when_not_mutable() {
        let req = request();
        let mut ctx = ActionContext::new(&req, Response::new(), ParamVec::new());
        ctx.echo("printed");
        let resp = ctx.finish(false, json!("returned"));
        assert_eq!(resp.get(), &json!("returned"));
    }

    #[test]
    fn test_null_return_keeps_response_body() {
        let req = request();
        let mut ctx = ActionContext::new(&req, Response::new(), ParamVec::new());
        ctx.response.set(json!("set directly"));
        let resp = ctx.finish(true, Value::Null);
        assert_eq!(resp.get(), &json!("set directly"));
    }
}
