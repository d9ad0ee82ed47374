//! [`Router`](crate::Router) maps a request's method and path to a chain of handlers.
//!
//! Routes are matched in registration order and the first route whose
//! template accepts the path, and which has a handler for the method, wins.
//! There is no specificity ranking: register `/users/active` before
//! `/users/:id` if the literal route should take precedence.
//!
//! Pre-middleware runs in front of every route handler, either for all
//! methods ([`Router::pre`]) or for one ([`Router::pre_method`]). For a
//! matched route the chain is always
//! `[pre for all methods] -> [pre for the method] -> route handler`.
//!
//! A router is configured through `&mut self` and then frozen into a
//! [`Dispatcher`] with [`Router::middleware`], after which it is shared and
//! read-only:
//!
//! ```rust
//! use chainrouter::{Context, Next, Router};
//!
//! # fn main() -> chainrouter::Result<()> {
//! let mut router = Router::default();
//! router
//!     .pre(|mut ctx: Context, next: Next| async move {
//!         ctx.headers_mut().insert("content-type", "text/plain".parse()?);
//!         next.run(ctx).await
//!     })
//!     .get("/hello/:user", |mut ctx: Context, next: Next| async move {
//!         let body = format!("Hello, {}", ctx.param("user").unwrap_or_default());
//!         ctx.set_body(body);
//!         next.run(ctx).await
//!     })?;
//!
//! let dispatcher = router.middleware();
//! # let _ = dispatcher;
//! # Ok(())
//! # }
//! ```
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::Context;
use crate::error::Result;
use crate::handler::{boxed, compose, BoxedHandler, Handler, HandlerFuture, Next};
use crate::method::Method;
use crate::route::{MethodTable, Route};

/// Router dispatches requests to different handler chains via configurable routes.
#[derive(Default)]
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
    index: HashMap<String, usize>,
    pre_all: Option<BoxedHandler>,
    pre_methods: HashMap<Method, BoxedHandler>,
}

impl Router {
    /// Creates a router whose templates are all prefixed with `prefix`.
    /// ```rust
    /// use chainrouter::{Context, Method, Next, Router};
    ///
    /// let mut router = Router::new("/api");
    /// router.get("/users", |ctx: Context, next: Next| next.run(ctx)).unwrap();
    ///
    /// assert!(router.lookup(Method::Get, "/api/users").is_some());
    /// assert!(router.lookup(Method::Get, "/users").is_none());
    /// ```
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Gets the route for `path`, creating it on first use.
    ///
    /// Templates are compared as exact strings after prefixing, so `/a` and
    /// `/a/` are distinct routes.
    pub fn route(&mut self, path: &str) -> Result<&mut Route> {
        let template = format!("{}{}", self.prefix, path);

        let index = match self.index.get(&template) {
            Some(&index) => index,
            None => {
                let route = Route::new(&template)?;
                debug!(template = %template, "created route");

                self.routes.push(route);
                self.index.insert(template, self.routes.len() - 1);
                self.routes.len() - 1
            }
        };

        Ok(&mut self.routes[index])
    }

    /// Gets or creates the route for `path` and replaces its whole method
    /// table with `methods`. Methods missing from `methods` are unregistered.
    /// ```rust
    /// use chainrouter::{Context, Method, MethodTable, Next, Router};
    ///
    /// let mut router = Router::default();
    /// router.get("/test", |ctx: Context, next: Next| next.run(ctx)).unwrap();
    /// router
    ///     .route_with("/test", MethodTable::new().post(|ctx: Context, next: Next| next.run(ctx)))
    ///     .unwrap();
    ///
    /// assert!(router.lookup(Method::Get, "/test").is_none());
    /// assert!(router.lookup(Method::Post, "/test").is_some());
    /// ```
    pub fn route_with(&mut self, path: &str, methods: MethodTable) -> Result<&mut Self> {
        self.route(path)?.replace_methods(methods);
        Ok(self)
    }

    /// Register a handler for a specific path at the specified method.
    pub fn handle(
        &mut self,
        path: &str,
        method: Method,
        handler: impl Handler,
    ) -> Result<&mut Self> {
        self.route(path)?.on(method, handler);
        Ok(self)
    }

    /// Register a handler for `GET` requests
    pub fn get(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Get, handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Head, handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Options, handler)
    }

    /// Register a handler for `POST` requests
    pub fn post(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Post, handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Put, handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Patch, handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Delete, handler)
    }

    /// Register a handler for `TRACE` requests
    pub fn trace(&mut self, path: &str, handler: impl Handler) -> Result<&mut Self> {
        self.handle(path, Method::Trace, handler)
    }

    /// Adds pre-middleware that runs before the handler of every route, for
    /// every method.
    ///
    /// Repeated calls accumulate: later middleware runs after earlier
    /// middleware.
    pub fn pre(&mut self, handler: impl Handler) -> &mut Self {
        debug!(scope = "all", "added pre middleware");
        self.pre_all = Some(append(self.pre_all.take(), boxed(handler)));
        self
    }

    /// Adds pre-middleware that runs before the `method` handler of every
    /// route, after the pre-middleware registered with [`Router::pre`].
    pub fn pre_method(&mut self, method: Method, handler: impl Handler) -> &mut Self {
        debug!(scope = %method, "added pre middleware");
        let existing = self.pre_methods.remove(&method);
        self.pre_methods
            .insert(method, append(existing, boxed(handler)));
        self
    }

    /// The pre-middleware chain for `method`, or for all methods if `None`.
    pub(crate) fn pre_middleware(&self, method: Option<Method>) -> Option<&BoxedHandler> {
        match method {
            None => self.pre_all.as_ref(),
            Some(method) => self.pre_methods.get(&method),
        }
    }

    /// Registers every handler in the table produced by `source`.
    ///
    /// Paths are relative to the router prefix. A path that already has a
    /// route reuses it, so entries for several methods on the same path end
    /// up on one route. If any template is malformed, the error is returned
    /// and nothing is registered.
    pub fn endpoints<E>(&mut self, source: &E) -> Result<&mut Self>
    where
        E: Endpoints + ?Sized,
    {
        let table = source.endpoints(self);
        debug!(count = table.len(), "registering endpoints");

        // Compile every new template before touching the router.
        let mut created: Vec<(String, Route)> = Vec::new();
        for (_, path, _) in &table.entries {
            let template = format!("{}{}", self.prefix, path);
            let known = self.index.contains_key(&template)
                || created.iter().any(|(existing, _)| *existing == template);
            if !known {
                let route = Route::new(&template)?;
                created.push((template, route));
            }
        }

        for (template, route) in created {
            debug!(template = %template, "created route");
            self.routes.push(route);
            self.index.insert(template, self.routes.len() - 1);
        }

        for (method, path, handler) in table.entries {
            self.route(&path)?.set(method, handler);
        }

        Ok(self)
    }

    /// Finds the first route, in registration order, that handles `method`
    /// and whose template accepts `path`.
    /// ```rust
    /// use chainrouter::{Context, Method, Next, Router};
    ///
    /// let mut router = Router::default();
    /// router.get("/home", |ctx: Context, next: Next| next.run(ctx)).unwrap();
    ///
    /// let route = router.lookup(Method::Get, "/home").unwrap();
    /// assert_eq!(route.template(), "/home");
    /// assert!(router.lookup(Method::Post, "/home").is_none());
    /// ```
    pub fn lookup(&self, method: Method, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.is_match(path, method))
    }

    /// The routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Returns a list of the allowed methods for a specific path
    /// ```rust
    /// use chainrouter::{Context, Method, Next, Router};
    ///
    /// let mut router = Router::default();
    /// router
    ///     .get("/home", |ctx: Context, next: Next| next.run(ctx))
    ///     .unwrap()
    ///     .post("/home", |ctx: Context, next: Next| next.run(ctx))
    ///     .unwrap();
    ///
    /// assert_eq!(router.allowed("/home"), vec![Method::Get, Method::Post]);
    /// ```
    pub fn allowed(&self, path: &str) -> Vec<Method> {
        Method::ALL
            .iter()
            .copied()
            .filter(|&method| self.lookup(method, path).is_some())
            .collect()
    }

    /// Freezes the router into the handler that dispatches requests to it.
    pub fn middleware(self) -> Dispatcher {
        Dispatcher {
            router: Arc::new(self),
        }
    }
}

fn append(existing: Option<BoxedHandler>, handler: BoxedHandler) -> BoxedHandler {
    match existing {
        Some(existing) => boxed(compose(vec![existing, handler])),
        None => handler,
    }
}

/// A type that registers a related group of handlers in one go.
///
/// ```rust
/// use chainrouter::{Context, EndpointTable, Endpoints, Method, Next, Router};
///
/// struct Users;
///
/// impl Endpoints for Users {
///     fn endpoints(&self, _router: &Router) -> EndpointTable {
///         EndpointTable::new()
///             .get("/users", |ctx: Context, next: Next| next.run(ctx))
///             .post("/users", |ctx: Context, next: Next| next.run(ctx))
///             .get("/users/:id", |ctx: Context, next: Next| next.run(ctx))
///     }
/// }
///
/// let mut router = Router::default();
/// router.endpoints(&Users).unwrap();
///
/// assert_eq!(router.routes().count(), 2);
/// assert_eq!(router.allowed("/users"), vec![Method::Get, Method::Post]);
/// ```
pub trait Endpoints {
    fn endpoints(&self, router: &Router) -> EndpointTable;
}

/// The `(method, path, handler)` entries produced by an [`Endpoints`] type,
/// kept in insertion order.
#[derive(Default)]
pub struct EndpointTable {
    entries: Vec<(Method, String, BoxedHandler)>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: Method, path: impl Into<String>, handler: impl Handler) -> Self {
        self.entries.push((method, path.into(), boxed(handler)));
        self
    }

    pub fn get(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn head(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Head, path, handler)
    }

    pub fn options(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Options, path, handler)
    }

    pub fn post(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn patch(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Patch, path, handler)
    }

    pub fn delete(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    pub fn trace(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.on(Method::Trace, path, handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The dispatch entry point of a frozen [`Router`].
///
/// A `Dispatcher` is itself a [`Handler`]: it runs the matched route's chain
/// with its own continuation as the chain's tail, or calls the continuation
/// directly when nothing matches. Dispatch never mutates the router, so one
/// dispatcher serves concurrent requests. Cloning is cheap.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Handler for Dispatcher {
    fn call(&self, ctx: Context, next: Next) -> HandlerFuture {
        let method = match Method::try_from(ctx.method()) {
            Ok(method) => method,
            Err(_) => {
                trace!(method = %ctx.method(), "unsupported method, passing through");
                return next.run(ctx);
            }
        };

        match self.router.lookup(method, ctx.path()) {
            Some(route) => {
                trace!(template = route.template(), %method, "matched route");
                route.resolve(&self.router, ctx, method, next)
            }
            None => {
                trace!(path = ctx.path(), %method, "no route matched");
                next.run(ctx)
            }
        }
    }
}
