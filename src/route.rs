use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::{debug, trace};

use crate::context::Context;
use crate::error::Result;
use crate::handler::{boxed, compose, BoxedHandler, Chain, Handler, HandlerFuture, Next};
use crate::method::Method;
use crate::pattern::Pattern;
use crate::router::Router;

/// A set of handlers keyed by HTTP method, for bulk assignment with
/// [`Router::route_with`](crate::Router::route_with).
/// ```rust
/// use chainrouter::{Context, MethodTable, Next};
///
/// let table = MethodTable::new()
///     .get(|mut ctx: Context, next: Next| async move {
///         ctx.set_body("get!");
///         next.run(ctx).await
///     })
///     .post(|mut ctx: Context, next: Next| async move {
///         ctx.set_body("post!");
///         next.run(ctx).await
///     });
///
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct MethodTable {
    handlers: HashMap<Method, BoxedHandler>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for `method`, replacing any previous one.
    pub fn on(mut self, method: Method, handler: impl Handler) -> Self {
        self.handlers.insert(method, boxed(handler));
        self
    }

    pub fn get(self, handler: impl Handler) -> Self {
        self.on(Method::Get, handler)
    }

    pub fn head(self, handler: impl Handler) -> Self {
        self.on(Method::Head, handler)
    }

    pub fn options(self, handler: impl Handler) -> Self {
        self.on(Method::Options, handler)
    }

    pub fn post(self, handler: impl Handler) -> Self {
        self.on(Method::Post, handler)
    }

    pub fn put(self, handler: impl Handler) -> Self {
        self.on(Method::Put, handler)
    }

    pub fn patch(self, handler: impl Handler) -> Self {
        self.on(Method::Patch, handler)
    }

    pub fn delete(self, handler: impl Handler) -> Self {
        self.on(Method::Delete, handler)
    }

    pub fn trace(self, handler: impl Handler) -> Self {
        self.on(Method::Trace, handler)
    }

    pub fn contains(&self, method: Method) -> bool {
        self.handlers.contains_key(&method)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn handler(&self, method: Method) -> Option<&BoxedHandler> {
        self.handlers.get(&method)
    }
}

/// One path template and the handlers registered for it, per method.
///
/// Routes are created and owned by a [`Router`]; get one with
/// [`Router::route`](crate::Router::route).
///
/// The first request dispatched to a method composes the router's
/// pre-middleware with the method's handler, and that chain is reused for
/// every later request.
pub struct Route {
    pattern: Pattern,
    methods: MethodTable,
    memoized: [OnceLock<Chain>; Method::ALL.len()],
}

impl Route {
    pub(crate) fn new(template: &str) -> Result<Self> {
        Ok(Self {
            pattern: Pattern::compile(template)?,
            methods: MethodTable::default(),
            memoized: Default::default(),
        })
    }

    /// The full template, router prefix included.
    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The methods this route has handlers for.
    pub fn methods(&self) -> Vec<Method> {
        Method::ALL
            .iter()
            .copied()
            .filter(|&method| self.methods.contains(method))
            .collect()
    }

    /// Registers `handler` for `method`, replacing any previous one.
    pub fn on(&mut self, method: Method, handler: impl Handler) -> &mut Self {
        self.set(method, boxed(handler))
    }

    pub(crate) fn set(&mut self, method: Method, handler: BoxedHandler) -> &mut Self {
        debug!(template = self.template(), %method, "registered handler");
        self.methods.handlers.insert(method, handler);
        self.memoized[method.index()] = OnceLock::new();
        self
    }

    /// Replaces the whole method table.
    pub(crate) fn replace_methods(&mut self, methods: MethodTable) {
        debug!(
            template = self.template(),
            count = methods.len(),
            "replaced method table"
        );
        self.methods = methods;
        self.memoized = Default::default();
    }

    /// Register a handler for `GET` requests
    pub fn get(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Get, handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Head, handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Options, handler)
    }

    /// Register a handler for `POST` requests
    pub fn post(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Post, handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Put, handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Patch, handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Delete, handler)
    }

    /// Register a handler for `TRACE` requests
    pub fn trace(&mut self, handler: impl Handler) -> &mut Self {
        self.on(Method::Trace, handler)
    }

    /// Whether this route handles `method` and its template accepts `path`.
    pub fn is_match(&self, path: &str, method: Method) -> bool {
        self.methods.contains(method) && self.pattern.is_match(path)
    }

    /// Runs the route's chain for `method` against `ctx`, continuing into `next`.
    ///
    /// `router` must be the router owning this route; its pre-middleware is
    /// composed in front of the handler the first time a method resolves.
    pub(crate) fn resolve(
        &self,
        router: &Router,
        mut ctx: Context,
        method: Method,
        next: Next,
    ) -> HandlerFuture {
        let handler = match self.methods.handler(method) {
            Some(handler) => handler,
            None => return next.run(ctx),
        };

        let params = self.pattern.extract(ctx.path());
        ctx.set_params(params);

        let chain = self.memoized[method.index()].get_or_init(|| {
            trace!(template = self.template(), %method, "composing chain");

            let mut links = Vec::with_capacity(3);
            if let Some(all) = router.pre_middleware(None) {
                links.push(all.clone());
            }
            if let Some(pre) = router.pre_middleware(Some(method)) {
                links.push(pre.clone());
            }
            links.push(handler.clone());

            compose(links)
        });

        chain.call(ctx, next)
    }

    #[cfg(test)]
    pub(crate) fn memoized(&self, method: Method) -> Option<&Chain> {
        self.memoized[method.index()].get()
    }
}
