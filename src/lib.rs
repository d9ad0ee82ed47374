//! # ChainRouter
//!
//! ChainRouter is a small HTTP path router that maps a request's method and path
//! to an ordered chain of handlers.
//!
//! Every handler receives the request [`Context`] and a [`Next`] continuation. It can
//! run the rest of the chain, act again once the rest has finished, or stop the chain
//! by not calling `next` at all. Handlers can be plain `async fn`s or closures.
//!
//! ## Features
//!
//! **Parameters in your routing pattern:** give a path segment a name and the router
//! delivers the raw captured value in [`Context::params`]. Optional, repeated, regex
//! constrained and catch-all parameters are supported, see [`pattern`].
//!
//! **Pre-middleware:** register chains that run in front of every route handler, either
//! for all methods or for one method. For a matched route the chain is always
//! `[pre for all methods] -> [pre for the method] -> route handler`.
//!
//! **Composed once, reused:** the full chain for a route and method is composed on the
//! first request and reused afterwards.
//!
//! **First registered, first matched:** routes are tried in registration order. If two
//! templates can match the same path, the one registered first wins.
//!
//! **Mountable:** a frozen router is a [`Dispatcher`], which is itself a [`Handler`].
//! Requests no route handles fall through to the dispatcher's continuation, so several
//! routers can be chained, or the router can sit in front of a fallback handler.
//!
//! ## Usage
//!
//! ```rust
//! use chainrouter::{Context, Handler, Next, Router};
//! use hyper::{Body, Request};
//!
//! async fn hello(mut ctx: Context, next: Next) -> chainrouter::HandlerResult {
//!     let body = format!("hello, {}", ctx.param("name").unwrap_or_default());
//!     ctx.set_body(body);
//!     next.run(ctx).await
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut router = Router::default();
//! router.get("/greet/:name", hello)?;
//!
//! let dispatcher = router.middleware();
//!
//! let req = Request::get("/greet/Ada").body(Body::empty())?;
//! let ctx = dispatcher.call(Context::new(req), Next::end()).await?;
//!
//! assert_eq!(ctx.body_str(), Some("hello, Ada"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Several handlers for one route
//!
//! The [`chain!`] macro composes handlers of different types into one:
//!
//! ```rust
//! use chainrouter::{chain, Context, Next, Router};
//!
//! async fn auth(ctx: Context, next: Next) -> chainrouter::HandlerResult {
//!     next.run(ctx).await
//! }
//!
//! async fn create(mut ctx: Context, next: Next) -> chainrouter::HandlerResult {
//!     ctx.set_body("created");
//!     next.run(ctx).await
//! }
//!
//! let mut router = Router::default();
//! router.post("/posts", chain![auth, create]).unwrap();
//! ```
//!
//! ### Serving with hyper
//!
//! [`Router::into_service`] turns a router into a `Service` hyper can serve. Requests
//! that no route handles get a `404 Not Found`.
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod handler;
pub mod method;
pub mod pattern;
pub mod route;
pub mod router;

#[doc(hidden)]
pub mod service;

#[doc(inline)]
pub use context::{Context, Params};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use handler::{boxed, compose, BoxError, BoxedHandler, Chain, Handler, HandlerFuture, HandlerResult, Next};
#[doc(inline)]
pub use method::Method;
#[doc(inline)]
pub use route::{MethodTable, Route};
#[doc(inline)]
pub use router::{Dispatcher, EndpointTable, Endpoints, Router};

/// Composes handlers of any type into a single [`Chain`].
///
/// `chain![a, b, c]` is shorthand for `compose(vec![boxed(a), boxed(b), boxed(c)])`.
#[macro_export]
macro_rules! chain {
    ($($handler:expr),* $(,)?) => {
        $crate::compose(::std::vec![$($crate::boxed($handler)),*])
    };
}
