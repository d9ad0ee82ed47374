//! Handlers, continuations and chain composition.
//!
//! A [`Handler`] receives the request [`Context`] together with a [`Next`]
//! continuation standing for "the rest of the chain". It proceeds by running
//! `next`, wraps by acting again on the context `next` hands back, or
//! short-circuits by returning without running `next` at all.
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future;

use crate::context::Context;

/// The error type handlers fail with. The router never inspects it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler resolves to: the context, handed back up the chain.
pub type HandlerResult = Result<Context, BoxError>;

/// The future returned by [`Handler::call`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Represents a link in a handler chain.
/// This trait is implemented for asynchronous functions that take a `Context` and a `Next`
/// and return a `Result<Context, BoxError>`
/// ```rust
/// # use chainrouter::{Context, Next, HandlerResult, Handler};
/// async fn powered_by(ctx: Context, next: Next) -> HandlerResult {
///     let mut ctx = next.run(ctx).await?;
///     ctx.headers_mut().insert("x-powered-by", "chainrouter".parse()?);
///     Ok(ctx)
/// }
///
/// let handler: Box<dyn Handler> = Box::new(powered_by);
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context, next: Next) -> HandlerFuture;
}

impl<F, R> Handler for F
where
    F: Fn(Context, Next) -> R + Send + Sync + 'static,
    R: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context, next: Next) -> HandlerFuture {
        Box::pin(self(ctx, next))
    }
}

/// Erases a handler's type so it can sit in a chain next to others.
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    Arc::new(handler)
}

/// The remainder of a chain, handed to each handler as its continuation.
///
/// `Next` is consumed by [`Next::run`]; a handler that never calls it ends the
/// chain early.
pub struct Next {
    kind: NextKind,
}

enum NextKind {
    End,
    Link {
        chain: Arc<[BoxedHandler]>,
        position: usize,
        outer: Box<Next>,
    },
}

impl Next {
    /// A continuation that finishes immediately, handing the context back.
    pub fn end() -> Self {
        Self { kind: NextKind::End }
    }

    /// A continuation that runs `handler` and then ends.
    pub fn handler(handler: impl Handler) -> Self {
        Self::link(Arc::new([boxed(handler)]), Next::end())
    }

    fn link(chain: Arc<[BoxedHandler]>, outer: Next) -> Self {
        Self {
            kind: NextKind::Link {
                chain,
                position: 0,
                outer: Box::new(outer),
            },
        }
    }

    /// Runs the rest of the chain against `ctx`.
    pub fn run(self, ctx: Context) -> HandlerFuture {
        match self.kind {
            NextKind::End => Box::pin(future::ok::<_, BoxError>(ctx)),
            NextKind::Link {
                chain,
                position,
                outer,
            } => {
                let handler = chain.get(position).cloned();
                match handler {
                    Some(handler) => handler.call(
                        ctx,
                        Next {
                            kind: NextKind::Link {
                                chain,
                                position: position + 1,
                                outer,
                            },
                        },
                    ),
                    None => outer.run(ctx),
                }
            }
        }
    }
}

/// A composed handler: an ordered sequence of handlers run as one.
///
/// Calling a `Chain` with continuation `k` runs the first handler with a
/// continuation that runs the second, and so on, the last one continuing
/// into `k`. Cloning is cheap, the sequence is shared.
#[derive(Clone)]
pub struct Chain {
    handlers: Arc<[BoxedHandler]>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Whether both chains share the same composed sequence.
    pub fn ptr_eq(&self, other: &Chain) -> bool {
        Arc::ptr_eq(&self.handlers, &other.handlers)
    }
}

impl Handler for Chain {
    fn call(&self, ctx: Context, next: Next) -> HandlerFuture {
        match &*self.handlers {
            [] => next.run(ctx),
            [only] => only.call(ctx, next),
            _ => Next::link(self.handlers.clone(), next).run(ctx),
        }
    }
}

/// Composes `handlers` into a single [`Chain`].
///
/// An empty sequence composes into a pass-through, a single handler into a
/// chain that calls it with the given continuation unchanged.
/// ```rust
/// # use chainrouter::{boxed, compose, Context, Next};
/// let first = |mut ctx: Context, next: Next| async move {
///     ctx.set_body("A");
///     next.run(ctx).await
/// };
/// let second = |mut ctx: Context, next: Next| async move {
///     ctx.append_body("B");
///     next.run(ctx).await
/// };
///
/// let chain = compose(vec![boxed(first), boxed(second)]);
/// assert_eq!(chain.len(), 2);
/// ```
pub fn compose(handlers: impl IntoIterator<Item = BoxedHandler>) -> Chain {
    Chain {
        handlers: handlers.into_iter().collect(),
    }
}
