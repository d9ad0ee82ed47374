//! Serving a [`Router`] directly with hyper.
//!
//! Each request becomes a fresh [`Context`]; the router's dispatcher runs
//! with a terminal continuation and the resulting context is turned into the
//! response. Requests no route handles get an empty `404 Not Found`, a failing
//! handler chain an empty `500 Internal Server Error`.
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use futures_util::{future, ready};
use hyper::service::Service;
use hyper::{Body, Request, Response, StatusCode};
use tracing::error;

use crate::context::Context;
use crate::handler::{Handler, HandlerFuture, Next};
use crate::router::{Dispatcher, Router};

#[doc(hidden)]
pub struct MakeRouterService(RouterService);

impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = Infallible;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        let service = self.0.clone();
        future::ok(service)
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct RouterService(Dispatcher);

impl RouterService {
    fn new(router: Router) -> Self {
        RouterService(router.middleware())
    }

    /// Dispatches `req` and resolves to the response.
    pub fn serve(&self, req: Request<Body>) -> ResponseFut {
        ResponseFut {
            chain: self.0.call(Context::new(req), Next::end()),
        }
    }
}

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.serve(req)
    }
}

impl Router {
    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// ```rust,no_run
    /// # use chainrouter::{Context, Next, Router};
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut router = Router::default();
    /// router.get("/", |mut ctx: Context, next: Next| async move {
    ///     ctx.set_body("Hello, World!");
    ///     next.run(ctx).await
    /// })?;
    ///
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(router.into_service())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
        MakeRouterService(RouterService::new(self))
    }
}

pub struct ResponseFut {
    chain: HandlerFuture,
}

impl Future for ResponseFut {
    type Output = Result<Response<Body>, Infallible>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let res = match ready!(self.chain.as_mut().poll(cx)) {
            Ok(ctx) => ctx.into_response(),
            Err(err) => {
                error!(error = %err, "handler chain failed");
                let mut res = Response::new(Body::empty());
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                res
            }
        };

        Poll::Ready(Ok(res))
    }
}
