use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chainrouter::{
    chain, BoxError, Context, EndpointTable, Endpoints, Handler, MethodTable, Next, Router,
};
use hyper::{Body, Request, StatusCode};

fn request(method: &str, uri: &str) -> Context {
    Context::new(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
}

fn respond(body: &'static str) -> impl Handler {
    move |mut ctx: Context, next: Next| async move {
        ctx.set_body(body);
        next.run(ctx).await
    }
}

/// An outer continuation that records whether it ran.
fn fallback(hits: &Arc<AtomicUsize>) -> Next {
    let hits = hits.clone();
    Next::handler(move |ctx: Context, next: Next| {
        hits.fetch_add(1, Ordering::SeqCst);
        next.run(ctx)
    })
}

#[tokio::test]
async fn greets_by_path_parameter() {
    let mut router = Router::default();
    router
        .route("/greet/:name")
        .unwrap()
        .get(|mut ctx: Context, next: Next| async move {
            let body = format!("hello, {}", ctx.param("name").unwrap_or_default());
            ctx.set_body(body);
            next.run(ctx).await
        });
    let dispatcher = router.middleware();

    let ctx = dispatcher
        .call(request("GET", "/greet/Ada"), Next::end())
        .await
        .unwrap();

    assert_eq!(ctx.body_str(), Some("hello, Ada"));
    assert_eq!(ctx.status(), StatusCode::OK);
}

#[tokio::test]
async fn optional_page_serves_the_root() {
    let mut router = Router::default();
    router
        .get("/:page?", |mut ctx: Context, next: Next| async move {
            let body = format!("page {}", ctx.param("page").unwrap_or("index"));
            ctx.set_body(body);
            next.run(ctx).await
        })
        .unwrap();
    let dispatcher = router.middleware();

    let root = dispatcher.call(request("GET", "/"), Next::end()).await.unwrap();
    assert_eq!(root.body_str(), Some("page index"));

    let home = dispatcher
        .call(request("GET", "/home"), Next::end())
        .await
        .unwrap();
    assert_eq!(home.body_str(), Some("page home"));
}

#[tokio::test]
async fn pre_middleware_runs_before_the_handler() {
    let mut router = Router::default();
    router
        .pre(|mut ctx: Context, next: Next| async move {
            ctx.set_body("A");
            next.run(ctx).await
        })
        .get("/x", |mut ctx: Context, next: Next| async move {
            ctx.append_body("B");
            next.run(ctx).await
        })
        .unwrap();
    let dispatcher = router.middleware();

    let ctx = dispatcher
        .call(request("GET", "/x"), Next::end())
        .await
        .unwrap();

    assert_eq!(ctx.body_str(), Some("AB"));
}

#[tokio::test]
async fn pre_middleware_accumulates() {
    let mut router = Router::default();
    router
        .pre(respond("1"))
        .pre(|mut ctx: Context, next: Next| async move {
            ctx.append_body("2");
            next.run(ctx).await
        })
        .pre_method(chainrouter::Method::Post, |mut ctx: Context, next: Next| async move {
            ctx.append_body("p");
            next.run(ctx).await
        })
        .get("/x", |mut ctx: Context, next: Next| async move {
            ctx.append_body("g");
            next.run(ctx).await
        })
        .unwrap()
        .post("/x", |mut ctx: Context, next: Next| async move {
            ctx.append_body("!");
            next.run(ctx).await
        })
        .unwrap();
    let dispatcher = router.middleware();

    let get = dispatcher.call(request("GET", "/x"), Next::end()).await.unwrap();
    let post = dispatcher.call(request("POST", "/x"), Next::end()).await.unwrap();

    assert_eq!(get.body_str(), Some("12g"));
    assert_eq!(post.body_str(), Some("12p!"));
}

#[tokio::test]
async fn unmatched_requests_fall_through() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();

    let mut router = Router::default();
    router
        .get("/test", move |ctx: Context, next: Next| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.run(ctx)
        })
        .unwrap();
    let dispatcher = router.middleware();

    let fell_through = Arc::new(AtomicUsize::new(0));
    let ctx = dispatcher
        .call(request("GET", "/nope"), fallback(&fell_through))
        .await
        .unwrap();

    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    assert_eq!(fell_through.load(Ordering::SeqCst), 1);
    assert!(ctx.body().is_none());
    assert!(ctx.params().is_empty());
    assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_methods_fall_through() {
    let mut router = Router::default();
    router.get("/test", respond("get!")).unwrap();
    let dispatcher = router.middleware();

    let fell_through = Arc::new(AtomicUsize::new(0));
    let ctx = dispatcher
        .call(request("CONNECT", "/test"), fallback(&fell_through))
        .await
        .unwrap();

    assert_eq!(fell_through.load(Ordering::SeqCst), 1);
    assert!(ctx.body().is_none());
}

#[tokio::test]
async fn method_is_matched_case_insensitively() {
    let mut router = Router::default();
    router.put("/test", respond("put!")).unwrap();
    let dispatcher = router.middleware();

    let ctx = dispatcher
        .call(request("put", "/test"), Next::end())
        .await
        .unwrap();

    assert_eq!(ctx.body_str(), Some("put!"));
}

#[tokio::test]
async fn route_table_serves_each_method() {
    let mut router = Router::default();
    router
        .route_with(
            "/test",
            MethodTable::new()
                .get(respond("get!"))
                .post(respond("post!"))
                .put(respond("put!"))
                .delete(respond("delete!")),
        )
        .unwrap()
        .get("/params/:test1/:test2", |mut ctx: Context, next: Next| async move {
            let body = format!(
                "{},{}",
                ctx.param("test1").unwrap_or_default(),
                ctx.param("test2").unwrap_or_default()
            );
            ctx.set_body(body);
            next.run(ctx).await
        })
        .unwrap()
        .route_with("/longer/url/here", MethodTable::new().get(respond("yus")))
        .unwrap();
    let dispatcher = router.middleware();

    for &(method, uri, expected) in &[
        ("GET", "/test", "get!"),
        ("POST", "/test", "post!"),
        ("PUT", "/test", "put!"),
        ("DELETE", "/test", "delete!"),
        ("GET", "/params/foo/magic", "foo,magic"),
        ("GET", "/longer/url/here", "yus"),
    ] {
        let ctx = dispatcher
            .call(request(method, uri), Next::end())
            .await
            .unwrap();
        assert_eq!(ctx.body_str(), Some(expected), "{} {}", method, uri);
    }
}

#[tokio::test]
async fn registration_order_wins_over_specificity() {
    let mut router = Router::default();
    router
        .get("/users/:id", |mut ctx: Context, next: Next| async move {
            let body = format!("id={}", ctx.param("id").unwrap_or_default());
            ctx.set_body(body);
            next.run(ctx).await
        })
        .unwrap()
        .get("/users/active", respond("active"))
        .unwrap();
    let dispatcher = router.middleware();

    let ctx = dispatcher
        .call(request("GET", "/users/active"), Next::end())
        .await
        .unwrap();

    assert_eq!(ctx.body_str(), Some("id=active"));
    assert_eq!(ctx.param("id"), Some("active"));
}

#[tokio::test]
async fn routers_chain_into_each_other() {
    let mut first = Router::default();
    first.get("/test", respond("get!")).unwrap();

    let mut second = Router::default();
    second
        .pre(|mut ctx: Context, next: Next| async move {
            ctx.set_body("pre");
            next.run(ctx).await
        })
        .get("/pre", |mut ctx: Context, next: Next| async move {
            ctx.append_body("get");
            next.run(ctx).await
        })
        .unwrap();

    let app = chain![first.middleware(), second.middleware()];

    let ctx = app.call(request("GET", "/pre"), Next::end()).await.unwrap();
    assert_eq!(ctx.body_str(), Some("preget"));

    let ctx = app.call(request("GET", "/test"), Next::end()).await.unwrap();
    assert_eq!(ctx.body_str(), Some("get!"));

    let ctx = app.call(request("GET", "/anything"), Next::end()).await.unwrap();
    assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn handler_can_pass_to_the_outer_continuation() {
    let mut router = Router::default();
    router
        .get("/passthrough", |ctx: Context, next: Next| next.run(ctx))
        .unwrap();
    let dispatcher = router.middleware();

    let fell_through = Arc::new(AtomicUsize::new(0));
    dispatcher
        .call(request("GET", "/passthrough"), fallback(&fell_through))
        .await
        .unwrap();

    assert_eq!(fell_through.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_can_short_circuit_the_outer_continuation() {
    let mut router = Router::default();
    router
        .pre(|mut ctx: Context, _next: Next| async move {
            ctx.set_status(StatusCode::UNAUTHORIZED);
            Ok::<_, BoxError>(ctx)
        })
        .get("/secret", respond("secret"))
        .unwrap();
    let dispatcher = router.middleware();

    let fell_through = Arc::new(AtomicUsize::new(0));
    let ctx = dispatcher
        .call(request("GET", "/secret"), fallback(&fell_through))
        .await
        .unwrap();

    assert_eq!(ctx.status(), StatusCode::UNAUTHORIZED);
    assert!(ctx.body().is_none());
    assert_eq!(fell_through.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn prefix_and_catch_all_serve_a_mount_point() {
    let mut router = Router::new("/static");
    router
        .get("/*file", |mut ctx: Context, next: Next| async move {
            let body = format!("serving {}", ctx.param("file").unwrap_or_default());
            ctx.set_body(body);
            next.run(ctx).await
        })
        .unwrap();
    let dispatcher = router.middleware();

    let ctx = dispatcher
        .call(request("GET", "/static/css/site.css"), Next::end())
        .await
        .unwrap();
    assert_eq!(ctx.body_str(), Some("serving css/site.css"));

    let ctx = dispatcher
        .call(request("GET", "/elsewhere/site.css"), Next::end())
        .await
        .unwrap();
    assert!(ctx.body().is_none());
}

struct Books;

impl Endpoints for Books {
    fn endpoints(&self, _router: &Router) -> EndpointTable {
        EndpointTable::new()
            .get("/books", respond("list"))
            .post("/books", respond("create"))
            .get("/books/:id", |mut ctx: Context, next: Next| async move {
                let body = format!("show {}", ctx.param("id").unwrap_or_default());
                ctx.set_body(body);
                next.run(ctx).await
            })
            .delete("/books/:id", respond("destroy"))
    }
}

#[tokio::test]
async fn endpoints_register_a_resource() {
    let mut router = Router::default();
    router.endpoints(&Books).unwrap();
    let dispatcher = router.middleware();

    for &(method, uri, expected) in &[
        ("GET", "/books", "list"),
        ("POST", "/books", "create"),
        ("GET", "/books/7", "show 7"),
        ("DELETE", "/books/7", "destroy"),
    ] {
        let ctx = dispatcher
            .call(request(method, uri), Next::end())
            .await
            .unwrap();
        assert_eq!(ctx.body_str(), Some(expected), "{} {}", method, uri);
    }
}

#[tokio::test]
async fn dispatches_concurrently() {
    let mut router = Router::default();
    router
        .get("/n/:n", |mut ctx: Context, next: Next| async move {
            tokio::task::yield_now().await;
            let body = ctx.param("n").unwrap_or_default().to_owned();
            ctx.set_body(body);
            next.run(ctx).await
        })
        .unwrap();
    let dispatcher = router.middleware();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let ctx = dispatcher
                    .call(request("GET", &format!("/n/{}", i)), Next::end())
                    .await
                    .unwrap();
                (i, ctx.body_str().map(str::to_owned))
            })
        })
        .collect();

    for task in tasks {
        let (i, body) = task.await.unwrap();
        assert_eq!(body, Some(i.to_string()));
    }
}
