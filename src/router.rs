//! Request router.
//!
//! An owned, append-only route table matched by linear scan in registration
//! order — the first route whose method and pattern both fit wins. No
//! most-specific resolution: a general pattern registered early shadows a
//! specific one registered later, on purpose. Order your routes accordingly.
//!
//! Build the router once at startup; each registration call returns `self`
//! so they chain naturally. Once traffic flows the table is read-only, so
//! concurrent [`handle`](Router::handle) calls need no locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::info;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Chain, Middleware, Stack};
use crate::pattern::Pattern;
use crate::request::Request;
use crate::response::Response;

// ── Method rule ───────────────────────────────────────────────────────────────

/// The verb side of a route: one exact method, or any.
enum MethodRule {
    Only(Method),
    Any,
}

impl MethodRule {
    fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Only(m) => m == method,
            Self::Any => true,
        }
    }
}

impl fmt::Display for MethodRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Only(m) => fmt::Display::fmt(m, f),
            Self::Any => f.write_str("*"),
        }
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// One registered endpoint.
struct Route {
    rule: MethodRule,
    pattern: Pattern,
    handler: BoxedHandler,
    middleware: Vec<BoxedMiddleware>,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Holds the route table and the global middleware list; matches requests;
/// composes `global ++ route` middleware over the matched handler and runs
/// the chain. Multiple routers are fully independent — there is no ambient
/// shared table.
///
/// ```rust,no_run
/// # use trellis::{middleware, Context, Method, Response, Router};
/// # async fn get_user(_: Context) -> Response { Response::text("") }
/// # async fn create_user(_: Context) -> Response { Response::text("") }
/// Router::new()
///     .wrap(middleware::recover)
///     .wrap(middleware::trace)
///     .on(Method::GET, "/users/:id", get_user)
///     .on(Method::POST, "/users", create_user);
/// ```
pub struct Router {
    routes: Vec<Route>,
    global: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new(), global: Vec::new() }
    }

    /// Appends a global middleware. Global layers wrap every matched route,
    /// outermost first in registration order, before any route-scoped layer.
    ///
    /// They never see unmatched requests: [`handle`](Router::handle) answers
    /// those with a 404 before any chain is composed.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.global.push(middleware.into_boxed_middleware());
        self
    }

    /// Registers a handler for a method + path pair. Returns `self` for
    /// chaining.
    ///
    /// Path patterns use `:name` segments for single-component captures
    /// (`ctx.param("name")` retrieves them) and may end in `*` to match
    /// everything after. No escaping is ever needed.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is structurally invalid — at startup, never at
    /// request time.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(MethodRule::Only(method), path, Vec::new(), handler)
    }

    /// Like [`on`](Router::on), with a route-scoped middleware [`Stack`]
    /// that runs inside the global layers for this route only.
    pub fn on_with(self, method: Method, path: &str, stack: Stack, handler: impl Handler) -> Self {
        self.add(MethodRule::Only(method), path, stack.layers, handler)
    }

    /// Registers a handler matching **any** verb at `path`.
    pub fn any(self, path: &str, handler: impl Handler) -> Self {
        self.add(MethodRule::Any, path, Vec::new(), handler)
    }

    /// Like [`any`](Router::any), with a route-scoped middleware stack.
    pub fn any_with(self, path: &str, stack: Stack, handler: impl Handler) -> Self {
        self.add(MethodRule::Any, path, stack.layers, handler)
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    fn add(
        mut self,
        rule: MethodRule,
        path: &str,
        middleware: Vec<BoxedMiddleware>,
        handler: impl Handler,
    ) -> Self {
        let pattern = Pattern::parse(path)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        // Fire-and-forget operator breadcrumb; never blocks registration.
        info!(method = %rule, pattern = %pattern.as_str(), "route registered");
        self.routes.push(Route {
            rule,
            pattern,
            handler: handler.into_boxed_handler(),
            middleware,
        });
        self
    }

    /// Mounts `child` behind `prefix`: an any-verb route at `prefix/*` whose
    /// handler strips the prefix (an empty remainder becomes `/`), keeps the
    /// query string, and delegates to the child's [`handle`](Router::handle).
    /// The child needs no awareness of its mount point.
    ///
    /// This is an ordinary wildcard route, so it participates in normal
    /// match-order precedence — mount before registering any conflicting
    /// general route on the parent.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` is not of the form `/segment[/segment…]` with no
    /// trailing slash and no pattern syntax.
    pub fn mount(self, prefix: &str, child: Router) -> Self {
        assert!(
            prefix.len() > 1
                && prefix.starts_with('/')
                && !prefix.ends_with('/')
                && !prefix.contains([':', '*', '?']),
            "invalid mount prefix `{prefix}`"
        );

        let child = Arc::new(child);
        let prefix_owned = prefix.to_owned();
        let delegate = move |ctx: Context| {
            let child = Arc::clone(&child);
            let prefix = prefix_owned.clone();
            async move {
                let rest = ctx.path().strip_prefix(prefix.as_str()).unwrap_or("");
                let rest = if rest.is_empty() { "/" } else { rest };
                let request = ctx.request().rewritten(rest);
                child.handle(request).await
            }
        };

        self.any(&format!("{prefix}/*"), delegate)
    }

    /// Dispatches one request through the pipeline.
    ///
    /// Scans the table in registration order; no match returns a plain 404
    /// with **zero** middleware invoked (global middleware never see
    /// unmatched requests — wrap the router itself to observe those).
    /// Otherwise a fresh [`Context`] is built, the chain composed, and its
    /// result — response or error — returned to the caller untouched.
    pub async fn handle(&self, request: Request) -> Result<Response, Error> {
        let matched = self.routes.iter().find_map(|route| {
            if !route.rule.allows(request.method()) {
                return None;
            }
            let params = route.pattern.capture(request.path())?;
            Some((route, params))
        });

        let Some((route, params)) = matched else {
            return Ok(Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text("route not found"));
        };

        let stack: Vec<BoxedMiddleware> =
            self.global.iter().chain(&route.middleware).cloned().collect();
        let chain = Chain::new(stack, Arc::clone(&route.handler));
        let ctx = Context::new(request, params);
        chain.run(ctx).await
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Next;
    use bytes::Bytes;
    use http::HeaderMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(method: Method, target: &str) -> Request {
        Request::new(method, target, HeaderMap::new(), Bytes::new())
    }

    async fn status_of(router: &Router, method: Method, target: &str) -> StatusCode {
        router.handle(request(method, target)).await.unwrap().status_code()
    }

    #[tokio::test]
    async fn first_registered_match_wins() {
        // The general pattern comes first and shadows the specific one.
        let router = Router::new()
            .get("/users/:id", |_ctx: Context| async { Response::text("general") })
            .get("/users/42", |_ctx: Context| async { Response::text("specific") });

        let response = router.handle(request(Method::GET, "/users/42")).await.unwrap();
        assert_eq!(response.body(), b"general");
    }

    #[tokio::test]
    async fn params_are_extracted_into_the_context() {
        let router = Router::new().get("/users/:id", |ctx: Context| async move {
            Response::text(ctx.param("id").unwrap_or("missing").to_owned())
        });

        let response = router.handle(request(Method::GET, "/users/42")).await.unwrap();
        assert_eq!(response.body(), b"42");
        // No trailing wildcard: the longer path is unmatched.
        assert_eq!(status_of(&router, Method::GET, "/users/42/edit").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn any_verb_routes_match_every_method() {
        let router = Router::new().any("/ping", |_ctx: Context| async { Response::text("pong") });

        for method in [Method::GET, Method::POST, Method::DELETE, Method::PATCH] {
            assert_eq!(status_of(&router, method, "/ping").await, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn exact_verb_routes_reject_other_methods() {
        let router = Router::new().get("/ping", |_ctx: Context| async { Response::text("pong") });
        assert_eq!(status_of(&router, Method::POST, "/ping").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unmatched_requests_bypass_all_middleware() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invoked);
        let counting = move |ctx: Context, next: Next| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::Relaxed);
                next.run(ctx).await.map(Some)
            }
        };

        let router = Router::new()
            .wrap(counting)
            .get("/known", |_ctx: Context| async { Response::text("ok") });

        assert_eq!(status_of(&router, Method::GET, "/does-not-exist").await, StatusCode::NOT_FOUND);
        assert_eq!(invoked.load(Ordering::Relaxed), 0);

        assert_eq!(status_of(&router, Method::GET, "/known").await, StatusCode::OK);
        assert_eq!(invoked.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn global_layers_run_before_route_layers() {
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        fn noting(
            order: &Arc<Mutex<Vec<&'static str>>>,
            label: &'static str,
        ) -> impl Middleware {
            let order = Arc::clone(order);
            move |ctx: Context, next: Next| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(label);
                    next.run(ctx).await.map(Some)
                }
            }
        }

        let router = Router::new().wrap(noting(&order, "global")).on_with(
            Method::GET,
            "/",
            Stack::new().push(noting(&order, "route")),
            |_ctx: Context| async { Response::text("ok") },
        );

        router.handle(request(Method::GET, "/")).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["global", "route"]);
    }

    #[tokio::test]
    async fn mounted_child_sees_the_stripped_path() {
        let child = Router::new()
            .get("/ping", |_ctx: Context| async { Response::text("pong") })
            .get("/", |_ctx: Context| async { Response::text("api root") });

        let router = Router::new().mount("/api", child);

        let response = router.handle(request(Method::GET, "/api/ping")).await.unwrap();
        assert_eq!(response.body(), b"pong");

        // An empty remainder rewrites to "/".
        let response = router.handle(request(Method::GET, "/api")).await.unwrap();
        assert_eq!(response.body(), b"api root");

        // Unknown child path: the child's own 404 comes back.
        assert_eq!(status_of(&router, Method::GET, "/api/nope").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mount_preserves_the_query_string() {
        let child = Router::new().get("/search", |ctx: Context| async move {
            Response::text(ctx.query_param("q").unwrap_or("none").to_owned())
        });
        let router = Router::new().mount("/api", child);

        let response = router.handle(request(Method::GET, "/api/search?q=rust")).await.unwrap();
        assert_eq!(response.body(), b"rust");
    }

    #[tokio::test]
    async fn routers_are_independent_instances() {
        let first = Router::new().get("/only-here", |_ctx: Context| async { Response::text("1") });
        let second = Router::new();

        assert_eq!(status_of(&first, Method::GET, "/only-here").await, StatusCode::OK);
        assert_eq!(status_of(&second, Method::GET, "/only-here").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chain_errors_reach_the_caller_of_handle() {
        let router = Router::new().get("/boom", |_ctx: Context| async {
            Err::<Response, Error>(Error::message("boom"))
        });
        let err = router.handle(request(Method::GET, "/boom")).await.unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }

    #[test]
    #[should_panic(expected = "invalid route `users`")]
    fn invalid_patterns_panic_at_registration() {
        Router::new().get("users", |_ctx: Context| async { Response::text("never") });
    }

    #[test]
    #[should_panic(expected = "invalid mount prefix")]
    fn invalid_mount_prefixes_panic() {
        Router::new().mount("/api/", Router::new());
    }
}
