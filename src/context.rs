//! Per-request context.
//!
//! One [`Context`] exists per inbound request. The router builds it right
//! before the middleware chain runs; middleware and the terminal handler
//! mutate it during that single request; it is dropped once the response is
//! out. No two requests ever share one.
//!
//! `Context` is `Clone`, but cloning hands out another view of the *same*
//! request's shared interior — the chain needs owned values to move through
//! boxed futures. It never produces a fresh context; only the router does.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use http::{HeaderMap, Method, StatusCode};

use crate::request::Request;
use crate::response::Response;

// ── Url ───────────────────────────────────────────────────────────────────────

/// The request target split into path and query, parsed exactly once at
/// context creation so no two middleware repeat the work.
struct Url {
    path: String,
    query: Option<String>,
}

impl Url {
    fn parse(target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self { path: path.to_owned(), query: Some(query.to_owned()) },
            None => Self { path: target.to_owned(), query: None },
        }
    }
}

// ── Staged response ───────────────────────────────────────────────────────────

/// Response fields accumulated on the context before any full response
/// object exists. Consumed by the finalizer when a chain layer yields no
/// explicit response.
#[derive(Default)]
struct Staged {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Everything a middleware or handler may know about one request.
///
/// Three kinds of data live here:
///
/// - the immutable request view ([`request`](Context::request), the parsed
///   path/query, the captured route [`param`](Context::param)s),
/// - the **state map** — the only sanctioned channel for middleware to pass
///   data to downstream middleware and the handler
///   ([`insert`](Context::insert) / [`get`](Context::get)),
/// - the **staged response** — status and headers a layer may set without
///   constructing a full [`Response`](crate::Response)
///   ([`stage_status`](Context::stage_status) /
///   [`stage_header`](Context::stage_header)).
#[derive(Clone)]
pub struct Context {
    request: Arc<Request>,
    url: Arc<Url>,
    params: Arc<HashMap<String, String>>,
    state: Arc<Mutex<HashMap<String, Box<dyn Any + Send + Sync>>>>,
    staged: Arc<Mutex<Staged>>,
}

impl Context {
    /// Builds a fresh context from a matched request. The URL is parsed here,
    /// once; state and staged response start empty every time. No I/O — body
    /// consumption is whichever layer's business.
    pub(crate) fn new(request: Request, params: HashMap<String, String>) -> Self {
        let url = Url::parse(request.target());
        Self {
            request: Arc::new(request),
            url: Arc::new(url),
            params: Arc::new(params),
            state: Arc::new(Mutex::new(HashMap::new())),
            staged: Arc::new(Mutex::new(Staged::default())),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// The request path, query string excluded.
    pub fn path(&self) -> &str {
        &self.url.path
    }

    /// The raw query string, if the request carried one.
    pub fn query(&self) -> Option<&str> {
        self.url.query.as_deref()
    }

    /// Looks up one query parameter by name (`?page=2&sort=asc` style).
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
    }

    /// Returns a named path parameter captured by the matched route.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    // ── State map ────────────────────────────────────────────────────────────

    /// Stores a value for downstream middleware and the handler.
    ///
    /// ```rust
    /// # use trellis::Context;
    /// # fn demo(ctx: &Context) {
    /// ctx.insert("request.id", "4f1a".to_owned());
    /// # }
    /// ```
    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.state
            .lock()
            .expect("context state lock poisoned")
            .insert(key.into(), Box::new(value));
    }

    /// Retrieves a value stored by an upstream middleware. Returns `None` if
    /// the key is absent or holds a different type.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.state
            .lock()
            .expect("context state lock poisoned")
            .get(key)?
            .downcast_ref::<T>()
            .cloned()
    }

    // ── Staged response ──────────────────────────────────────────────────────

    /// Stages a status code for the finalizer. Only consulted when no layer
    /// returns an explicit response.
    pub fn stage_status(&self, status: StatusCode) {
        self.staged
            .lock()
            .expect("staged response lock poisoned")
            .status = Some(status);
    }

    /// Stages a header for the finalizer.
    pub fn stage_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.staged
            .lock()
            .expect("staged response lock poisoned")
            .headers
            .push((name.into(), value.into()));
    }

    /// The response finalizer: synthesizes a minimal response from whatever
    /// was staged. Defaults to an empty `200 OK` when nothing was. Called by
    /// the dispatch chain for every frame that yields no explicit response,
    /// so the chain's outer return value is always concrete.
    pub(crate) fn finalize(&self) -> Response {
        let staged = self.staged.lock().expect("staged response lock poisoned");
        let mut response = Response::status(staged.status.unwrap_or(StatusCode::OK));
        for (name, value) in &staged.headers {
            response.set_header(name, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn context(target: &str) -> Context {
        let req = Request::new(Method::GET, target, HeaderMap::new(), Bytes::new());
        Context::new(req, HashMap::new())
    }

    #[test]
    fn url_is_split_into_path_and_query() {
        let ctx = context("/search?q=rust&page=2");
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query(), Some("q=rust&page=2"));
        assert_eq!(ctx.query_param("page"), Some("2"));
        assert_eq!(ctx.query_param("missing"), None);
    }

    #[test]
    fn state_round_trips_typed_values() {
        let ctx = context("/");
        ctx.insert("request.id", "4f1a".to_owned());
        assert_eq!(ctx.get::<String>("request.id"), Some("4f1a".to_owned()));
        // Wrong type at the same key is a miss, not a panic.
        assert_eq!(ctx.get::<u64>("request.id"), None);
    }

    #[test]
    fn state_starts_empty_per_context() {
        let first = context("/");
        first.insert("request.id", "old".to_owned());
        let second = context("/");
        assert_eq!(second.get::<String>("request.id"), None);
    }

    #[test]
    fn clones_share_one_request_interior() {
        let ctx = context("/");
        let view = ctx.clone();
        view.insert("seen", true);
        assert_eq!(ctx.get::<bool>("seen"), Some(true));
    }

    #[test]
    fn finalize_defaults_to_empty_200() {
        let response = context("/").finalize();
        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.body().is_empty());
    }

    #[test]
    fn finalize_uses_staged_status_and_headers() {
        let ctx = context("/");
        ctx.stage_status(StatusCode::CREATED);
        ctx.stage_header("x-request-id", "4f1a");
        let response = ctx.finalize();
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.header("x-request-id"), Some("4f1a"));
    }
}
