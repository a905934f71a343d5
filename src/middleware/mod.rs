//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection, fault
//! recovery, authentication-header inspection.
//!
//! A middleware is any `async fn` of shape `(Context, Next) -> impl
//! IntoOutcome`. It may:
//!
//! - run the rest of the chain and reshape its result
//!   (`next.run(ctx).await`),
//! - return its own response without calling `next` at all
//!   (short-circuiting: auth rejection, cache hit),
//! - mutate the context (state map, staged response) and yield nothing,
//!   leaving the response to downstream layers or the finalizer.
//!
//! ```rust
//! use trellis::{Context, Next, Outcome, Response, StatusCode};
//!
//! async fn auth(ctx: Context, next: Next) -> Outcome {
//!     if ctx.request().header("authorization").is_none() {
//!         return Ok(Some(Response::status(StatusCode::UNAUTHORIZED)));
//!     }
//!     next.run(ctx).await.map(Some)
//! }
//! ```
//!
//! Register globally with [`Router::wrap`](crate::Router::wrap) or per route
//! with a [`Stack`]; global layers run first, in registration order.

mod chain;

pub(crate) use chain::Chain;
pub use chain::Next;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use http::StatusCode;
use tracing::{error, info};

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::response::{IntoOutcome, Outcome, Response};

// ── Trait and type erasure ────────────────────────────────────────────────────
//
// Same scheme as `handler.rs`: a sealed public trait satisfied by a blanket
// impl, a newtype bridging to a trait object, `Arc` for cheap sharing.

/// Internal dispatch interface for middleware.
#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, ctx: Context, next: Next) -> BoxFuture;
}

/// A heap-allocated, type-erased middleware shared across concurrent requests.
#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every valid middleware.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(ctx: Context, next: Next) -> impl IntoOutcome
/// ```
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(FnMiddleware(self))
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut, R> ErasedMiddleware for FnMiddleware<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, ctx: Context, next: Next) -> BoxFuture {
        let fut = (self.0)(ctx, next);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── Stack ─────────────────────────────────────────────────────────────────────

/// An ordered list of route-scoped middleware.
///
/// ```rust,no_run
/// # use trellis::{middleware::Stack, Context, Method, Next, Outcome, Response, Router};
/// # async fn require_admin(ctx: Context, next: Next) -> Outcome { next.run(ctx).await.map(Some) }
/// # async fn audit(ctx: Context, next: Next) -> Outcome { next.run(ctx).await.map(Some) }
/// # async fn purge(_ctx: Context) -> Response { Response::text("gone") }
/// Router::new().on_with(
///     Method::DELETE,
///     "/cache/:key",
///     Stack::new().push(require_admin).push(audit),
///     purge,
/// );
/// ```
#[derive(Default)]
pub struct Stack {
    pub(crate) layers: Vec<BoxedMiddleware>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one layer. Layers run in push order.
    pub fn push(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(middleware.into_boxed_middleware());
        self
    }
}

// ── Built-in middleware ───────────────────────────────────────────────────────

/// Per-request log line: method, path, status, latency.
///
/// Register it outermost (before anything that short-circuits) so every
/// matched request gets a line.
pub async fn trace(ctx: Context, next: Next) -> Outcome {
    let start = Instant::now();
    let method = ctx.method().clone();
    let path = ctx.path().to_owned();

    let response = next.run(ctx).await?;

    info!(
        %method,
        %path,
        status = response.status_code().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    Ok(Some(response))
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Assigns each request an id, stores it in context state under
/// `"request.id"`, and stages it as an `x-request-id` response header.
pub async fn request_id(ctx: Context, next: Next) -> Outcome {
    let id = format!("{:016x}", NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed));
    ctx.insert("request.id", id.clone());
    ctx.stage_header("x-request-id", id);
    next.run(ctx).await.map(Some)
}

/// Outermost fault boundary: maps any `Err` from the rest of the chain to a
/// logged `500`. Without it, chain failures propagate to whatever called
/// [`Router::handle`](crate::Router::handle).
pub async fn recover(ctx: Context, next: Next) -> Outcome {
    match next.run(ctx).await {
        Ok(response) => Ok(Some(response)),
        Err(e) => {
            error!("request failed: {e}");
            Ok(Some(
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .text("internal server error"),
            ))
        }
    }
}
