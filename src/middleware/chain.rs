//! The dispatch chain: onion-model middleware composition.
//!
//! A [`Chain`] is the per-route composition of an ordered middleware stack
//! and one terminal handler. Running it executes the onion model: each
//! middleware's "before" code runs, it invokes its continuation
//! ([`Next::run`]), downstream effects happen, and its "after" code runs —
//! in that order, no matter how long any layer suspends on I/O.
//!
//! A single cursor guards the whole execution: every dispatch must strictly
//! increase it. A middleware invoking `next.run` twice would re-enter an
//! already-executed position and double every downstream side effect, so the
//! second call fails loudly with [`Error::DoubleNext`] instead of running.
//!
//! The chain catches nothing. An `Err` from any layer unwinds through every
//! enclosing frame to whoever called [`Router::handle`](crate::Router::handle).
//! Centralized recovery is an ordinary outermost middleware (see
//! [`recover`](crate::middleware::recover)) — omitting it makes unhandled
//! failures visible rather than silently masked.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, ErasedHandler};
use crate::middleware::{BoxedMiddleware, ErasedMiddleware};
use crate::response::Response;

type ChainFuture = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

/// The cursor value before `dispatch(0)` has run.
const BEFORE_START: i64 = -1;

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered middleware stack composed over a terminal handler.
pub(crate) struct Chain {
    stack: Vec<BoxedMiddleware>,
    terminal: BoxedHandler,
}

impl Chain {
    pub(crate) fn new(stack: Vec<BoxedMiddleware>, terminal: BoxedHandler) -> Self {
        Self { stack, terminal }
    }

    /// Runs the whole chain for one request. Always resolves to a concrete
    /// response when no layer fails: every frame that yields nothing passes
    /// through the finalizer.
    pub(crate) async fn run(self, ctx: Context) -> Result<Response, Error> {
        let chain = Arc::new(self);
        let cursor = Arc::new(AtomicI64::new(BEFORE_START));
        dispatch(chain, 0, cursor, ctx).await
    }
}

/// One frame of the chain. Boxed because it recurses through `Next::run`.
fn dispatch(
    chain: Arc<Chain>,
    index: usize,
    cursor: Arc<AtomicI64>,
    ctx: Context,
) -> ChainFuture {
    Box::pin(async move {
        // Chain state belongs to exactly one request task; the atomic exists
        // so the future stays `Send`, not for cross-request coordination.
        let last = cursor.load(Ordering::Relaxed);
        if index as i64 <= last {
            return Err(Error::DoubleNext { index });
        }
        cursor.store(index as i64, Ordering::Relaxed);

        let outcome = if index == chain.stack.len() {
            chain.terminal.call(ctx.clone()).await?
        } else {
            let next = Next {
                chain: Arc::clone(&chain),
                cursor: Arc::clone(&cursor),
                index: index + 1,
            };
            chain.stack[index].call(ctx.clone(), next).await?
        };

        Ok(match outcome {
            Some(response) => response,
            None => ctx.finalize(),
        })
    })
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The continuation a middleware invokes to run the remainder of the chain.
///
/// `next.run(ctx)` executes the next middleware — or the terminal handler if
/// none remain — and resolves to that remainder's concrete response, so the
/// caller may inspect or transform it before returning. Not calling it at
/// all short-circuits the chain. Calling it a second time is a middleware
/// authoring defect and fails with [`Error::DoubleNext`].
pub struct Next {
    chain: Arc<Chain>,
    cursor: Arc<AtomicI64>,
    index: usize,
}

impl Next {
    /// Executes the rest of the chain and returns its response.
    pub async fn run(&self, ctx: Context) -> Result<Response, Error> {
        dispatch(Arc::clone(&self.chain), self.index, Arc::clone(&self.cursor), ctx).await
    }
}
