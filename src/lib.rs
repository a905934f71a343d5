//! # trellis
//!
//! An HTTP router and onion-model middleware pipeline for Rust services
//! behind a reverse proxy. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! nginx handles TLS, rate limiting, slow clients, and body-size limits.
//! trellis does not — by design. The proxy does proxy things. The pipeline
//! does pipeline things:
//!
//! - **Routing** — registration-order matching with `:name` captures and
//!   trailing-`*` wildcards; the first structural match wins, so route
//!   ordering is precedence. Predictable over clever.
//! - **Middleware** — the onion model: each layer runs code before and after
//!   the rest of the chain via an explicit `next` continuation, with a
//!   single-invocation guarantee enforced at runtime.
//! - **Context** — one per request, never reused; a typed state map and a
//!   staged response carry data between layers.
//! - **Finalization** — layers that only mutate context still produce a
//!   concrete response; the finalizer fills the gap from staged state.
//! - **Hosting** — a tokio + hyper HTTP/1.1 adapter with graceful shutdown,
//!   or call [`Router::handle`] from your own runtime.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{middleware, Context, Method, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .wrap(middleware::recover)
//!         .wrap(middleware::trace)
//!         .on(Method::GET,  "/users/:id", get_user)
//!         .on(Method::POST, "/users",     create_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(ctx: Context) -> Response {
//!     let id = ctx.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(ctx: Context) -> Response {
//!     if ctx.request().body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(r#"{"id":"99"}"#.as_bytes().to_vec())
//! }
//! ```
//!
//! ## Writing middleware
//!
//! Any `async fn (Context, Next) -> impl IntoOutcome` composes. Call
//! `next.run(ctx)` to execute the rest of the chain and get its response
//! back; skip the call to short-circuit; return `()` or `Ok(None)` to let
//! the finalizer build the response from staged context state. Errors are
//! ordinary `Result`s flowing up the chain — put
//! [`middleware::recover`] outermost to turn them into 500s.

mod context;
mod error;
mod handler;
mod pattern;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;

pub use context::Context;
pub use error::Error;
pub use handler::Handler;
pub use middleware::{Middleware, Next, Stack};
pub use request::Request;
pub use response::{ContentType, IntoOutcome, IntoResponse, Outcome, Response};
pub use router::Router;
pub use server::Server;

// The HTTP vocabulary is the `http` crate's; re-exported so downstreams need
// not depend on it directly.
pub use http::{Method, StatusCode};
