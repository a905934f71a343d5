//! Minimal trellis example — JSON endpoints, middleware, a mounted
//! sub-router, and health checks.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:3000/api/ping
//!   curl http://localhost:3000/healthz

use trellis::{Context, Method, Response, Router, Server, StatusCode, health, middleware};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Mounted routers see paths with their prefix stripped: a request to
    // /api/ping reaches the child's /ping route.
    let api = Router::new()
        .get("/ping", ping)
        .get("/version", version);

    let app = Router::new()
        .wrap(middleware::recover)
        .wrap(middleware::trace)
        .wrap(middleware::request_id)
        .mount("/api", api)
        .on(Method::GET, "/users/:id", get_user)
        .on(Method::POST, "/users", create_user)
        .on(Method::DELETE, "/users/:id", delete_user)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

async fn ping(_ctx: Context) -> Response {
    Response::text("pong")
}

async fn version(_ctx: Context) -> Response {
    Response::json(br#"{"version":"0.1.0"}"#.to_vec())
}

// GET /users/:id
//
// Response::json takes bytes — pass them from your serialiser:
//   serde_json:  Response::json(serde_json::to_vec(&user).unwrap())
//   hand-built:  Response::json(format!(...).into_bytes())
async fn get_user(ctx: Context) -> Response {
    let id = ctx.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// POST /users
//
// ctx.request().body() is &[u8] — parse with serde_json::from_slice etc.
// trellis does not touch the bytes.
async fn create_user(ctx: Context) -> Response {
    if ctx.request().body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#.as_bytes().to_vec())
}

// DELETE /users/:id → 204 No Content
async fn delete_user(_ctx: Context) -> Response {
    Response::status(StatusCode::NO_CONTENT)
}
