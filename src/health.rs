//! Built-in Kubernetes health-check handlers.
//!
//! Kubernetes asks two questions. trellis answers them.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them on your router:
//!
//! ```rust,no_run
//! use trellis::{Router, health};
//!
//! let app = Router::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```
//!
//! Override `readiness` with a custom handler if you need to gate on
//! dependency availability (database connections, downstream services, etc.).

use crate::{Context, Response};

/// Kubernetes liveness probe handler.
///
/// Always returns `200 OK` with body `"ok"`. If the process can respond to
/// HTTP at all, it is alive — this handler intentionally has no dependencies.
pub async fn liveness(_ctx: Context) -> Response {
    Response::text("ok")
}

/// Kubernetes readiness probe handler (default implementation).
///
/// Returns `200 OK` with body `"ready"`. Replace this with your own handler
/// if your application needs a warm-up period or must verify dependency
/// health before accepting traffic.
pub async fn readiness(_ctx: Context) -> Response {
    Response::text("ready")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Router;
    use crate::request::Request;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};

    #[tokio::test]
    async fn probes_answer_200() {
        let router = Router::new()
            .get("/healthz", liveness)
            .get("/readyz", readiness);

        for path in ["/healthz", "/readyz"] {
            let req = Request::new(Method::GET, path, HeaderMap::new(), Bytes::new());
            let response = router.handle(req).await.unwrap();
            assert_eq!(response.status_code(), StatusCode::OK);
        }
    }
}
