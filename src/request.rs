//! Incoming HTTP request type.
//!
//! The host boundary: whatever network layer fronts the pipeline (the
//! built-in [`Server`](crate::Server), a test harness, an embedding runtime)
//! builds one `Request` per inbound call and hands it to
//! [`Router::handle`](crate::Router::handle). The body is already
//! materialized bytes — the pipeline performs no I/O of its own.

use bytes::Bytes;
use http::{HeaderMap, Method};

/// An incoming HTTP request as seen by the pipeline.
#[derive(Clone)]
pub struct Request {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Builds a request from its parts. `target` is the request target as
    /// received: a path, optionally followed by `?` and a query string.
    pub fn new(method: Method, target: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, target: target.into(), headers, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request target, query string included.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path portion of the target, query string excluded.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup. Returns `None` for absent headers and
    /// for values that are not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The same request under a different path. Used by sub-router mounts to
    /// strip their prefix; the query string survives the rewrite. Cheap: the
    /// body is `Bytes`, so no payload copy happens.
    pub(crate) fn rewritten(&self, path: &str) -> Self {
        let target = match self.target.split_once('?') {
            Some((_, query)) => format!("{path}?{query}"),
            None => path.to_owned(),
        };
        Self {
            method: self.method.clone(),
            target,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}
