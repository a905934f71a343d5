//! Outgoing HTTP response type and the conversion traits.
//!
//! Build a [`Response`] in your handler and return it. Chain layers that do
//! not want to produce a full response return something implementing
//! [`IntoOutcome`] instead — `Ok(None)`, or plain `()` — and the response
//! finalizer takes over from the staged context state.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::error;

use crate::error::Error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    EventStream, // text/event-stream  (SSE)
    FormData,    // application/x-www-form-urlencoded
    Html,        // text/html; charset=utf-8
    Json,        // application/json
    OctetStream, // application/octet-stream  (binary / file download)
    Text,        // text/plain; charset=utf-8
    Xml,         // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::EventStream => "text/event-stream",
            Self::FormData    => "application/x-www-form-urlencoded",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use trellis::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use trellis::{ContentType, Response, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .status(StatusCode::OK)
///     .bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    body: Bytes,
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl Response {
    /// `200 OK` — `application/json`. Pass bytes from your serialiser
    /// directly; trellis does not touch them.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::bytes_raw("application/json", body.into())
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", body.into().into_bytes().into())
    }

    /// Response with the given status and no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Bytes::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    fn bytes_raw(content_type: &str, body: Bytes) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: StatusCode::OK,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replaces the status. For middleware reshaping a downstream response.
    pub fn set_status(&mut self, code: StatusCode) {
        self.status = code;
    }

    /// Appends a header. For middleware injecting headers after the fact.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Conversion at the hyper boundary. Header names come from free-form
    /// strings, so an invalid one degrades the whole response to a bare 500
    /// rather than a dropped connection.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(Full::new(self.body)) {
            Ok(response) => response,
            Err(e) => {
                error!("invalid response headers: {e}");
                http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::new()))
                    .expect("bare 500 response is always valid")
            }
        }
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method — you always know what you're sending.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish("application/json", body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes().into())
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, SSE, etc.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type.as_str(), body.into())
    }

    /// Terminate with no body (e.g. `NO_CONTENT`, redirects).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Bytes) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

// ── Outcome / IntoOutcome ─────────────────────────────────────────────────────

/// What one chain layer hands back to the dispatcher: a response, a deferral
/// to the finalizer (`Ok(None)`), or a failure that propagates up the chain.
pub type Outcome = Result<Option<Response>, Error>;

/// Conversion into an [`Outcome`].
///
/// Lets handlers and middleware return whichever shape reads best:
/// a bare [`Response`], `()` to defer entirely to the staged response, a
/// [`StatusCode`], or any `Result` over those.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome { self }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome { Ok(Some(self)) }
}

impl IntoOutcome for Option<Response> {
    fn into_outcome(self) -> Outcome { Ok(self) }
}

impl IntoOutcome for Result<Response, Error> {
    fn into_outcome(self) -> Outcome { self.map(Some) }
}

/// A layer that only mutates the context returns `()` — the finalizer builds
/// the response from staged state.
impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome { Ok(None) }
}

impl IntoOutcome for StatusCode {
    fn into_outcome(self) -> Outcome { Ok(Some(self.into_response())) }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome { Ok(Some(self.into_response())) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome { Ok(Some(self.into_response())) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_set_status_and_content_type() {
        let response = Response::json(br#"{"id":1}"#.to_vec());
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("application/json"));

        let response = Response::status(StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn builder_keeps_custom_headers_after_content_type() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .json(br#"{"id":42}"#.to_vec());
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("Location"), Some("/users/42"));
    }

    #[test]
    fn into_http_carries_status_headers_and_body() {
        let http = Response::builder()
            .status(StatusCode::ACCEPTED)
            .header("x-trace", "1")
            .text("later")
            .into_http();
        assert_eq!(http.status(), StatusCode::ACCEPTED);
        assert_eq!(http.headers().get("x-trace").unwrap(), "1");
    }

    #[test]
    fn unit_outcome_defers_to_the_finalizer() {
        assert!(matches!(().into_outcome(), Ok(None)));
    }

    #[test]
    fn status_outcome_is_an_explicit_response() {
        let outcome = StatusCode::FORBIDDEN.into_outcome();
        let response = outcome.unwrap().unwrap();
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }
}
