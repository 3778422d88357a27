//! Outgoing HTTP response type, builder, and finalization sinks.
//!
//! A [`Response`] is mutable only while a handler holds it. Handing it to a
//! [`ResponseSink`] is *finalization*: the single point where the response
//! leaves the application, and the event completion logging keys off.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK)
///
/// ```rust
/// use aloha::Response;
/// use http::StatusCode;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::OK);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use aloha::Response;
/// use http::StatusCode;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// `200 OK` with an `application/json` body. Pass bytes straight from
    /// your serializer.
    pub fn json(body: Vec<u8>) -> Self {
        Self::with_content_type("application/json", body)
    }

    /// `200 OK` with a `text/plain; charset=utf-8` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_content_type("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// A response with the given status and no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    fn with_content_type(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            body,
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

    /// Converts into the wire-level response handed back to the transport.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        for (name, value) in self.headers {
            // A header pair that cannot be represented on the wire is a
            // handler bug; drop it rather than tear down the connection.
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                res.headers_mut().append(name, value);
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `200 OK`; terminated by a
/// typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Vec::new() }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { status: self.status, headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`], so handlers can return their own
/// types directly.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

/// Return a bare [`StatusCode`] from a handler for a body-less response.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

// ── Finalization ──────────────────────────────────────────────────────────────

/// Destination for a finalized response.
///
/// `send` is finalization: after it returns, the response is out of the
/// application's hands. The pipeline finalizes every request exactly once
/// through whichever sink it was given; decorators (see
/// [`LoggedSink`](crate::middleware::LoggedSink)) compose around this trait
/// instead of patching anything in place.
pub trait ResponseSink {
    fn send(&mut self, response: Response);
}

/// Sink that parks the finalized response for the transport to collect.
#[derive(Default)]
pub struct ResponseSlot {
    response: Option<Response>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Option<Response> {
        self.response.take()
    }
}

impl ResponseSink for ResponseSlot {
    fn send(&mut self, response: Response) {
        // First finalization wins; a response cannot change once sent.
        if self.response.is_none() {
            self.response = Some(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_content_type() {
        let res = Response::json(br#"{"ok":true}"#.to_vec());
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn status_has_no_body_or_headers() {
        let res = Response::status(StatusCode::OK);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn builder_prepends_content_type() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .json(b"{}".to_vec());
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.header("location"), Some("/users/42"));
    }

    #[test]
    fn into_http_carries_status_headers_and_body() {
        let http = Response::json(b"[1]".to_vec()).into_http();
        assert_eq!(http.status(), StatusCode::OK);
        assert_eq!(
            http.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn slot_keeps_first_response() {
        let mut slot = ResponseSlot::new();
        slot.send(Response::status(StatusCode::OK));
        slot.send(Response::status(StatusCode::NOT_FOUND));
        assert_eq!(slot.take().unwrap().status_code(), StatusCode::OK);
        assert!(slot.take().is_none());
    }
}
