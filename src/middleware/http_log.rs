//! Request/response logging middleware.
//!
//! Every request produces exactly two `info` entries: `HTTP Request` at
//! ingress, before any routing, and `HTTP Response` when the response is
//! finalized — whichever path produced it. Both carry the request id
//! assigned here, so one grep reconstructs a request's whole story.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

use http_body_util::BodyExt;
use serde_json::{json, Map, Value};

use crate::errors::Error;
use crate::logger::{Level, Logger};
use crate::request::Request;
use crate::response::{Response, ResponseSink};

/// The logging middleware. One per process, wired into the pipeline by
/// [`App`](crate::App).
pub struct HttpLog {
    logger: Logger,
}

impl HttpLog {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Builds the request context from the raw transport request and emits
    /// the `HTTP Request` entry.
    ///
    /// This is the pipeline's ingress point: the request id and capture
    /// instant are assigned here, before any routing or handling, and stay
    /// fixed for the life of the request.
    pub async fn ingress<B>(&self, req: http::Request<B>) -> Result<Request, Error>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());
        let path = parts.uri.path().to_owned();
        let query = parts.uri.query().map(parse_query).unwrap_or_default();
        let headers: Vec<(String, String)> = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::BodyRead(e.to_string()))?
            .to_bytes();
        let ip = client_ip(&headers);

        let req = Request::new(parts.method, url, path, query, headers, body, ip);
        self.logger
            .info("HTTP Request", Some(request_data(&req)), Some(&req));
        Ok(req)
    }

    /// Wraps `inner` so that the first finalization also emits the
    /// `HTTP Response` entry.
    pub fn instrument<S: ResponseSink>(&self, req: &Request, inner: S) -> LoggedSink<S> {
        LoggedSink {
            logger: self.logger.clone(),
            request_id: req.id().to_owned(),
            started: req.received_at(),
            inner,
            armed: true,
        }
    }

    /// Records an uncaught failure, detail and all. Runs before the
    /// catch-all builds its generic response; the detail never leaves the
    /// log.
    pub fn failure(&self, err: &Error, request_id: &str) {
        self.logger.correlated(
            Level::Error,
            "Unhandled Exception",
            Some(json!({ "error": err.to_string() })),
            request_id,
        );
    }
}

// ── LoggedSink ────────────────────────────────────────────────────────────────

/// [`ResponseSink`] decorator that logs the response on first finalization.
///
/// The wrapper disarms itself before delegating, so a second `send` is
/// indistinguishable from using the wrapped sink directly — the inner sink
/// still sees every call, the log sees exactly one entry.
pub struct LoggedSink<S> {
    logger: Logger,
    request_id: String,
    started: Instant,
    inner: S,
    armed: bool,
}

impl<S> LoggedSink<S> {
    /// Unwraps the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResponseSink> ResponseSink for LoggedSink<S> {
    fn send(&mut self, response: Response) {
        if !self.armed {
            return self.inner.send(response);
        }
        self.armed = false;

        let data = response_data(&response, self.started.elapsed().as_millis() as u64);
        self.inner.send(response);
        self.logger
            .correlated(Level::Info, "HTTP Response", Some(data), &self.request_id);
    }
}

// ── Log payloads ──────────────────────────────────────────────────────────────

fn request_data(req: &Request) -> Value {
    let mut data = Map::new();
    data.insert("url".to_owned(), req.url().into());
    data.insert("method".to_owned(), req.method().as_str().into());
    data.insert("query".to_owned(), string_map(req.query().iter()));
    data.insert("params".to_owned(), string_map(req.params().iter()));
    data.insert(
        "headers".to_owned(),
        string_map(req.headers().iter().map(|(k, v)| (k, v))),
    );
    if let Some(body) = body_repr(req.body(), req.header("content-type")) {
        data.insert("body".to_owned(), body);
    }
    if let Some(ip) = req.ip() {
        data.insert("ip".to_owned(), ip.to_string().into());
    }
    Value::Object(data)
}

fn response_data(res: &Response, elapsed_ms: u64) -> Value {
    let mut data = Map::new();
    data.insert("statusCode".to_owned(), res.status_code().as_u16().into());
    data.insert(
        "headers".to_owned(),
        string_map(res.headers().iter().map(|(k, v)| (k, v))),
    );
    if let Some(body) = body_repr(res.body(), res.header("content-type")) {
        data.insert("body".to_owned(), body);
    }
    data.insert("responseTime".to_owned(), elapsed_ms.into());
    Value::Object(data)
}

/// Shared body rendering: the parsed structure when the content type says
/// JSON and the bytes agree, the raw string otherwise, nothing when empty.
fn body_repr(body: &[u8], content_type: Option<&str>) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    if content_type.is_some_and(|ct| ct.contains("json")) {
        if let Ok(parsed) = serde_json::from_slice(body) {
            return Some(parsed);
        }
    }
    Some(Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn string_map<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> Value {
    Value::Object(
        entries
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// First hop of `x-forwarded-for`. The service sits behind a proxy or
/// platform front door that sets it for all real traffic; a request without
/// it is an infrastructure probe, not a client.
fn client_ip(headers: &[(String, String)]) -> Option<IpAddr> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("x-forwarded-for"))
        .and_then(|(_, value)| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use serde_json::json;

    use super::*;
    use crate::logger::CaptureSink;
    use crate::response::ResponseSlot;

    fn capture() -> (HttpLog, CaptureSink) {
        let sink = CaptureSink::new();
        (HttpLog::new(Logger::new(sink.clone())), sink)
    }

    fn raw_get(uri: &str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("x-forwarded-for", "216.3.128.12")
            .body(Full::default())
            .unwrap()
    }

    #[tokio::test]
    async fn ingress_logs_request_summary() {
        let (http_log, sink) = capture();
        let raw = http::Request::builder()
            .method(Method::POST)
            .uri("/?name=JohnSmith")
            .header("x-forwarded-for", "216.3.128.12")
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from_static(br#"{"test":"foo"}"#)))
            .unwrap();

        let req = http_log.ingress(raw).await.unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::Info);
        assert_eq!(entries[0].message, "HTTP Request");
        assert_eq!(entries[0].request_id, req.id());

        let data = entries[0].data.as_ref().unwrap();
        assert_eq!(data["url"], "/?name=JohnSmith");
        assert_eq!(data["method"], "POST");
        assert_eq!(data["query"]["name"], "JohnSmith");
        assert_eq!(data["headers"]["content-type"], "application/json");
        assert_eq!(data["ip"], "216.3.128.12");
        assert_eq!(data["body"], json!({"test": "foo"}));
    }

    #[tokio::test]
    async fn ingress_omits_absent_fields() {
        let (http_log, sink) = capture();
        let raw = http::Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Full::<Bytes>::default())
            .unwrap();

        let req = http_log.ingress(raw).await.unwrap();
        assert!(req.ip().is_none());

        let data = sink.entries()[0].data.clone().unwrap();
        assert!(data.get("body").is_none());
        assert!(data.get("ip").is_none());
        assert_eq!(data["query"], json!({}));
    }

    #[tokio::test]
    async fn ingress_decodes_query_parameters() {
        let (http_log, _sink) = capture();
        let req = http_log
            .ingress(raw_get("/?name=John%20Smith&x=1"))
            .await
            .unwrap();
        assert_eq!(req.query_param("name"), Some("John Smith"));
        assert_eq!(req.query_param("x"), Some("1"));
    }

    #[tokio::test]
    async fn instrumented_sink_logs_response_once_after_delegating() {
        let (http_log, sink) = capture();
        let req = http_log.ingress(raw_get("/")).await.unwrap();

        let mut logged = http_log.instrument(&req, ResponseSlot::new());
        logged.send(Response::json(br#"{"message":"Hello John!"}"#.to_vec()));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].level, Level::Info);
        assert_eq!(entries[1].message, "HTTP Response");
        assert_eq!(entries[1].request_id, req.id());

        let data = entries[1].data.as_ref().unwrap();
        assert_eq!(data["statusCode"], 200);
        assert_eq!(data["headers"]["content-type"], "application/json");
        assert_eq!(data["body"], json!({"message": "Hello John!"}));
        assert!(data["responseTime"].is_u64());

        // The response itself reached the wrapped sink unchanged.
        let res = logged.into_inner().take().unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn second_send_bypasses_instrumentation() {
        #[derive(Default)]
        struct Counting(Vec<StatusCode>);
        impl ResponseSink for Counting {
            fn send(&mut self, response: Response) {
                self.0.push(response.status_code());
            }
        }

        let (http_log, sink) = capture();
        let req = http_log.ingress(raw_get("/")).await.unwrap();

        let mut logged = http_log.instrument(&req, Counting::default());
        logged.send(Response::status(StatusCode::OK));
        logged.send(Response::status(StatusCode::NOT_FOUND));

        // Both sends reached the inner sink; only the first was logged.
        assert_eq!(logged.into_inner().0, [StatusCode::OK, StatusCode::NOT_FOUND]);
        let entries = sink.entries();
        let completions = entries
            .iter()
            .filter(|e| e.message == "HTTP Response")
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn failure_logs_detail_at_error_level() {
        let (http_log, sink) = capture();
        let err = Error::from(std::io::Error::other("boom"));
        http_log.failure(&err, "abc123");

        let entries = sink.entries();
        assert_eq!(entries[0].level, Level::Error);
        assert_eq!(entries[0].message, "Unhandled Exception");
        assert_eq!(entries[0].request_id, "abc123");
        assert_eq!(entries[0].data, Some(json!({"error": "io: boom"})));
    }

    #[test]
    fn body_repr_parses_json_bodies() {
        let repr = body_repr(br#"{"a":1}"#, Some("application/json; charset=utf-8"));
        assert_eq!(repr, Some(json!({"a": 1})));
    }

    #[test]
    fn body_repr_falls_back_to_string() {
        assert_eq!(
            body_repr(b"plain", Some("text/plain")),
            Some(json!("plain"))
        );
        // Claimed JSON that does not parse is logged as the raw string.
        assert_eq!(
            body_repr(b"not json", Some("application/json")),
            Some(json!("not json"))
        );
        assert_eq!(body_repr(b"no header", None), Some(json!("no header")));
    }

    #[test]
    fn body_repr_omits_empty_bodies() {
        assert_eq!(body_repr(b"", Some("application/json")), None);
    }

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let headers = vec![(
            "X-Forwarded-For".to_owned(),
            "216.3.128.12, 10.0.0.1".to_owned(),
        )];
        assert_eq!(client_ip(&headers), "216.3.128.12".parse().ok());
        assert_eq!(client_ip(&[]), None);
        assert_eq!(
            client_ip(&[("x-forwarded-for".to_owned(), "garbage".to_owned())]),
            None
        );
    }
}
