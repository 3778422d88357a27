//! The greeting route.

use http::{Method, StatusCode};
use serde::Serialize;

use crate::errors::{self, Error};
use crate::logger::Logger;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const NAME_MAX_CHARS: usize = 256;
const NAME_RULE: &str = "name is required and must be less than 256 characters";

/// Success body for `GET /`.
#[derive(Serialize)]
struct Greeting {
    message: String,
}

/// The routing table this module serves.
pub fn routes(logger: Logger) -> Router {
    Router::new().on(Method::GET, "/", move |req| get_hello(logger.clone(), req))
}

/// `GET /?name=...` — greets the caller by name.
pub async fn get_hello(logger: Logger, req: Request) -> Result<Response, Error> {
    // Platform warm-up probes carry no client address; answer before any
    // validation so they stay cheap and quiet.
    if req.ip().is_none() {
        return Ok(Response::status(StatusCode::OK));
    }

    let name = match validate(&req) {
        Ok(name) => name,
        Err(violations) => return Ok(errors::invalid_args(Some(&render(&violations)))),
    };

    logger.debug(
        &format!("Parsed name: {name} from query params"),
        None,
        Some(&req),
    );

    let greeting = Greeting { message: format!("Hello {name}!") };
    Ok(Response::json(serde_json::to_vec(&greeting)?))
}

// ── Input validation ──────────────────────────────────────────────────────────

/// One failed expectation on the query input.
#[derive(Debug, PartialEq)]
enum Violation {
    NameMissing,
    NameTooLong,
}

impl Violation {
    /// Either failure renders the same rule string, so clients can match on
    /// "name is required" no matter which expectation broke.
    fn message(&self) -> &'static str {
        match self {
            Self::NameMissing | Self::NameTooLong => NAME_RULE,
        }
    }
}

/// Checks the query against the route's expectations, collecting every
/// violation instead of stopping at the first.
fn validate(req: &Request) -> Result<&str, Vec<Violation>> {
    let mut violations = Vec::new();
    match req.query_param("name") {
        None | Some("") => violations.push(Violation::NameMissing),
        Some(name) if name.chars().count() > NAME_MAX_CHARS => {
            violations.push(Violation::NameTooLong);
        }
        Some(name) => return Ok(name),
    }
    Err(violations)
}

/// Deterministic single-string rendering of a violation list.
fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::message)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::logger::{CaptureSink, Level};

    fn request(query: &[(&str, &str)], ip: Option<&str>) -> Request {
        Request::new(
            Method::GET,
            "/".to_owned(),
            "/".to_owned(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            Vec::new(),
            Bytes::new(),
            ip.map(|ip| ip.parse().unwrap()),
        )
    }

    fn capture() -> (Logger, CaptureSink) {
        let sink = CaptureSink::new();
        (Logger::new(sink.clone()), sink)
    }

    fn body_json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[tokio::test]
    async fn missing_name_is_rejected() {
        let (logger, _sink) = capture();
        let req = request(&[], Some("216.3.128.12"));

        let res = get_hello(logger, req).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        let body = body_json(&res);
        assert_eq!(body["statusCode"], 400);
        assert!(body["message"].as_str().unwrap().contains("name is required"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let (logger, _sink) = capture();
        let req = request(&[("name", "")], Some("216.3.128.12"));

        let res = get_hello(logger, req).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn overlong_name_is_rejected() {
        let (logger, _sink) = capture();
        let long = "T".repeat(257);
        let req = request(&[("name", &long)], Some("216.3.128.12"));

        let res = get_hello(logger, req).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(body_json(&res)["message"]
            .as_str()
            .unwrap()
            .contains("name is required"));
    }

    #[tokio::test]
    async fn boundary_length_name_is_accepted() {
        let (logger, _sink) = capture();
        let exact = "N".repeat(256);
        let req = request(&[("name", &exact)], Some("216.3.128.12"));

        let res = get_hello(logger, req).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_name_is_greeted() {
        let (logger, sink) = capture();
        let req = request(&[("name", "John")], Some("216.3.128.12"));
        let request_id = req.id().to_owned();

        let res = get_hello(logger, req).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(body_json(&res), json!({"message": "Hello John!"}));

        // The parsed name is traced at debug level, correlated to the request.
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::Debug);
        assert_eq!(entries[0].message, "Parsed name: John from query params");
        assert_eq!(entries[0].request_id, request_id);
    }

    #[tokio::test]
    async fn warmup_request_short_circuits() {
        let (logger, sink) = capture();
        let req = request(&[], None);

        let res = get_hello(logger, req).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
        // No validation, no logging.
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn validate_collects_violations() {
        let req = request(&[], Some("216.3.128.12"));
        assert_eq!(validate(&req), Err(vec![Violation::NameMissing]));

        let long = "x".repeat(300);
        let req = request(&[("name", &long)], Some("216.3.128.12"));
        assert_eq!(validate(&req), Err(vec![Violation::NameTooLong]));
    }

    #[test]
    fn render_joins_messages() {
        let rendered = render(&[Violation::NameMissing]);
        assert!(rendered.contains("name is required"));
    }
}
