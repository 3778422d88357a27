//! Pipeline assembly: one request in, one response out.

use bytes::Bytes;
use http_body_util::Full;

use crate::errors;
use crate::logger::Logger;
use crate::middleware::HttpLog;
use crate::response::{ResponseSink, ResponseSlot};
use crate::router::Router;

/// The wired application: a routing table with the cross-cutting pieces
/// composed around it in a fixed order.
///
/// The ordering is contractual: the ingress log strictly precedes routing,
/// the completion log fires on finalization no matter which path built the
/// response, and an uncaught failure is logged in detail before the client
/// sees a generic 500.
pub struct App {
    router: Router,
    http_log: HttpLog,
}

impl App {
    pub fn new(router: Router, logger: Logger) -> Self {
        Self { router, http_log: HttpLog::new(logger) }
    }

    /// Runs one request through the full pipeline and returns the wire-level
    /// response for the transport.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let req = match self.http_log.ingress(req).await {
            Ok(req) => req,
            Err(e) => {
                // The context never came to exist, so there is nothing to
                // correlate and no completion log to arm.
                self.http_log.failure(&e, "");
                return errors::internal_error().into_http();
            }
        };

        let request_id = req.id().to_owned();
        let mut sink = self.http_log.instrument(&req, ResponseSlot::new());

        let outcome = match self.router.lookup(req.method(), req.path()) {
            Some((handler, params)) => handler.call(req.with_params(params)).await,
            None => Ok(errors::invalid_route()),
        };

        let response = outcome.unwrap_or_else(|e| {
            self.http_log.failure(&e, &request_id);
            errors::internal_error()
        });

        sink.send(response);
        sink.into_inner()
            .take()
            .unwrap_or_else(errors::internal_error)
            .into_http()
    }
}
