//! Incoming request context.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

use bytes::Bytes;
use http::Method;
use uuid::Uuid;

/// An incoming HTTP request plus the identity the pipeline gave it.
///
/// Built once at ingress and threaded by value through the router and
/// handler — no side channels. The id and capture instant are assigned at
/// construction and never change; they correlate every log entry the
/// request produces.
pub struct Request {
    method: Method,
    url: String,
    path: String,
    query: HashMap<String, String>,
    params: HashMap<String, String>,
    headers: Vec<(String, String)>,
    body: Bytes,
    ip: Option<IpAddr>,
    id: String,
    received_at: Instant,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        url: String,
        path: String,
        query: HashMap<String, String>,
        headers: Vec<(String, String)>,
        body: Bytes,
        ip: Option<IpAddr>,
    ) -> Self {
        Self {
            method,
            url,
            path,
            query,
            params: HashMap::new(),
            headers,
            body,
            ip,
            id: Uuid::new_v4().simple().to_string(),
            received_at: Instant::now(),
        }
    }

    /// Route params are matched after ingress; the router injects them
    /// before the handler runs.
    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request target as received: path plus query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Returns a decoded query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
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

    /// Client address, when one could be derived. `None` means the request
    /// did not come from a real client (platform warm-up or probe).
    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// Unique per-request identifier, fixed at ingress.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Instant the request entered the pipeline, fixed at ingress.
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}
