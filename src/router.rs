//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. You
//! register a path, you get a handler back. That is all — cross-cutting
//! behavior belongs to the pipeline, not the routing table.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The application routing table. Build it once at startup.
///
/// Each [`Router::on`] call returns `self`, so registrations chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax and surface through
    /// `req.param("name")`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting path pattern — registration
    /// happens at startup, and a broken routing table should never serve.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
