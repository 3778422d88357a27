//! Middleware layer.
//!
//! Middleware is where cross-cutting concerns live: anything that must run
//! for every request regardless of which handler serves it. Composition is
//! explicit — a middleware wraps the pieces it needs to observe (the request
//! context at ingress, the [`ResponseSink`](crate::ResponseSink) at egress)
//! rather than patching methods on shared objects.
//!
//! The one middleware shipped today is [`http_log`]: a correlated
//! request/response log pair around every request, plus the error logger
//! that runs before the catch-all 500.

pub mod http_log;

pub use http_log::{HttpLog, LoggedSink};
