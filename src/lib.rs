//! # aloha
//!
//! A small greeting API for deployments behind a reverse proxy or
//! serverless front door. One route, and a middleware pipeline that treats
//! observability as part of the contract rather than an afterthought.
//!
//! ## The pipeline
//!
//! Every request flows through the same fixed composition:
//!
//! ```text
//! ingress ── HTTP Request log ──▶ route handler ──▶ finalize ── HTTP Response log
//!                  │                    │
//!                  │                not found ──▶ 404 responder
//!                  │                    │
//!                  └──── uncaught Err ──▶ error log ──▶ 500 responder
//! ```
//!
//! The guarantees the composition gives you:
//!
//! - A unique request id and capture instant are assigned at ingress and
//!   never change; every log entry for the request carries the id.
//! - The `HTTP Request` entry is emitted before any routing; the
//!   `HTTP Response` entry is emitted exactly once, when the response is
//!   finalized, whichever path produced it.
//! - Error responses all share one JSON shape
//!   (`{"statusCode": ..., "message": ...}`), and a 500 never leaks failure
//!   detail — that goes to the log, at `error` level, before the response
//!   is built.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use aloha::{App, Config, Logger, Server, TracingSink, hello};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env();
//!     let logger = Logger::new(TracingSink::new(config.log_level));
//!     let app = App::new(hello::routes(logger.clone()), logger);
//!
//!     Server::bind(&config.addr).serve(app).await.unwrap();
//! }
//! ```
//!
//! Try it:
//!
//! ```text
//! curl 'http://localhost:3000/?name=John' -H 'x-forwarded-for: 203.0.113.7'
//! {"message":"Hello John!"}
//! ```

mod app;
mod config;
mod errors;
mod handler;
mod logger;
mod request;
mod response;
mod router;
mod server;

pub mod hello;
pub mod middleware;

pub use app::App;
pub use config::Config;
pub use errors::{error_response, internal_error, invalid_args, invalid_route, Error};
pub use handler::Handler;
pub use logger::{CaptureSink, Level, LogEntry, Logger, Sink, TracingSink};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder, ResponseSink, ResponseSlot};
pub use router::Router;
pub use server::Server;
