//! Structured logging with request correlation.
//!
//! [`Logger`] is the validating front door: it stamps entries with the
//! request id and hands them to a [`Sink`]. Sinks decide what to keep —
//! level filtering lives there, never in callers. The production sink
//! forwards to `tracing`; [`CaptureSink`] retains entries in memory for
//! inspection.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use crate::request::Request;

// ── Level ─────────────────────────────────────────────────────────────────────

/// Log severity, most severe first. The derived ordering makes threshold
/// checks a plain comparison: `entry.level <= threshold` means "emit".
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
    Silly,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Silly => "silly",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the lowercase level name. Anything else is rejected.
impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "verbose" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            "silly" => Ok(Self::Silly),
            _ => Err(()),
        }
    }
}

// ── LogEntry and Sink ─────────────────────────────────────────────────────────

/// One structured log entry, ready for a sink.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub level: Level,
    /// Id of the request this entry belongs to; empty when the entry was
    /// produced outside any request.
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Where finished entries go: console, collector, test buffer.
///
/// Fire-and-forget — implementations must not block the request path, and
/// their failures stay their own.
pub trait Sink: Send + Sync {
    fn log(&self, entry: LogEntry);
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// Validating logging front-end, shared by every component.
///
/// Cheap to clone; clones share the same sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
}

impl Logger {
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self { sink: Arc::new(sink) }
    }

    /// Submits one entry. `request_id` is taken from `req` when given,
    /// empty otherwise.
    ///
    /// # Panics
    ///
    /// Panics on an empty `message` or on `data` that is not a structured
    /// value (object or array). Either is a bug in the caller.
    pub fn log(&self, level: Level, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.submit(level, message, data, req.map(|r| r.id()).unwrap_or_default());
    }

    pub fn error(&self, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.log(Level::Error, message, data, req);
    }

    pub fn warn(&self, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.log(Level::Warn, message, data, req);
    }

    pub fn info(&self, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.log(Level::Info, message, data, req);
    }

    pub fn verbose(&self, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.log(Level::Verbose, message, data, req);
    }

    pub fn debug(&self, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.log(Level::Debug, message, data, req);
    }

    pub fn silly(&self, message: &str, data: Option<Value>, req: Option<&Request>) {
        self.log(Level::Silly, message, data, req);
    }

    /// Same as [`log`](Logger::log), for callers that hold a request id but
    /// no longer hold the request itself.
    pub(crate) fn correlated(
        &self,
        level: Level,
        message: &str,
        data: Option<Value>,
        request_id: &str,
    ) {
        self.submit(level, message, data, request_id);
    }

    fn submit(&self, level: Level, message: &str, data: Option<Value>, request_id: &str) {
        assert!(!message.is_empty(), "log message must not be empty");
        if let Some(data) = &data {
            assert!(
                data.is_object() || data.is_array(),
                "log data must be a structured value"
            );
        }
        self.sink.log(LogEntry {
            level,
            request_id: request_id.to_owned(),
            message: message.to_owned(),
            data,
        });
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Production sink: forwards entries as `tracing` events.
///
/// Entries more verbose than the threshold are dropped here, not by
/// callers. The six-level taxonomy is wider than tracing's, so the original
/// level rides along as a field (`verbose` maps to DEBUG, `silly` to TRACE).
pub struct TracingSink {
    threshold: Level,
}

impl TracingSink {
    pub fn new(threshold: Level) -> Self {
        Self { threshold }
    }

    fn permits(&self, level: Level) -> bool {
        level <= self.threshold
    }
}

impl Sink for TracingSink {
    fn log(&self, entry: LogEntry) {
        if !self.permits(entry.level) {
            return;
        }
        let data = entry.data.map(|d| d.to_string()).unwrap_or_default();
        let (request_id, message) = (entry.request_id, entry.message);
        match entry.level {
            Level::Error => {
                tracing::error!(request_id = %request_id, level = "error", data = %data, "{message}");
            }
            Level::Warn => {
                tracing::warn!(request_id = %request_id, level = "warn", data = %data, "{message}");
            }
            Level::Info => {
                tracing::info!(request_id = %request_id, level = "info", data = %data, "{message}");
            }
            Level::Verbose => {
                tracing::debug!(request_id = %request_id, level = "verbose", data = %data, "{message}");
            }
            Level::Debug => {
                tracing::debug!(request_id = %request_id, level = "debug", data = %data, "{message}");
            }
            Level::Silly => {
                tracing::trace!(request_id = %request_id, level = "silly", data = %data, "{message}");
            }
        }
    }
}

/// In-memory sink that retains every entry, for tests and embedding.
/// Clones share one buffer.
#[derive(Clone, Default)]
pub struct CaptureSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far, in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl Sink for CaptureSink {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}
