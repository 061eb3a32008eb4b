use crate::context::LogContext;
use crate::record::LogRecord;
use crate::severity::Severity;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a [`Handler`] while emitting a record.
///
/// Decorators propagate these verbatim; nothing in this crate retries or
/// wraps them. The only producers are the terminal JSON handler's sink
/// write and serialization steps.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("log sink write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("log record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for [`LogRecord`]s produced by the logger front-end or the
/// `tracing` bridge layer.
///
/// Implementations form a chain: decorators such as
/// [`CorrelatingHandler`](crate::correlate::CorrelatingHandler) wrap an
/// inner handler and delegate every operation, intercepting only what they
/// augment. Derivation (`with_attrs`, `with_group`) returns a new handler
/// and never mutates the receiver, so derived and parent handlers can be
/// used concurrently.
pub trait Handler: Send + Sync {
    /// Whether a record at `severity` would be emitted at all.
    ///
    /// Called before record construction so callers can skip the work of
    /// building a record that would be dropped.
    fn enabled(&self, ctx: &LogContext, severity: Severity) -> bool;

    /// Emit one record.
    ///
    /// The record is borrowed: a handler that needs to augment it must
    /// clone it first and leave the caller's copy untouched.
    fn handle(&self, ctx: &LogContext, record: &LogRecord) -> Result<(), HandlerError>;

    /// Derive a handler that attaches the given fixed attributes to every
    /// record it emits.
    fn with_attrs(&self, attrs: Vec<(String, serde_json::Value)>) -> Arc<dyn Handler>;

    /// Derive a handler that nests subsequent attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}
