use crate::logger::Logger;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Association kept by one context node.
///
/// Private on purpose: the variants act as the collision-proof keys of the
/// context. No code outside this module can construct or forge an entry,
/// so nothing sharing a context chain can overwrite or shadow the logger
/// and trace associations by accident.
enum Entry {
    Root,
    Logger(Logger),
    Trace(String),
}

/// Immutable, append-only logging context.
///
/// A context is a persistent chain: attaching a value allocates a new node
/// pointing at its parent, and no node is ever mutated after creation.
/// Lookups walk up the chain and return the nearest association, so a
/// child inherits everything from its parent unless overridden. Concurrent
/// requests each hold an independent leaf and never contend.
pub struct LogContext {
    parent: Option<Arc<LogContext>>,
    entry: Entry,
}

static ROOT: Lazy<Arc<LogContext>> = Lazy::new(|| {
    Arc::new(LogContext {
        parent: None,
        entry: Entry::Root,
    })
});

impl LogContext {
    /// The shared empty context: no logger, no trace.
    pub fn root() -> Arc<LogContext> {
        ROOT.clone()
    }

    /// Derive a context with the given logger associated.
    ///
    /// The receiver is not modified; existing references to it keep seeing
    /// the old associations.
    pub fn with_logger(self: Arc<Self>, logger: Logger) -> Arc<LogContext> {
        Arc::new(LogContext {
            parent: Some(self),
            entry: Entry::Logger(logger),
        })
    }

    /// Derive a context with the given trace identifier associated.
    ///
    /// Crate-private: only the trace-context middleware attaches traces,
    /// which keeps the `projects/<id>/traces/<trace>` format the single
    /// source of trace values.
    pub(crate) fn with_trace(self: Arc<Self>, trace: String) -> Arc<LogContext> {
        Arc::new(LogContext {
            parent: Some(self),
            entry: Entry::Trace(trace),
        })
    }

    /// The logger associated with this context, or the process-wide
    /// default logger if none was attached. Never fails.
    pub fn logger(&self) -> Logger {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Entry::Logger(logger) = &ctx.entry {
                return logger.clone();
            }
            current = ctx.parent.as_deref();
        }
        Logger::default_logger()
    }

    /// The trace identifier associated with this context, or the empty
    /// string if none was attached. Never fails.
    pub fn trace(&self) -> &str {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Entry::Trace(trace) = &ctx.entry {
                return trace;
            }
            current = ctx.parent.as_deref();
        }
        ""
    }
}
