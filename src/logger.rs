use crate::context::LogContext;
use crate::correlate::CorrelatingHandler;
use crate::format::FormatOptions;
use crate::handler::Handler;
use crate::json::JsonHandler;
use crate::record::{LogRecord, SourceLocation};
use crate::severity::Severity;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::panic::Location;
use std::sync::{Arc, RwLock};

/// Front-end over a [`Handler`] chain.
///
/// Cheap to clone; clones share the handler. Each leveled method checks
/// `enabled` first so disabled records are never built, captures the call
/// site for `sourceLocation`, and hands the record to the chain. Sink
/// errors are discarded here: the logging front-end has nowhere to report
/// them.
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
}

static DEFAULT_LOGGER: Lazy<RwLock<Logger>> = Lazy::new(|| {
    let handler = CorrelatingHandler::new(Arc::new(JsonHandler::stderr(FormatOptions::default())));
    RwLock::new(Logger::new(Arc::new(handler)))
});

impl Logger {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    /// The process-wide default logger.
    ///
    /// Until [`set_default`](Logger::set_default) is called this is a
    /// correlating JSON handler on stderr with default options.
    pub fn default_logger() -> Logger {
        DEFAULT_LOGGER
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the process-wide default logger.
    pub fn set_default(logger: Logger) {
        *DEFAULT_LOGGER.write().unwrap_or_else(|e| e.into_inner()) = logger;
    }

    /// The handler chain this logger feeds.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Logger whose records carry the given fixed attributes.
    pub fn with_attrs(&self, attrs: Vec<(String, Value)>) -> Logger {
        Logger {
            handler: self.handler.with_attrs(attrs),
        }
    }

    /// Logger whose subsequent attributes nest under `name`.
    pub fn with_group(&self, name: &str) -> Logger {
        Logger {
            handler: self.handler.with_group(name),
        }
    }

    /// Emit a record at the given severity with extra attributes.
    #[track_caller]
    pub fn log(
        &self,
        ctx: &LogContext,
        severity: Severity,
        message: impl Into<String>,
        fields: Vec<(&str, Value)>,
    ) {
        if !self.handler.enabled(ctx, severity) {
            return;
        }

        let caller = Location::caller();
        let mut record = LogRecord::new(severity, message).with_source(SourceLocation {
            file: caller.file().to_string(),
            line: Some(caller.line()),
            function: None,
        });
        for (key, value) in fields {
            record.fields.insert(key.to_string(), value);
        }

        let _ = self.handler.handle(ctx, &record);
    }

    #[track_caller]
    pub fn debug(&self, ctx: &LogContext, message: impl Into<String>) {
        self.log(ctx, Severity::Debug, message, Vec::new());
    }

    #[track_caller]
    pub fn info(&self, ctx: &LogContext, message: impl Into<String>) {
        self.log(ctx, Severity::Info, message, Vec::new());
    }

    #[track_caller]
    pub fn warn(&self, ctx: &LogContext, message: impl Into<String>) {
        self.log(ctx, Severity::Warn, message, Vec::new());
    }

    #[track_caller]
    pub fn error(&self, ctx: &LogContext, message: impl Into<String>) {
        self.log(ctx, Severity::Error, message, Vec::new());
    }

    /// Emit at the [`Severity::Critical`] extension level, which the agent
    /// renders as `CRITICAL`.
    #[track_caller]
    pub fn critical(&self, ctx: &LogContext, message: impl Into<String>) {
        self.log(ctx, Severity::Critical, message, Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::test_support::SharedBuf;
    use serde_json::json;

    fn logger(opts: FormatOptions) -> (Logger, SharedBuf) {
        let buf = SharedBuf::default();
        let json = JsonHandler::new(Box::new(buf.clone()), opts);
        let handler = CorrelatingHandler::new(Arc::new(json));
        (Logger::new(Arc::new(handler)), buf)
    }

    #[test]
    fn leveled_methods_emit_matching_severity() {
        let (log, buf) = logger(FormatOptions::default());
        let ctx = LogContext::root();
        log.debug(&ctx, "d");
        log.info(&ctx, "i");
        log.warn(&ctx, "w");
        log.error(&ctx, "e");
        log.critical(&ctx, "c");

        let severities: Vec<String> = buf
            .lines()
            .iter()
            .map(|l| l["severity"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(severities, vec!["DEBUG", "INFO", "WARN", "ERROR", "CRITICAL"]);
    }

    #[test]
    fn disabled_severities_produce_no_output() {
        let (log, buf) = logger(FormatOptions {
            min_severity: Severity::Error,
            ..FormatOptions::default()
        });
        log.info(&LogContext::root(), "quiet");
        assert!(buf.lines().is_empty());
    }

    #[test]
    fn call_site_is_captured() {
        let (log, buf) = logger(FormatOptions::default());
        log.info(&LogContext::root(), "here");

        let line = &buf.lines()[0];
        let file = line["logging.googleapis.com/sourceLocation"]["file"]
            .as_str()
            .unwrap();
        assert!(file.ends_with("logger.rs"), "unexpected file: {file}");
    }

    #[test]
    fn extra_fields_are_emitted() {
        let (log, buf) = logger(FormatOptions::default());
        log.log(
            &LogContext::root(),
            Severity::Warn,
            "slow query",
            vec![("elapsed_ms", json!(250))],
        );
        assert_eq!(buf.lines()[0]["elapsed_ms"], 250);
    }

    #[test]
    fn context_logger_falls_back_to_default() {
        // the default logger is always defined, even before init
        let log = LogContext::root().logger();
        assert!(log.handler().enabled(&LogContext::root(), Severity::Error));
    }
}
