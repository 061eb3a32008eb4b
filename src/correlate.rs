use crate::context::LogContext;
use crate::format::TRACE_KEY;
use crate::handler::{Handler, HandlerError};
use crate::record::LogRecord;
use crate::severity::Severity;
use serde_json::Value;
use std::sync::Arc;

/// Decorator that attaches the active trace identifier to every record
/// before delegating to an inner handler.
///
/// The trace is looked up from the [`LogContext`] the record is handled
/// with. Without a trace association the record passes through untouched;
/// with one, a clone of the record gains a
/// `logging.googleapis.com/trace` attribute so the agent can correlate
/// the line with the request log.
///
/// All other operations forward to the inner handler, so wrapping is
/// transparent to attribute and group scoping.
#[derive(Clone)]
pub struct CorrelatingHandler {
    inner: Arc<dyn Handler>,
}

impl CorrelatingHandler {
    pub fn new(inner: Arc<dyn Handler>) -> Self {
        Self { inner }
    }
}

impl Handler for CorrelatingHandler {
    fn enabled(&self, ctx: &LogContext, severity: Severity) -> bool {
        self.inner.enabled(ctx, severity)
    }

    fn handle(&self, ctx: &LogContext, record: &LogRecord) -> Result<(), HandlerError> {
        let trace = ctx.trace();
        if trace.is_empty() {
            return self.inner.handle(ctx, record);
        }

        let mut augmented = record.clone();
        augmented
            .fields
            .insert(TRACE_KEY.to_string(), Value::String(trace.to_string()));
        self.inner.handle(ctx, &augmented)
    }

    fn with_attrs(&self, attrs: Vec<(String, Value)>) -> Arc<dyn Handler> {
        Arc::new(CorrelatingHandler {
            inner: self.inner.with_attrs(attrs),
        })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(CorrelatingHandler {
            inner: self.inner.with_group(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatOptions;
    use crate::json::test_support::SharedBuf;
    use crate::json::JsonHandler;
    use serde_json::json;
    use std::sync::Mutex;

    fn correlating() -> (CorrelatingHandler, SharedBuf) {
        let buf = SharedBuf::default();
        let inner = JsonHandler::new(Box::new(buf.clone()), FormatOptions::default());
        (CorrelatingHandler::new(Arc::new(inner)), buf)
    }

    #[test]
    fn no_trace_association_yields_no_trace_key() {
        let (h, buf) = correlating();
        h.handle(&LogContext::root(), &LogRecord::new(Severity::Info, "m"))
            .unwrap();

        assert!(buf.lines()[0].get(TRACE_KEY).is_none());
    }

    #[test]
    fn trace_association_is_attached_verbatim() {
        let (h, buf) = correlating();
        let ctx = LogContext::root().with_trace("projects/myproj/traces/abc123".to_string());
        h.handle(&ctx, &LogRecord::new(Severity::Info, "m"))
            .unwrap();

        assert_eq!(buf.lines()[0][TRACE_KEY], "projects/myproj/traces/abc123");
    }

    #[test]
    fn augmentation_leaves_the_callers_record_untouched() {
        let (h, buf) = correlating();
        let ctx = LogContext::root().with_trace("projects/p/traces/t".to_string());
        let record = LogRecord::new(Severity::Info, "m").with_field("user", json!("bob"));

        h.handle(&ctx, &record).unwrap();
        h.handle(&LogContext::root(), &record).unwrap();

        assert!(!record.fields.contains_key(TRACE_KEY));

        // the two serialized lines differ only by the trace key
        let lines = buf.lines();
        let mut with_trace = lines[0].as_object().unwrap().clone();
        let without_trace = lines[1].as_object().unwrap().clone();
        assert!(with_trace.remove(TRACE_KEY).is_some());
        assert_eq!(with_trace, without_trace);
    }

    #[test]
    fn derivation_keeps_both_fixed_attrs_and_trace() {
        let (h, buf) = correlating();
        let derived = h.with_attrs(vec![("component".to_string(), json!("api"))]);
        let ctx = LogContext::root().with_trace("projects/p/traces/t".to_string());

        derived
            .handle(&ctx, &LogRecord::new(Severity::Info, "m"))
            .unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["component"], "api");
        assert_eq!(line[TRACE_KEY], "projects/p/traces/t");
    }

    #[test]
    fn inner_errors_propagate_verbatim() {
        struct FailingHandler;

        impl Handler for FailingHandler {
            fn enabled(&self, _ctx: &LogContext, _severity: Severity) -> bool {
                true
            }

            fn handle(&self, _ctx: &LogContext, _record: &LogRecord) -> Result<(), HandlerError> {
                Err(HandlerError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "sink gone",
                )))
            }

            fn with_attrs(&self, _attrs: Vec<(String, Value)>) -> Arc<dyn Handler> {
                Arc::new(FailingHandler)
            }

            fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
                Arc::new(FailingHandler)
            }
        }

        let h = CorrelatingHandler::new(Arc::new(FailingHandler));
        let err = h
            .handle(&LogContext::root(), &LogRecord::new(Severity::Info, "m"))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Io(_)));
    }

    #[test]
    fn enabled_delegates_to_inner() {
        struct ThresholdHandler(Mutex<Vec<Severity>>);

        impl Handler for ThresholdHandler {
            fn enabled(&self, _ctx: &LogContext, severity: Severity) -> bool {
                self.0.lock().unwrap().push(severity);
                severity >= Severity::Error
            }

            fn handle(&self, _ctx: &LogContext, _record: &LogRecord) -> Result<(), HandlerError> {
                Ok(())
            }

            fn with_attrs(&self, _attrs: Vec<(String, Value)>) -> Arc<dyn Handler> {
                unimplemented!()
            }

            fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
                unimplemented!()
            }
        }

        let inner = Arc::new(ThresholdHandler(Mutex::new(Vec::new())));
        let h = CorrelatingHandler::new(inner.clone());
        let ctx = LogContext::root();
        assert!(!h.enabled(&ctx, Severity::Info));
        assert!(h.enabled(&ctx, Severity::Critical));
        assert_eq!(
            *inner.0.lock().unwrap(),
            vec![Severity::Info, Severity::Critical]
        );
    }
}
