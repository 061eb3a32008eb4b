use crate::context::LogContext;
use crate::handler::Handler;
use crate::record::{LogRecord, SourceLocation};
use crate::severity::Severity;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that observes events and feeds them through
/// a [`Handler`] chain as [`LogRecord`]s.
///
/// This is the bridge that makes plain `tracing::info!` calls come out in
/// the agent's JSON layout. Events carry no request context, so they are
/// handled with the root [`LogContext`]; per-request trace correlation
/// goes through the logger stored in the request context instead.
pub struct CloudLogLayer {
    handler: Arc<dyn Handler>,
}

impl CloudLogLayer {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

impl<S> Layer<S> for CloudLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let ctx = LogContext::root();
        let severity = Severity::from_tracing(event.metadata().level());
        if !self.handler.enabled(&ctx, severity) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        let record = LogRecord {
            timestamp: chrono::Utc::now(),
            severity,
            message: message.unwrap_or_default(),
            source: meta.file().map(|file| SourceLocation {
                file: file.to_string(),
                line: meta.line(),
                function: meta.module_path().map(|s| s.to_string()),
            }),
            fields,
        };

        // A sink failure here has no better outlet than the record itself.
        let _ = self.handler.handle(&ctx, &record);
    }
}

struct FieldVisitor<'a> {
    fields: &'a mut BTreeMap<String, serde_json::Value>,
    message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{:?}", value)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerError;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[derive(Default)]
    struct CaptureHandler {
        records: Mutex<Vec<LogRecord>>,
    }

    impl Handler for CaptureHandler {
        fn enabled(&self, _ctx: &LogContext, _severity: Severity) -> bool {
            true
        }

        fn handle(&self, _ctx: &LogContext, record: &LogRecord) -> Result<(), HandlerError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn with_attrs(&self, _attrs: Vec<(String, serde_json::Value)>) -> Arc<dyn Handler> {
            unimplemented!()
        }

        fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
            unimplemented!()
        }
    }

    #[test]
    fn events_become_records_with_fields_and_severity() {
        let capture = Arc::new(CaptureHandler::default());
        let subscriber = Registry::default().with(CloudLogLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(user = "bob", attempt = 3, "login failed");
            tracing::info!("started");
        });

        let records = capture.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(records[0].message, "login failed");
        assert_eq!(records[0].fields["user"], "bob");
        assert_eq!(records[0].fields["attempt"], 3);
        assert_eq!(records[1].severity, Severity::Info);
        assert!(records[1].source.is_some());
    }
}
