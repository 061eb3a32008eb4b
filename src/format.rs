use crate::record::LogRecord;
use crate::severity::Severity;
use chrono::SecondsFormat;
use serde_json::{Map, Value};

/// Output key for the record message.
pub const MESSAGE_KEY: &str = "message";

/// Output key for the record severity.
pub const SEVERITY_KEY: &str = "severity";

/// Output key for the record timestamp.
pub const TIME_KEY: &str = "time";

/// Special field the Cloud Logging agent reads for the call site.
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";

/// Special field the Cloud Logging agent reads for trace correlation.
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";

/// Options for rewriting records into the agent's field layout.
///
/// Records below `min_severity` are dropped before formatting. When
/// `add_source` is unset, the call site is omitted from the output even if
/// the record carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub min_severity: Severity,
    pub add_source: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            min_severity: Severity::Debug,
            add_source: true,
        }
    }
}

/// The `severity` value as the agent expects it.
///
/// [`Severity::Critical`] serializes as the literal string `CRITICAL`;
/// the standard levels use their standard names.
pub fn severity_value(severity: Severity) -> Value {
    match severity {
        Severity::Critical => Value::String("CRITICAL".to_string()),
        other => Value::String(other.as_str().to_string()),
    }
}

/// Rewrite the well-known parts of a record into the agent's layout.
///
/// Pure function of the record and options; never fails. Caller-supplied
/// attributes are not touched here — the JSON handler merges them (and any
/// fixed attributes) afterwards so that group scoping applies, and unknown
/// keys always pass through unmodified.
pub fn remap(record: &LogRecord, opts: &FormatOptions) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        TIME_KEY.to_string(),
        Value::String(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    map.insert(SEVERITY_KEY.to_string(), severity_value(record.severity));
    map.insert(
        MESSAGE_KEY.to_string(),
        Value::String(record.message.clone()),
    );
    if opts.add_source {
        if let Some(source) = &record.source {
            // SourceLocation only holds strings and numbers; serialization
            // cannot fail.
            if let Ok(value) = serde_json::to_value(source) {
                map.insert(SOURCE_LOCATION_KEY.to_string(), value);
            }
        }
    }
    map
}
