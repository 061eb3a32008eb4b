use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Call site of a log statement, serialized under
/// `logging.googleapis.com/sourceLocation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

/// A single structured log record.
///
/// Records are immutable from the handler chain's point of view: handlers
/// receive a shared reference and must clone before augmenting, so the
/// caller's record is never affected by downstream decoration.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub source: Option<SourceLocation>,
    /// Arbitrary caller-supplied attributes, in key order.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Create a record stamped with the current time and no attributes.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            source: None,
            fields: BTreeMap::new(),
        }
    }

    /// Attach one attribute, consuming and returning the record.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Attach the call site, consuming and returning the record.
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }
}
