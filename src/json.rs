use crate::context::LogContext;
use crate::format::{self, FormatOptions};
use crate::handler::{Handler, HandlerError};
use crate::record::LogRecord;
use crate::severity::Severity;
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Terminal [`Handler`] writing one JSON object per line to a shared sink.
///
/// The well-known record parts go through the field remapper in
/// [`format`]; fixed attributes and the record's own attributes are then
/// merged in, nested under whichever groups were open when they were
/// attached. Derived handlers share the sink with their parent.
#[derive(Clone)]
pub struct JsonHandler {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    opts: FormatOptions,
    /// Fixed attributes with the group path that was open at attach time.
    attrs: Vec<(Vec<String>, String, Value)>,
    /// Currently open group path for record attributes.
    groups: Vec<String>,
}

impl JsonHandler {
    /// Handler writing to the given sink.
    pub fn new(writer: Box<dyn Write + Send>, opts: FormatOptions) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
            opts,
            attrs: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Handler writing to stderr, where the Cloud Run agent picks lines up.
    pub fn stderr(opts: FormatOptions) -> Self {
        Self::new(Box::new(std::io::stderr()), opts)
    }
}

/// Insert `key = value` into `map`, nested under the given group path.
/// Intermediate objects are created as needed; a non-object value already
/// occupying a group name is replaced.
fn insert_nested(map: &mut Map<String, Value>, path: &[String], key: String, value: Value) {
    let mut current = map;
    for group in path {
        let slot = current
            .entry(group.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot.as_object_mut() {
            Some(next) => current = next,
            // unreachable after the replacement above
            None => return,
        }
    }
    current.insert(key, value);
}

impl Handler for JsonHandler {
    fn enabled(&self, _ctx: &LogContext, severity: Severity) -> bool {
        severity >= self.opts.min_severity
    }

    fn handle(&self, _ctx: &LogContext, record: &LogRecord) -> Result<(), HandlerError> {
        if record.severity < self.opts.min_severity {
            return Ok(());
        }

        let mut map = format::remap(record, &self.opts);
        for (path, key, value) in &self.attrs {
            insert_nested(&mut map, path, key.clone(), value.clone());
        }
        for (key, value) in &record.fields {
            insert_nested(&mut map, &self.groups, key.clone(), value.clone());
        }

        let mut line = serde_json::to_vec(&Value::Object(map))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(&line)?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<(String, Value)>) -> Arc<dyn Handler> {
        let mut derived = self.clone();
        for (key, value) in attrs {
            derived.attrs.push((self.groups.clone(), key, value));
        }
        Arc::new(derived)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut derived = self.clone();
        derived.groups.push(name.to_string());
        Arc::new(derived)
    }
}
