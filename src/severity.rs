use serde::Serialize;
use tracing::Level;

/// Severity scale understood by the Cloud Logging agent.
///
/// The ordering is total: `Debug < Info < Warn < Error < Critical`.
/// `Critical` sits above the standard maximum and marks fatal conditions
/// that must outrank ordinary errors on the agent's scale. It cannot be
/// produced from a `tracing` level; only the explicit logger front-end
/// emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    /// Name of the severity as the agent expects it in the `severity` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Map a `tracing` level onto the agent scale.
    ///
    /// `TRACE` clamps to [`Severity::Debug`]; nothing maps to
    /// [`Severity::Critical`].
    pub fn from_tracing(level: &Level) -> Self {
        if *level == Level::ERROR {
            Severity::Error
        } else if *level == Level::WARN {
            Severity::Warn
        } else if *level == Level::INFO {
            Severity::Info
        } else {
            Severity::Debug
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
