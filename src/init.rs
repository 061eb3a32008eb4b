use crate::correlate::CorrelatingHandler;
use crate::format::FormatOptions;
use crate::handler::Handler;
use crate::json::JsonHandler;
use crate::layer::CloudLogLayer;
use crate::logger::Logger;
use crate::severity::Severity;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Configuration for [`init_with_config`].
///
/// **Fields**
/// - `min_severity`: records below this are dropped before formatting.
/// - `add_source`: capture and emit the call site under
///   `logging.googleapis.com/sourceLocation`.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub min_severity: Severity,
    pub add_source: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::Debug,
            add_source: true,
        }
    }
}

/// Set up Cloud Logging output with the given configuration.
///
/// **Effects**
///
/// Builds the stderr JSON handler wrapped in a [`CorrelatingHandler`],
/// installs the resulting logger as the process default, and installs a
/// global `tracing` subscriber (filtered by `RUST_LOG`, default `info`)
/// whose events flow through the same handler chain.
///
/// **Returns**
/// - The logger, for callers that want to pass it into
///   [`CloudTraceLayer`](crate::middleware::CloudTraceLayer) explicitly.
pub fn init_with_config(config: LogConfig) -> Logger {
    let opts = FormatOptions {
        min_severity: config.min_severity,
        add_source: config.add_source,
    };
    let handler: Arc<dyn Handler> =
        Arc::new(CorrelatingHandler::new(Arc::new(JsonHandler::stderr(opts))));
    let logger = Logger::new(handler.clone());
    Logger::set_default(logger.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(CloudLogLayer::new(handler));
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    logger
}

/// Set up Cloud Logging output with defaults.
///
/// Equivalent to calling [`init_with_config`] with [`LogConfig::default`].
/// This is the recommended entrypoint for typical services.
pub fn init() -> Logger {
    init_with_config(LogConfig::default())
}
