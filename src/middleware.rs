use std::sync::Arc;
use std::task::{Context, Poll};

use http::Request;
use tower::{Layer, Service};

use crate::context::LogContext;
use crate::env::{env_or, GOOGLE_CLOUD_PROJECT_ENV};
use crate::logger::Logger;

/// Header Cloud Run and the Google load balancers set on every request:
/// `X-Cloud-Trace-Context: <trace-id>/<span-id>[;o=1]`.
pub const CLOUD_TRACE_CONTEXT_HEADER: &str = "x-cloud-trace-context";

/// Configuration for the trace-context middleware.
///
/// The project id is injected explicitly rather than read from a global at
/// call time, so services can construct the middleware in tests without
/// touching the process environment.
#[derive(Debug, Clone)]
pub struct TraceContextConfig {
    /// Google Cloud project id, the `<id>` in `projects/<id>/traces/...`.
    /// An empty value is legal; no validation is performed.
    pub project_id: String,
}

impl TraceContextConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    /// Read the project id from `GOOGLE_CLOUD_PROJECT`. Meant to be called
    /// once at startup.
    pub fn from_env() -> Self {
        Self::new(env_or(GOOGLE_CLOUD_PROJECT_ENV, ""))
    }

    /// Build the trace identifier for a raw header value.
    ///
    /// Only the segment before the first `/` is used. A header with no
    /// `/`, or with an empty leading segment, yields `None` and is treated
    /// exactly like an absent header: never an error, never logged.
    fn trace_for_header(&self, header: &str) -> Option<String> {
        let (trace_id, _rest) = header.split_once('/')?;
        if trace_id.is_empty() {
            return None;
        }
        Some(format!(
            "projects/{}/traces/{}",
            self.project_id, trace_id
        ))
    }
}

/// Tower layer that bridges the inbound trace header into the logging
/// context for the remainder of request handling.
///
/// On each request with a usable `X-Cloud-Trace-Context` header, a context
/// carrying the default logger and the derived trace identifier is stored
/// in the request extensions; [`log_context`] retrieves it downstream.
/// Requests without a usable header are forwarded untouched.
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(CloudTraceLayer::new(TraceContextConfig::from_env(), logger));
/// ```
#[derive(Clone)]
pub struct CloudTraceLayer {
    config: TraceContextConfig,
    logger: Logger,
}

impl CloudTraceLayer {
    /// Layer attaching the given logger to every traced request context.
    pub fn new(config: TraceContextConfig, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Layer using `GOOGLE_CLOUD_PROJECT` and the process default logger.
    pub fn from_env() -> Self {
        Self::new(TraceContextConfig::from_env(), Logger::default_logger())
    }
}

impl<S> Layer<S> for CloudTraceLayer {
    type Service = CloudTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CloudTraceService {
            inner,
            config: self.config.clone(),
            logger: self.logger.clone(),
        }
    }
}

/// Service produced by [`CloudTraceLayer`].
#[derive(Clone)]
pub struct CloudTraceService<S> {
    inner: S,
    config: TraceContextConfig,
    logger: Logger,
}

impl<S, B> Service<Request<B>> for CloudTraceService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let trace = req
            .headers()
            .get(CLOUD_TRACE_CONTEXT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| self.config.trace_for_header(header));

        if let Some(trace) = trace {
            let ctx = LogContext::root()
                .with_logger(self.logger.clone())
                .with_trace(trace);
            req.extensions_mut().insert(ctx);
        }

        self.inner.call(req)
    }
}

/// The logging context the middleware attached to this request, or the
/// root context if the request carried no usable trace header.
pub fn log_context<B>(req: &Request<B>) -> Arc<LogContext> {
    req.extensions()
        .get::<Arc<LogContext>>()
        .cloned()
        .unwrap_or_else(LogContext::root)
}
