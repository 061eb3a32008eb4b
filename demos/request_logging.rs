//! Feeds a synthetic request through the trace-context middleware and logs
//! from the "handler", printing agent-ready JSON lines on stderr.
//!
//! Run with:
//! `GOOGLE_CLOUD_PROJECT=myproj cargo run --example request_logging`

use cloud_trace_log::init::init;
use cloud_trace_log::middleware::{
    log_context, CloudTraceLayer, TraceContextConfig, CLOUD_TRACE_CONTEXT_HEADER,
};
use http::Request;
use std::convert::Infallible;
use tower::{service_fn, Layer, ServiceExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let logger = init();

    let layer = CloudTraceLayer::new(TraceContextConfig::from_env(), logger.clone());
    let service = layer.layer(service_fn(|req: Request<()>| async move {
        let ctx = log_context(&req);
        let log = ctx.logger();
        log.info(&ctx, "handling request");
        log.critical(&ctx, "something fatal happened");
        Ok::<_, Infallible>("done")
    }));

    let request = Request::builder()
        .uri("/work")
        .header(CLOUD_TRACE_CONTEXT_HEADER, "abc123def456/789;o=1")
        .body(())
        .expect("build request");

    service.oneshot(request).await.expect("call service");

    // events from the tracing bridge land in the same JSON layout
    tracing::warn!(queue_depth = 17, "draining before shutdown");
}
