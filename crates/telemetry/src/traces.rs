use opentelemetry_otlp::{SpanExporter, WithTonicConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tonic::transport::Channel;
use tracing::info;

use crate::{config::SamplingPolicy, error::TelemetryError};

/// Builds the span pipeline: an OTLP exporter bound to the shared channel,
/// wrapped in a batching span processor.
///
/// The batch processor buffers completed spans and flushes them on its own
/// background worker when the buffer fills or the flush interval elapses,
/// keeping network I/O off the request path. The worker stops when the
/// provider shuts down.
///
/// A failure to construct the exporter is a startup error for the caller;
/// telemetry is a required subsystem when enabled.
pub fn init_traces(
    channel: Channel,
    resource: Resource,
    sampling: &SamplingPolicy,
) -> Result<SdkTracerProvider, TelemetryError> {
    info!("Initializing trace provider");
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_channel(channel)
        .build()
        .map_err(|e| TelemetryError::Exporter(format!("span exporter: {e}")))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .with_sampler(sampling.to_sampler())
        .build();

    info!("Trace provider initialized");
    Ok(provider)
}

/// Flushes any buffered spans and releases the exporter. A flush timeout is
/// reported as an error, never a panic.
pub fn shutdown_traces(provider: &SdkTracerProvider) -> Result<(), TelemetryError> {
    provider
        .shutdown()
        .map_err(|e| TelemetryError::Shutdown(format!("tracer provider: {e}")))
}
