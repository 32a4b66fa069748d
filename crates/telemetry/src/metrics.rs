use std::time::Duration;

use opentelemetry_otlp::{MetricExporter, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
};
use tonic::transport::Channel;
use tracing::info;

use crate::error::TelemetryError;

/// Builds the metric pipeline: an OTLP exporter on the shared channel read
/// by a periodic reader at `push_interval`.
///
/// The reader runs on its own background thread, independent of request
/// handling, and stops when the provider shuts down. Same startup-failure
/// contract as the trace pipeline.
pub fn init_metrics(
    channel: Channel,
    resource: Resource,
    push_interval: Duration,
) -> Result<SdkMeterProvider, TelemetryError> {
    info!("Initializing meter provider with push interval {push_interval:?}");
    let exporter = MetricExporter::builder()
        .with_tonic()
        .with_channel(channel)
        .build()
        .map_err(|e| TelemetryError::Exporter(format!("metric exporter: {e}")))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(push_interval)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build();

    info!("Meter provider initialized");
    Ok(provider)
}

/// Pushes accumulated metrics one final time, then releases the reader and
/// exporter. The shutdown proceeds even when the final push fails; the
/// first failure is reported.
pub fn shutdown_metrics(provider: &SdkMeterProvider) -> Result<(), TelemetryError> {
    let flushed = provider.force_flush();
    let shut_down = provider.shutdown();

    flushed.map_err(|e| TelemetryError::Shutdown(format!("meter provider flush: {e}")))?;
    shut_down.map_err(|e| TelemetryError::Shutdown(format!("meter provider: {e}")))
}
