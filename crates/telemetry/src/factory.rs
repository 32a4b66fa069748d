use std::{sync::Arc, time::Duration};

use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_sdk::{
    metrics::SdkMeterProvider,
    trace::{SdkTracer, SdkTracerProvider},
};
use tracing::info;

use crate::{
    config::TelemetryConfig,
    connection,
    error::{ShutdownError, TelemetryError},
    metrics, propagation,
    registry::RequestMetrics,
    resource::{build_attributes, build_resource},
    shutdown::ShutdownCoordinator,
    traces,
};

/// An active telemetry system instance for the pulse service.
///
/// Owns the trace and metric providers bound to the shared collector
/// connection, the request instruments created at startup, and the
/// shutdown coordinator that tears everything down exactly once. Create it
/// during startup and shut it down before process exit so buffered data is
/// flushed to the collector.
///
/// The instance is also installed as the process-wide active provider set,
/// but consumers receive its parts explicitly, which keeps isolated
/// instances possible under test.
pub struct TelemetryInstance {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    request_metrics: Arc<RequestMetrics>,
    coordinator: ShutdownCoordinator,
}

impl TelemetryInstance {
    /// A tracer for request instrumentation, bound to this instance's
    /// provider rather than the global registry.
    pub fn tracer(&self) -> SdkTracer {
        self.tracer_provider.tracer("pulse")
    }

    pub fn request_metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.request_metrics)
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.meter_provider
    }

    /// Gracefully shuts down every telemetry subsystem, flushing pending
    /// data within the given deadline.
    ///
    /// Callbacks run in registration order and failures are aggregated
    /// into the returned error; nothing is retried. Calling this more than
    /// once is a no-op. Afterwards instrumentation calls degrade to no-ops
    /// rather than failing requests.
    pub fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError> {
        info!("Shutting down telemetry");
        self.coordinator.shutdown(deadline)
    }
}

/// Creates a telemetry system instance with the given configuration and
/// resource attributes.
///
/// Opens one shared collector connection, builds the service resource,
/// installs the composite propagator, then constructs and globally
/// installs the trace and metric providers, registering a teardown
/// callback for each. Any failure here is a startup failure: the caller
/// decides between aborting and running with telemetry disabled, but the
/// service never runs half-initialized.
pub fn create_telemetry(
    config: &TelemetryConfig,
    attributes: Vec<(String, String)>,
) -> Result<TelemetryInstance, TelemetryError> {
    info!(
        "Initializing telemetry for {} with collector endpoint {}",
        config.service_name, config.endpoint
    );

    let channel = connection::connect(&config.endpoint, config.export_timeout())?;

    let mut attributes = attributes;
    attributes.extend(config.global_labels.clone());
    let resource = build_resource(&config.service_name, build_attributes(attributes));

    global::set_text_map_propagator(propagation::propagator());

    let coordinator = ShutdownCoordinator::new();

    let tracer_provider = traces::init_traces(
        channel.clone(),
        resource.clone(),
        &config.traces.sampling,
    )?;
    global::set_tracer_provider(tracer_provider.clone());
    coordinator.register("tracer provider", {
        let provider = tracer_provider.clone();
        Box::new(move |_deadline| traces::shutdown_traces(&provider))
    })?;

    // The meter exporter takes the last clone of the channel; together the
    // two exporters keep the transport open until both have shut down.
    let meter_provider = metrics::init_metrics(channel, resource, config.metrics.push_interval())?;
    global::set_meter_provider(meter_provider.clone());
    coordinator.register("meter provider", {
        let provider = meter_provider.clone();
        Box::new(move |_deadline| metrics::shutdown_metrics(&provider))
    })?;

    // Instruments are created here, once; a failure would surface at
    // startup, never inside a request.
    let request_metrics = Arc::new(RequestMetrics::new(&meter_provider));

    info!("Telemetry initialization completed");
    Ok(TelemetryInstance {
        tracer_provider,
        meter_provider,
        request_metrics,
        coordinator,
    })
}
