use opentelemetry::{
    KeyValue,
    metrics::{Counter, Meter, MeterProvider as _},
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use tracing::info;

/// Request-level instruments, created once at startup.
///
/// Building an instrument can only fail before the service accepts
/// traffic; request handling just records. The counter is atomic across
/// arbitrarily many concurrent callers.
pub struct RequestMetrics {
    // Note: meter field is kept even though it's not directly used
    // as it's needed to keep the instrument scope alive
    #[allow(dead_code)]
    meter: Meter,
    request_count: Counter<u64>,
}

impl RequestMetrics {
    pub fn new(provider: &SdkMeterProvider) -> Self {
        info!("Initializing request metrics registry");
        let meter = provider.meter("pulse");

        let request_count = meter
            .u64_counter("pulse_request_count")
            .with_description("Total number of handled HTTP requests")
            .build();

        Self {
            meter,
            request_count,
        }
    }

    /// Adds one handled request for the given route template.
    pub fn record_request(&self, route: &str) {
        self.request_count
            .add(1, &[KeyValue::new("endpoint", route.to_string())]);
    }
}
