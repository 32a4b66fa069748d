use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Builds the composite propagator carrying W3C trace context plus baggage
/// across process boundaries.
///
/// The propagator is stateless and safe for unrestricted concurrent use.
/// Extraction of a previously injected context yields the same trace id
/// and the same baggage entry set.
pub fn propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}
