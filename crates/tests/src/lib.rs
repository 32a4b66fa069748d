#![cfg(test)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use opentelemetry::trace::{SpanKind, Status, TraceId, TracerProvider as _};
use opentelemetry_sdk::{
    metrics::{
        InMemoryMetricExporter, PeriodicReader, SdkMeterProvider,
        data::Sum,
    },
    trace::{InMemorySpanExporter, SdkTracerProvider},
};
use tokio::net::TcpListener;

use pulse_server::{RequestInstrumentation, build_router};
use pulse_telemetry::{
    RequestMetrics, ShutdownCoordinator, metrics as telemetry_metrics, propagation,
    traces as telemetry_traces,
};

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// A fully wired telemetry pipeline over in-memory exporters, mirroring
/// the production assembly minus the collector connection.
struct TestTelemetry {
    instrumentation: RequestInstrumentation,
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    span_exporter: InMemorySpanExporter,
    metric_exporter: InMemoryMetricExporter,
}

fn test_telemetry(batch_spans: bool) -> TestTelemetry {
    let span_exporter = InMemorySpanExporter::default();
    let tracer_provider = if batch_spans {
        SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter.clone())
            .build()
    } else {
        SdkTracerProvider::builder()
            .with_simple_exporter(span_exporter.clone())
            .build()
    };

    let metric_exporter = InMemoryMetricExporter::default();
    let reader = PeriodicReader::builder(metric_exporter.clone())
        .with_interval(Duration::from_secs(60))
        .build();
    let meter_provider = SdkMeterProvider::builder().with_reader(reader).build();

    let request_metrics = Arc::new(RequestMetrics::new(&meter_provider));
    let instrumentation = RequestInstrumentation::new(
        tracer_provider.tracer("pulse"),
        request_metrics,
        propagation::propagator(),
    );

    TestTelemetry {
        instrumentation,
        tracer_provider,
        meter_provider,
        span_exporter,
        metric_exporter,
    }
}

async fn spawn_server(router: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service()).await.ok();
    });
    Ok(addr)
}

async fn ping_concurrently(addr: SocketAddr, count: usize) -> Result<()> {
    let client = reqwest::Client::new();
    let responses = futures::future::join_all((0..count).map(|_| {
        let client = client.clone();
        let url = format!("http://{addr}/ping");
        async move { client.get(&url).send().await }
    }))
    .await;

    for response in responses {
        assert_eq!(response?.status(), 200);
    }
    Ok(())
}

/// The request counter value for a route, read from the most recent
/// export. The counter is cumulative, so the last batch carries the total.
fn request_count(exporter: &InMemoryMetricExporter, route: &str) -> u64 {
    let batches = exporter.get_finished_metrics().expect("metrics exported");
    let Some(last) = batches.last() else { return 0 };

    last.scope_metrics
        .iter()
        .flat_map(|scope| scope.metrics.iter())
        .filter(|metric| metric.name == "pulse_request_count")
        .filter_map(|metric| metric.data.as_any().downcast_ref::<Sum<u64>>())
        .flat_map(|sum| sum.data_points.iter())
        .filter(|point| {
            point
                .attributes
                .iter()
                .any(|kv| kv.key.as_str() == "endpoint" && kv.value.as_str() == route)
        })
        .map(|point| point.value)
        .sum()
}

#[tokio::test]
async fn ping_responds_without_telemetry() -> Result<()> {
    // No instrumentation layer at all: the route behaves identically and
    // no collector connection exists anywhere in the process.
    let addr = spawn_server(build_router(None)).await?;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/ping"))
        .await?
        .error_for_status()?
        .json()
        .await?;

    assert_eq!(body, serde_json::json!({"message": "pong"}));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_pings_count_exactly_once_each() -> Result<()> {
    const REQUESTS: usize = 32;

    let telemetry = test_telemetry(false);
    let addr = spawn_server(build_router(Some(&telemetry.instrumentation))).await?;

    ping_concurrently(addr, REQUESTS).await?;

    telemetry.meter_provider.force_flush()?;
    assert_eq!(
        request_count(&telemetry.metric_exporter, "/ping"),
        REQUESTS as u64
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn request_spans_are_named_after_the_route() -> Result<()> {
    let telemetry = test_telemetry(false);
    let addr = spawn_server(build_router(Some(&telemetry.instrumentation))).await?;

    ping_concurrently(addr, 3).await?;

    let spans = telemetry.span_exporter.get_finished_spans()?;
    let ping_spans: Vec<_> = spans.iter().filter(|span| span.name == "GET /ping").collect();
    assert_eq!(ping_spans.len(), 3);
    for span in ping_spans {
        assert_eq!(span.span_kind, SpanKind::Server);
        assert_eq!(span.status, Status::Ok);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn inbound_trace_context_becomes_the_span_parent() -> Result<()> {
    let telemetry = test_telemetry(false);
    let addr = spawn_server(build_router(Some(&telemetry.instrumentation))).await?;

    let client = reqwest::Client::new();
    client
        .get(format!("http://{addr}/ping"))
        .header(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )
        .send()
        .await?
        .error_for_status()?;

    let spans = telemetry.span_exporter.get_finished_spans()?;
    let span = spans
        .iter()
        .find(|span| span.name == "GET /ping")
        .expect("ping span exported");
    assert_eq!(
        span.span_context.trace_id(),
        TraceId::from_u128(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736)
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_concurrent_pings_then_coordinated_shutdown() -> Result<()> {
    const REQUESTS: usize = 10;

    // The production assembly: batching span pipeline, periodic metric
    // pipeline, both registered with the coordinator in startup order.
    let telemetry = test_telemetry(true);
    let coordinator = ShutdownCoordinator::new();
    {
        let provider = telemetry.tracer_provider.clone();
        coordinator.register(
            "tracer provider",
            Box::new(move |_| telemetry_traces::shutdown_traces(&provider)),
        )?;
    }
    {
        let provider = telemetry.meter_provider.clone();
        coordinator.register(
            "meter provider",
            Box::new(move |_| telemetry_metrics::shutdown_metrics(&provider)),
        )?;
    }

    let addr = spawn_server(build_router(Some(&telemetry.instrumentation))).await?;
    ping_concurrently(addr, REQUESTS).await?;

    // One shutdown pass: flushes buffered spans, forces a final metric
    // push, and reports no errors.
    assert!(coordinator.shutdown(SHUTDOWN_DEADLINE).is_ok());

    assert_eq!(
        request_count(&telemetry.metric_exporter, "/ping"),
        REQUESTS as u64
    );
    let spans = telemetry.span_exporter.get_finished_spans()?;
    assert_eq!(
        spans.iter().filter(|span| span.name == "GET /ping").count(),
        REQUESTS
    );

    // Redundant invocation during teardown races stays a no-op.
    assert!(coordinator.shutdown(SHUTDOWN_DEADLINE).is_ok());
    Ok(())
}
