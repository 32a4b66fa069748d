//! Request instrumentation middleware.
//!
//! For every inbound request: extract the parent trace context from the
//! headers, start one server span named after the route template, add one
//! to the request counter, and hand control to the inner service. The span
//! is owned by the response future, so it closes on every exit path:
//! normal return, handler failure, or a dropped (cancelled) request.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
};

use axum::{
    extract::MatchedPath,
    http::{HeaderMap, Request, Response},
};
use opentelemetry::{
    KeyValue,
    propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator},
    trace::{FutureExt as _, SpanKind, Status, TraceContextExt, Tracer},
};
use opentelemetry_sdk::trace::SdkTracer;
use tower::{Layer, Service};

use pulse_telemetry::RequestMetrics;

/// The pieces of the telemetry instance the middleware consumes. They are
/// passed in explicitly rather than read from globals, so isolated
/// instances work under test.
#[derive(Clone)]
pub struct RequestInstrumentation {
    tracer: SdkTracer,
    metrics: Arc<RequestMetrics>,
    propagator: Arc<TextMapCompositePropagator>,
}

impl RequestInstrumentation {
    pub fn new(
        tracer: SdkTracer,
        metrics: Arc<RequestMetrics>,
        propagator: TextMapCompositePropagator,
    ) -> Self {
        Self {
            tracer,
            metrics,
            propagator: Arc::new(propagator),
        }
    }

    pub fn layer(&self) -> InstrumentLayer {
        InstrumentLayer {
            instrumentation: self.clone(),
        }
    }
}

/// Tower layer installing [`InstrumentService`] around the routed handlers.
#[derive(Clone)]
pub struct InstrumentLayer {
    instrumentation: RequestInstrumentation,
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = InstrumentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentService {
            inner,
            instrumentation: self.instrumentation.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InstrumentService<S> {
    inner: S,
    instrumentation: RequestInstrumentation,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InstrumentService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // The route template, not the raw path: span names and counter
        // tags stay low-cardinality.
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_owned())
            .unwrap_or_else(|| req.uri().path().to_owned());
        let method = req.method().clone();

        let parent_cx = self
            .instrumentation
            .propagator
            .extract(&HeaderExtractor(req.headers()));

        let tracer = &self.instrumentation.tracer;
        let span = tracer
            .span_builder(format!("{method} {route}"))
            .with_kind(SpanKind::Server)
            .with_attributes([
                KeyValue::new("http.request.method", method.to_string()),
                KeyValue::new("http.route", route.clone()),
            ])
            .start_with_context(tracer, &parent_cx);
        let cx = parent_cx.with_span(span);

        // The counter instrument already exists; this is an atomic add and
        // can never fail or delay the request.
        self.instrumentation.metrics.record_request(&route);

        let future = self.inner.call(req).with_context(cx.clone());
        Box::pin(async move {
            let result = future.await;

            let span = cx.span();
            match &result {
                Ok(response) => {
                    let status = response.status();
                    span.set_attribute(KeyValue::new(
                        "http.response.status_code",
                        i64::from(status.as_u16()),
                    ));
                    if status.is_client_error() || status.is_server_error() {
                        span.set_status(Status::error(format!("HTTP {status}")));
                    } else {
                        span.set_status(Status::Ok);
                    }
                }
                Err(_) => span.set_status(Status::error("handler failure")),
            }
            span.end();

            result
        })
    }
}

/// Reads trace context and baggage out of the request headers.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}
