//! # Pulse Telemetry
//!
//! This crate provides the telemetry infrastructure for the pulse service:
//! trace and metric export over a single shared OTLP/gRPC connection,
//! cross-process context propagation, and coordinated shutdown.
//!
//! ## Overview
//!
//! The telemetry system enables:
//! - **Distributed Tracing**: one server span per inbound request, exported
//!   through a batching span processor
//! - **Metrics Collection**: a request counter pushed periodically to the
//!   collector
//! - **Context Propagation**: W3C trace context and baggage across service
//!   boundaries
//! - **Coordinated Shutdown**: every provider torn down exactly once, in
//!   order, with failures aggregated instead of short-circuited
//!
//! Both providers export over the same lazily-dialed gRPC channel; the
//! transport closes only after the last exporter has shut down.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulse_telemetry::{TelemetryConfig, create_telemetry};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelemetryConfig {
//!         enabled: true,
//!         ..TelemetryConfig::default()
//!     };
//!     let attributes = vec![("service.version".to_string(), "1.0.0".to_string())];
//!
//!     let telemetry = create_telemetry(&config, attributes)?;
//!
//!     // Serve requests, instrumenting them with telemetry.tracer() and
//!     // telemetry.request_metrics()...
//!
//!     telemetry.shutdown(Duration::from_secs(5))?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
mod error;
mod factory;
pub mod logs;
pub mod metrics;
pub mod propagation;
pub mod registry;
pub mod resource;
pub mod shutdown;
pub mod traces;

pub use config::{MetricsConfig, ProfilesConfig, SamplingPolicy, TelemetryConfig, TracesConfig};
pub use error::{ShutdownError, TelemetryError};
pub use factory::{TelemetryInstance, create_telemetry};
pub use registry::RequestMetrics;
pub use shutdown::{ShutdownCoordinator, ShutdownFn};
