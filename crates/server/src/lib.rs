//! # Pulse Server
//!
//! The HTTP surface of the pulse service: a single documented `GET /ping`
//! route served by axum, plus the request instrumentation middleware that
//! wraps it when telemetry is enabled.

pub mod middleware;
pub mod webserver;

pub use middleware::{InstrumentLayer, RequestInstrumentation};
pub use webserver::{PingResponse, WebServer, WebServerConfig, build_router};
