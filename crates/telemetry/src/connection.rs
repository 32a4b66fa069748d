use std::time::Duration;

use tonic::transport::Channel;
use tracing::info;

use crate::error::TelemetryError;

/// Opens the gRPC channel shared by the trace and metric exporters.
///
/// The dial is lazy: no reachability check happens here, and an unreachable
/// collector surfaces as an export failure on first use. A malformed
/// endpoint is rejected immediately.
///
/// The channel is cheaply cloneable; each exporter keeps its own clone, so
/// the underlying transport stays open until the last exporter is dropped
/// during shutdown. Callers must not close it themselves.
pub fn connect(endpoint: &str, timeout: Duration) -> Result<Channel, TelemetryError> {
    info!("Initializing gRPC connection to collector at {endpoint}");
    let endpoint = Channel::from_shared(endpoint.to_string()).map_err(|e| {
        TelemetryError::Connection(format!("invalid collector endpoint {endpoint:?}: {e}"))
    })?;
    Ok(endpoint.timeout(timeout).connect_lazy())
}
