use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("opening collector connection: {0}")]
    Connection(String),

    #[error("building exporter: {0}")]
    Exporter(String),

    #[error("telemetry initialization error: {0}")]
    Initialization(String),

    #[error("shutting down {0}")]
    Shutdown(String),

    #[error("telemetry already shut down")]
    AlreadyShutDown,
}

/// Composite error returned by [`ShutdownCoordinator::shutdown`]: every
/// callback that failed, in invocation order. Non-empty by construction.
///
/// [`ShutdownCoordinator::shutdown`]: crate::shutdown::ShutdownCoordinator::shutdown
#[derive(Debug, Error)]
#[error("telemetry shutdown failed: {}", .failures.iter().map(|(name, reason)| format!("{name}: {reason}")).collect::<Vec<_>>().join("; "))]
pub struct ShutdownError {
    pub failures: Vec<(String, String)>,
}
