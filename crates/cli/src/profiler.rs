//! Pyroscope profiler co-scheduling.
//!
//! The profiler is an independent subsystem: pulse starts it alongside
//! telemetry and stops it after telemetry teardown, but exposes no other
//! interface to it.

use anyhow::{Result, anyhow};
use pyroscope::{PyroscopeAgent, pyroscope::PyroscopeAgentRunning};
use pyroscope_pprofrs::{PprofConfig, pprof_backend};
use tracing::{info, warn};

use pulse_telemetry::ProfilesConfig;

pub fn start_profiler(
    config: &ProfilesConfig,
    service_name: &str,
) -> Result<PyroscopeAgent<PyroscopeAgentRunning>> {
    info!("Starting pyroscope agent for {}", config.endpoint);

    let pprof_config = PprofConfig::new().sample_rate(100);
    let backend_impl = pprof_backend(pprof_config);

    let agent = PyroscopeAgent::builder(config.endpoint.as_str(), service_name)
        .backend(backend_impl)
        .tags(vec![("app", service_name)])
        .build()
        .map_err(|e| anyhow!("building pyroscope agent: {e}"))?;

    agent
        .start()
        .map_err(|e| anyhow!("starting pyroscope agent: {e}"))
}

pub fn stop_profiler(agent: PyroscopeAgent<PyroscopeAgentRunning>) {
    info!("Stopping pyroscope agent");
    match agent.stop() {
        Ok(stopped) => stopped.shutdown(),
        Err(e) => warn!("Failed to stop pyroscope agent: {e}"),
    }
}
