mod profiler;
mod settings;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pulse_server::{RequestInstrumentation, WebServer};
use pulse_telemetry::{create_telemetry, logs, propagation};

use crate::settings::{Cli, load_settings};

/// Shared deadline for flushing every telemetry subsystem on exit.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// The main function that initializes and runs a pulse server.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    logs::init_log_subscriber(&settings.log_level);

    // Telemetry is a required subsystem when enabled: a construction
    // failure aborts startup instead of serving half-instrumented.
    let telemetry = if settings.telemetry.enabled {
        let attributes = vec![(
            "service.version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )];
        Some(Arc::new(create_telemetry(&settings.telemetry, attributes)?))
    } else {
        info!("Telemetry disabled, skipping collector connection");
        None
    };

    let profiler = if settings.telemetry.profiles.enabled {
        Some(profiler::start_profiler(
            &settings.telemetry.profiles,
            &settings.telemetry.service_name,
        )?)
    } else {
        None
    };

    let instrumentation = telemetry.as_ref().map(|telemetry| {
        RequestInstrumentation::new(
            telemetry.tracer(),
            telemetry.request_metrics(),
            propagation::propagator(),
        )
    });

    let cancellation_token = CancellationToken::new();
    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            signal_token.cancel();
        }
    });

    let server = WebServer::new(settings.webserver.clone(), instrumentation);
    let serve_result = server.start(cancellation_token).await;

    // Teardown order: the server has stopped accepting requests, so both
    // providers can flush; the profiler stops last, independently.
    let shutdown_result = match &telemetry {
        Some(telemetry) => telemetry.shutdown(SHUTDOWN_DEADLINE),
        None => Ok(()),
    };
    if let Err(e) = &shutdown_result {
        error!("Telemetry teardown failed: {e}");
    }

    if let Some(agent) = profiler {
        profiler::stop_profiler(agent);
    }

    serve_result?;
    shutdown_result.map_err(Into::into)
}
