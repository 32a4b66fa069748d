use anyhow::{Context, Result, bail};
use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::{
    OpenApi, ToSchema,
    openapi::{Info, OpenApiBuilder},
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::RequestInstrumentation;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        WebServerConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

pub struct WebServer {
    pub cfg: WebServerConfig,
    pub instrumentation: Option<RequestInstrumentation>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PingResponse {
    pub message: String,
}

#[derive(OpenApi)]
struct ApiDoc;

/// Builds the route surface. With telemetry disabled no instrumentation
/// layer is installed at all; the routes are identical either way.
pub fn build_router(instrumentation: Option<&RequestInstrumentation>) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(ping))
        .layer(CorsLayer::permissive())
        .split_for_parts();

    let api = OpenApiBuilder::from(api).info(Info::new("Pulse API", "0.1.0")).build();

    let router = router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api));

    match instrumentation {
        Some(instrumentation) => router.layer(instrumentation.layer()),
        None => router,
    }
}

impl WebServer {
    pub fn new(cfg: WebServerConfig, instrumentation: Option<RequestInstrumentation>) -> Self {
        Self {
            cfg,
            instrumentation,
        }
    }

    /// Serves until the cancellation token fires, then drains in-flight
    /// requests. Telemetry teardown happens after this returns.
    pub async fn start(&self, cancellation_token: CancellationToken) -> Result<()> {
        if !self.cfg.enabled {
            bail!("Webserver is disabled")
        }

        let router = build_router(self.instrumentation.as_ref());

        let addr = SocketAddr::new(
            self.cfg.host.parse().context("parsing webserver host")?,
            self.cfg.port,
        );
        let listener = TcpListener::bind(addr).await.context("binding webserver listener")?;
        let socket_addr = listener.local_addr()?;
        info!(
            "Starting webserver on {}:{}",
            self.cfg.host,
            socket_addr.port()
        );

        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(cancellation_token.cancelled_owned())
            .await
            .context("Server error")?;

        Ok(())
    }
}

/// Liveness route; responds with a static pong payload.
#[utoipa::path(
    get,
    path = "/ping",
    responses(
        (status = 200, description = "Service is reachable", body = PingResponse)
    )
)]
async fn ping() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(PingResponse {
            message: "pong".to_string(),
        }),
    )
}
