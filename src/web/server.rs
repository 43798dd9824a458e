//! Gateway server using Axum.

use std::future::Future;
use std::net::SocketAddr;

use tower_http::cors::{Any, CorsLayer};

use super::router::{create_app_router, AppState};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        GatewayConfig::default().into()
    }
}

impl From<GatewayConfig> for WebServerConfig {
    fn from(gateway: GatewayConfig) -> Self {
        Self {
            port: gateway.port,
            host: gateway.host,
        }
    }
}

impl WebServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Web(format!("Invalid address: {}", e)))
    }
}

/// Serve the gateway until `shutdown` resolves.
pub async fn run_server<F>(config: WebServerConfig, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app_router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = config.addr()?;
    tracing::info!("Starting gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}
