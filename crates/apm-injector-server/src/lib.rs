pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod tracing;

use std::{net::SocketAddr, sync::Arc};

use ::tracing::{info, warn};
use anyhow::{Result, anyhow};
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::trace::TraceLayer;

use crate::api::{
    handlers::{mutate_handler, readiness_handler},
    state::ApiServerState,
};
use crate::config::Config;

pub struct InjectorServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl InjectorServer {
    /// Build the server using the Kubernetes client configured by the
    /// environment (in-cluster service account or kubeconfig).
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let kube_client = kube::Client::try_default()
            .await
            .map_err(|e| anyhow!("Cannot connect to Kubernetes cluster: {e}"))?;

        Self::new(config, kube_client).await
    }

    pub async fn new(config: Config, kube_client: kube::Client) -> Result<Self> {
        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(certs::create_tls_config(tls_config).await?),
            None => None,
        };

        let state = Arc::new(ApiServerState { kube_client });
        let router = Router::new()
            .route("/", post(mutate_handler))
            .route("/readiness", get(readiness_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let service = self.router.into_make_service();
        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .serve(service)
                    .await?;
            }
            None => {
                warn!(
                    address = %self.addr,
                    "no TLS certificate provided, started HTTP server"
                );
                axum_server::bind(self.addr).serve(service).await?;
            }
        }

        Ok(())
    }
}
