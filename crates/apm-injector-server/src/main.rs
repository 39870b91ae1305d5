use anyhow::{Result, anyhow};
use apm_injector_server::{InjectorServer, cli, config::Config, tracing::setup_tracing};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    // Starting from rustls 0.22, each application must set its default crypto provider.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the default crypto provider"))?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
    info!("Starting Admission Controller Webhook Server for APM host injection");

    // Failing to reach the cluster is fatal: every request needs it
    let server = InjectorServer::new_from_config(config).await?;
    server.run().await
}
