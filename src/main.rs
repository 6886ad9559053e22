use anyhow::Result;
use energy_forecast::{api, config::Config, telemetry};
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let addr = cfg.dashboard.socket_addr()?;

    if cfg.dashboard.host == "0.0.0.0" {
        warn!(
            "WARNING: Dashboard binding to 0.0.0.0 - it will be accessible from the network! \
            Bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    let app = api::router(api::AppState::new(cfg));

    info!(%addr, "starting energy forecast dashboard");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
