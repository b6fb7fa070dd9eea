use anyhow::{Context, Result, bail};
use heliodash::{Config, Dashboard};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    heliodash::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Heliodash {} starting up, dongle at {}",
        env!("APP_VERSION"),
        config.dongle.url
    );

    let serial = config.dongle.serial.trim().to_string();
    if serial.is_empty() {
        bail!("dongle.serial is not set; it is the part of the dongle SSID after the prefix");
    }

    let mut dashboard = Dashboard::from_config(config, &serial)
        .map_err(|e| anyhow::anyhow!("Failed to create dashboard: {}", e))?;

    let shutdown = dashboard.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(());
        }
    });

    match dashboard.run().await {
        Ok(()) => {
            info!("Heliodash stopped");
            Ok(())
        }
        Err(e) => {
            error!("Dashboard failed with error: {}", e);
            Err(anyhow::anyhow!("Dashboard error: {}", e))
        }
    }
}
