use crate::config::DiscoveryConfig;
use crate::error::{HelioError, Result};
use crate::logging::{StructuredLogger, get_logger};
use std::time::Duration;

/// Address the dongle serves on once associated with its access point
pub const DONGLE_PROBE_ADDR: &str = "5.8.8.8:80";

/// Serial encoded in a dongle SSID, e.g. `Wifi_SXABC123` -> `SXABC123`
pub fn parse_serial(ssid: &str, prefix: &str) -> Option<String> {
    ssid.strip_prefix(prefix)
        .filter(|serial| !serial.is_empty())
        .map(str::to_string)
}

pub fn is_dongle_ssid(ssid: &str, prefix: &str) -> bool {
    parse_serial(ssid, prefix).is_some()
}

/// Open a TCP connection to `addr` within `timeout`
pub async fn tcp_probe(addr: &str, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, tokio::net::TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// Station-mode WiFi operations needed to join a dongle's access point
#[async_trait::async_trait]
pub trait WifiAdapter: Send {
    /// SSID of the network currently associated, if any
    async fn current_ssid(&mut self) -> Option<String>;
    async fn scan(&mut self) -> Result<Vec<String>>;
    /// Start associating; completion is observed through `is_connected`
    async fn begin(&mut self, ssid: &str) -> Result<()>;
    async fn is_connected(&mut self) -> bool;
    async fn disconnect(&mut self);

    async fn can_reach_dongle(&mut self, timeout: Duration) -> bool {
        tcp_probe(DONGLE_PROBE_ADDR, timeout).await
    }
}

pub struct DongleDiscovery {
    config: DiscoveryConfig,
    logger: StructuredLogger,
}

impl DongleDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            logger: get_logger("discovery"),
        }
    }

    /// Find a dongle access point and return its serial.
    ///
    /// An existing association is trusted as-is. Otherwise every scanned SSID
    /// with the dongle prefix is tried in order: associate, wait up to
    /// `retries` checks, then probe the dongle before accepting it.
    pub async fn discover(&self, wifi: &mut dyn WifiAdapter) -> Result<String> {
        let prefix = self.config.ssid_prefix.as_str();

        if wifi.is_connected().await
            && let Some(ssid) = wifi.current_ssid().await
        {
            if let Some(serial) = parse_serial(&ssid, prefix) {
                self.logger
                    .info(&format!("Already associated with dongle {}", serial));
                return Ok(serial);
            }
            return Err(HelioError::discovery(format!(
                "Associated with non-dongle network {}",
                ssid
            )));
        }

        let networks = wifi.scan().await?;
        for ssid in networks.iter() {
            self.logger.debug(&format!("Found network: {}", ssid));
            let Some(serial) = parse_serial(ssid, prefix) else {
                continue;
            };

            if let Err(e) = wifi.begin(ssid).await {
                self.logger
                    .warn(&format!("Association with {} failed: {}", ssid, e));
                continue;
            }

            if self.wait_for_association(wifi).await
                && wifi
                    .can_reach_dongle(Duration::from_millis(self.config.probe_timeout_ms))
                    .await
            {
                self.logger.info(&format!("Discovered dongle {}", serial));
                return Ok(serial);
            }

            self.logger
                .warn(&format!("Dongle {} not usable, trying next", ssid));
            wifi.disconnect().await;
        }

        Err(HelioError::discovery(format!(
            "No reachable network with prefix {} among {} scanned",
            prefix,
            networks.len()
        )))
    }

    async fn wait_for_association(&self, wifi: &mut dyn WifiAdapter) -> bool {
        let delay = Duration::from_millis(self.config.retry_delay_ms);
        for _ in 0..self.config.retries {
            if wifi.is_connected().await {
                return true;
            }
            tokio::time::sleep(delay).await;
        }
        false
    }
}
