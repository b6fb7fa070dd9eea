use super::*;

impl Default for DongleConfig {
    fn default() -> Self {
        Self {
            url: "http://5.8.8.8".to_string(),
            serial: String::new(),
            timeout_ms: 5000,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ssid_prefix: "Wifi_".to_string(),
            retries: 100,
            retry_delay_ms: 100,
            probe_timeout_ms: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/heliodash.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for SmartControlConfig {
    fn default() -> Self {
        Self {
            enable_full_w: 1500,
            enable_partial_w: 100,
            disable_full_w: 500,
            disable_partial_w: 100,
        }
    }
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://api.frankfurter.app/latest?from=EUR".to_string(),
            refresh_hours: 24,
            retry_minutes: 60,
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dongle: DongleConfig::default(),
            discovery: DiscoveryConfig::default(),
            logging: LoggingConfig::default(),
            smart_control: SmartControlConfig::default(),
            exchange_rates: ExchangeRateConfig::default(),
            poll_interval_ms: 5000,
        }
    }
}
