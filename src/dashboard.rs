//! Dashboard orchestration
//!
//! [`Dashboard`] owns the sample history, the chart and the poll statistics.
//! One poll cycle runs to completion per tick; readers observe the result
//! only through the immutable [`DashboardSnapshot`] published on a `watch`
//! channel.

use crate::chart::ChartAggregator;
use crate::config::Config;
use crate::dongle::DongleClient;
use crate::error::Result;
use crate::history::PowerSampleHistory;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::protocol::{DongleStatus, InverterSnapshot};
use crate::rates::ExchangeRateService;
use crate::rules::{Decision, SmartControlResolver, SmartControlState};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

pub mod poll;
pub mod types;

#[cfg(test)]
mod tests;

pub use types::{DashboardSnapshot, DashboardState};

pub struct Dashboard {
    config: Config,
    client: DongleClient,
    rates: Option<ExchangeRateService>,
    resolver: SmartControlResolver,
    logger: StructuredLogger,

    history: PowerSampleHistory,
    chart: ChartAggregator,

    boot: Instant,
    state: DashboardState,
    last_inverter: Option<InverterSnapshot>,
    last_status: DongleStatus,
    decision: Decision,
    smart_control: SmartControlState,

    total_polls: u64,
    failed_polls: u64,
    overrun_count: u64,
    last_poll_duration_ms: Option<u64>,

    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
}

impl Dashboard {
    pub fn new(config: Config, client: DongleClient, rates: Option<ExchangeRateService>) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("dashboard")
                .with_serial(client.serial().to_string())
                .with_field("url", config.dongle.url.clone()),
        );
        let resolver = SmartControlResolver::new(config.smart_control.clone());
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(Arc::new(DashboardSnapshot::default()));

        let dashboard = Self {
            config,
            client,
            rates,
            resolver,
            logger,
            history: PowerSampleHistory::new(),
            chart: ChartAggregator::new(),
            boot: Instant::now(),
            state: DashboardState::Initializing,
            last_inverter: None,
            last_status: DongleStatus::Ok,
            decision: Decision::default(),
            smart_control: SmartControlState::Unknown,
            total_polls: 0,
            failed_polls: 0,
            overrun_count: 0,
            last_poll_duration_ms: None,
            snapshot_tx,
            shutdown_tx,
            shutdown_rx,
        };
        dashboard.publish();
        dashboard
    }

    /// Build the HTTP dongle client and, when enabled, the rate service
    pub fn from_config(config: Config, serial: &str) -> Result<Self> {
        let client = DongleClient::from_config(&config.dongle, serial)?;
        let rates = if config.exchange_rates.enabled {
            Some(ExchangeRateService::new(config.exchange_rates.clone())?)
        } else {
            None
        };
        Ok(Self::new(config, client, rates))
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Sender that stops `run` when signalled
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<()> {
        self.shutdown_tx.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &PowerSampleHistory {
        &self.history
    }

    pub fn chart(&self) -> &ChartAggregator {
        &self.chart
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn smart_control(&self) -> SmartControlState {
        self.smart_control
    }

    pub fn last_status(&self) -> DongleStatus {
        self.last_status
    }

    pub fn total_polls(&self) -> u64 {
        self.total_polls
    }

    pub fn failed_polls(&self) -> u64 {
        self.failed_polls
    }

    pub fn uptime_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }

    pub(crate) fn build_snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_ms: self.uptime_ms(),
            serial: self.client.serial().to_string(),
            state: self.state,
            status: self.last_status.code(),
            status_text: self.last_status.status_text().to_string(),
            inverter: self.last_inverter.clone(),
            history_ready: self.history.is_ready(),
            history: self.history.to_vec(),
            chart: self.chart.to_vec(),
            decision: self.decision,
            smart_control: self.smart_control,
            exchange_rates: self
                .rates
                .as_ref()
                .map(|r| r.rates().clone())
                .unwrap_or_default(),
            total_polls: self.total_polls,
            failed_polls: self.failed_polls,
            overrun_count: self.overrun_count,
            poll_interval_ms: self.config.poll_interval_ms,
            last_poll_duration_ms: self.last_poll_duration_ms,
        }
    }

    pub(crate) fn publish(&self) {
        // send_replace keeps the value current even with no subscribers yet
        self.snapshot_tx.send_replace(Arc::new(self.build_snapshot()));
    }
}
