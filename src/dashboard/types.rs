use crate::chart::ChartDataItem;
use crate::history::PowerSample;
use crate::protocol::InverterSnapshot;
use crate::rules::{Decision, SmartControlState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of the poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardState {
    #[default]
    Initializing,
    Running,
    ShuttingDown,
}

/// Immutable view published after every poll cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub timestamp: String,
    pub uptime_ms: u64,
    pub serial: String,
    pub state: DashboardState,
    /// Code of the last poll outcome (0, -1, -2, -3)
    pub status: i32,
    pub status_text: String,
    /// Last successfully decoded inverter data
    pub inverter: Option<InverterSnapshot>,
    pub history_ready: bool,
    /// Newest first
    pub history: Vec<PowerSample>,
    /// Newest bucket first
    pub chart: Vec<ChartDataItem>,
    pub decision: Decision,
    pub smart_control: SmartControlState,
    pub exchange_rates: BTreeMap<String, f64>,
    pub total_polls: u64,
    pub failed_polls: u64,
    pub overrun_count: u64,
    pub poll_interval_ms: u64,
    pub last_poll_duration_ms: Option<u64>,
}
