//! # Heliodash - solar inverter dashboard service
//!
//! Polls a local inverter dongle over HTTP, decodes its register protocol,
//! keeps a short rolling window of power readings, derives a load automation
//! decision and aggregates a day-long chart of 5-minute averages.
//!
//! ## Architecture
//!
//! - `protocol`: register numeric conventions, the register map and the decoder
//! - `history`: fixed ring of the ten most recent power samples
//! - `median`: per-field median over the sample window
//! - `rules`: activation rules and the graded smart-control resolver
//! - `chart`: 288-bucket ring of running averages
//! - `dongle`: HTTP transport and WiFi access-point discovery
//! - `rates`: cached EUR exchange rates with built-in fallbacks
//! - `dashboard`: the poll loop tying the pieces together
//! - `config`, `logging`, `error`: ambient plumbing

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod dongle;
pub mod error;
pub mod history;
pub mod logging;
pub mod median;
pub mod protocol;
pub mod rates;
pub mod rules;

// Re-export commonly used types
pub use config::Config;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::{HelioError, Result};
pub use protocol::{InverterSnapshot, RegisterDecoder};
