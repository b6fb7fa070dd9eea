//! Inverter dongle access
//!
//! `client` talks to the dongle's local HTTP interface, `discovery` finds the
//! dongle's access point and derives its serial from the SSID.

pub mod client;
pub mod discovery;

pub use client::{DongleClient, DongleTransport, HttpDongleTransport};
pub use discovery::{DongleDiscovery, WifiAdapter, is_dongle_ssid, parse_serial};
