use crate::error::HelioError;
use serde::{Deserialize, Serialize};

/// Outcome of the last dongle poll, as the numeric codes the dashboard shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DongleStatus {
    #[default]
    Ok,
    ConnectionError,
    HttpError,
    JsonError,
}

impl DongleStatus {
    pub fn code(self) -> i32 {
        match self {
            DongleStatus::Ok => 0,
            DongleStatus::ConnectionError => -1,
            DongleStatus::HttpError => -2,
            DongleStatus::JsonError => -3,
        }
    }

    /// Map a numeric code back; unknown codes are treated as JSON errors
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DongleStatus::Ok,
            -1 => DongleStatus::ConnectionError,
            -2 => DongleStatus::HttpError,
            _ => DongleStatus::JsonError,
        }
    }

    pub fn from_error(err: &HelioError) -> Self {
        Self::from_code(err.status_code())
    }

    pub fn status_text(self) -> &'static str {
        match self {
            DongleStatus::Ok => "OK",
            DongleStatus::ConnectionError => "Connection error",
            DongleStatus::HttpError => "HTTP error",
            DongleStatus::JsonError => "JSON error",
        }
    }
}

/// One decoded `ReadRealTimeData` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InverterSnapshot {
    pub serial: String,
    pub status: DongleStatus,
    pub pv1_power: i32,
    pub pv2_power: i32,
    pub soc: i32,
    /// Negative while discharging
    pub battery_power: i16,
    pub load_power: i16,
    /// Negative while importing from the grid
    pub feed_in_power: i32,
    pub l1_power: i32,
    pub l2_power: i32,
    pub l3_power: i32,
    pub inverter_temperature: i32,
    pub battery_temperature: i32,
    pub yield_today: f64,
    pub yield_total: f64,
    pub grid_buy_today: f64,
    pub grid_sell_today: f64,
    pub battery_charged_today: f64,
    pub battery_discharged_today: f64,
}

impl InverterSnapshot {
    pub fn pv_power(&self) -> i32 {
        self.pv1_power + self.pv2_power
    }

    /// Energy consumed today as the dashboard displays it
    pub fn load_today(&self) -> f64 {
        self.yield_today + self.grid_buy_today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in [
            DongleStatus::Ok,
            DongleStatus::ConnectionError,
            DongleStatus::HttpError,
            DongleStatus::JsonError,
        ] {
            assert_eq!(DongleStatus::from_code(status.code()), status);
        }
        assert_eq!(DongleStatus::from_code(-42), DongleStatus::JsonError);
    }

    #[test]
    fn status_from_error() {
        assert_eq!(
            DongleStatus::from_error(&HelioError::http(500)),
            DongleStatus::HttpError
        );
        assert_eq!(
            DongleStatus::from_error(&HelioError::connection("refused")),
            DongleStatus::ConnectionError
        );
        assert_eq!(DongleStatus::HttpError.status_text(), "HTTP error");
    }

    #[test]
    fn derived_values() {
        let snap = InverterSnapshot {
            pv1_power: 1200,
            pv2_power: 800,
            yield_today: 12.5,
            grid_buy_today: 3.25,
            ..InverterSnapshot::default()
        };
        assert_eq!(snap.pv_power(), 2000);
        assert!((snap.load_today() - 15.75).abs() < 1e-9);
    }
}
