//! Dongle register protocol
//!
//! The dongle answers `ReadRealTimeData` with a flat array of 16-bit register
//! values. This module holds the numeric conventions used to interpret those
//! words, the single index -> field table, and the decoder that turns a
//! response body into an [`InverterSnapshot`].

use crate::error::{HelioError, Result};
use serde::Deserialize;

pub mod snapshot;

pub use snapshot::{DongleStatus, InverterSnapshot};

/// Interpret a 16-bit register as two's complement.
pub fn decode16(value: u16) -> i32 {
    let v = i32::from(value);
    if v < 32768 { v } else { v - 65536 }
}

/// Combine a high and a low word into an unsigned 32-bit value.
pub fn combine32_unsigned(high: u16, low: u16) -> u32 {
    u32::from(low) + 65536 * u32::from(high)
}

/// Combine a high and a low word into a signed 32-bit value.
pub fn combine32_signed(high: u16, low: u16) -> i64 {
    let unsigned = i64::from(combine32_unsigned(high, low));
    if high >= 32768 {
        unsigned - 4_294_967_296
    } else {
        unsigned
    }
}

/// Snapshot fields sourced from the register array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    L1Power,
    L2Power,
    L3Power,
    YieldTotal,
    YieldToday,
    Pv1Power,
    Pv2Power,
    FeedInPower,
    BatteryPower,
    LoadPower,
    InverterTemperature,
    BatteryDischargedToday,
    BatteryChargedToday,
    GridSellToday,
    GridBuyToday,
    Soc,
    BatteryTemperature,
}

/// How the word(s) at a register index become a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Raw word, no sign handling
    Unsigned,
    /// Two's complement 16-bit
    Signed16,
    /// High word at the entry index, low word at `low`
    Unsigned32 { low: usize },
    /// High word at the entry index, low word at `low`, signed
    Signed32 { low: usize },
}

/// One row of the register map
#[derive(Debug, Clone, Copy)]
pub struct RegisterSpec {
    pub field: Field,
    pub index: usize,
    pub encoding: Encoding,
    /// Decimal scale applied after combining (1, 10 or 100)
    pub divisor: u32,
}

impl RegisterSpec {
    const fn new(field: Field, index: usize, encoding: Encoding, divisor: u32) -> Self {
        Self {
            field,
            index,
            encoding,
            divisor,
        }
    }

    /// Highest register index this entry touches
    const fn last_index(&self) -> usize {
        match self.encoding {
            Encoding::Unsigned32 { low } | Encoding::Signed32 { low } => {
                if low > self.index { low } else { self.index }
            }
            _ => self.index,
        }
    }

    /// Read the raw (unscaled) value. `regs` must be at least `REQUIRED_REGISTERS` long.
    fn raw(&self, regs: &[u16]) -> i64 {
        let word = regs[self.index];
        match self.encoding {
            Encoding::Unsigned => i64::from(word),
            Encoding::Signed16 => i64::from(decode16(word)),
            Encoding::Unsigned32 { low } => i64::from(combine32_unsigned(word, regs[low])),
            Encoding::Signed32 { low } => combine32_signed(word, regs[low]),
        }
    }

    /// Read and scale the value
    pub fn read(&self, regs: &[u16]) -> f64 {
        self.raw(regs) as f64 / f64::from(self.divisor)
    }
}

/// Register index -> field table for the `ReadRealTimeData` response.
pub const REGISTER_MAP: &[RegisterSpec] = &[
    RegisterSpec::new(Field::L1Power, 6, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::L2Power, 7, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::L3Power, 8, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::YieldTotal, 11, Encoding::Unsigned32 { low: 12 }, 10),
    RegisterSpec::new(Field::YieldToday, 13, Encoding::Unsigned, 10),
    RegisterSpec::new(Field::Pv1Power, 14, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::Pv2Power, 15, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::FeedInPower, 34, Encoding::Signed32 { low: 35 }, 1),
    RegisterSpec::new(Field::BatteryPower, 41, Encoding::Signed16, 1),
    RegisterSpec::new(Field::LoadPower, 47, Encoding::Signed16, 1),
    RegisterSpec::new(Field::InverterTemperature, 54, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::BatteryDischargedToday, 78, Encoding::Unsigned, 10),
    RegisterSpec::new(Field::BatteryChargedToday, 79, Encoding::Unsigned, 10),
    RegisterSpec::new(Field::GridSellToday, 90, Encoding::Unsigned, 100),
    RegisterSpec::new(Field::GridBuyToday, 92, Encoding::Unsigned, 100),
    RegisterSpec::new(Field::Soc, 103, Encoding::Unsigned, 1),
    RegisterSpec::new(Field::BatteryTemperature, 105, Encoding::Unsigned, 1),
];

const fn required_registers(map: &[RegisterSpec]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < map.len() {
        let last = map[i].last_index();
        if last > max {
            max = last;
        }
        i += 1;
    }
    max + 1
}

/// Minimum `Data` length for a response to be decodable
pub const REQUIRED_REGISTERS: usize = required_registers(REGISTER_MAP);

#[derive(Debug, Deserialize)]
struct RealTimeDataResponse {
    #[serde(rename = "Data")]
    data: Vec<serde_json::Value>,
}

/// Turns raw dongle responses into typed snapshots
#[derive(Debug, Clone, Default)]
pub struct RegisterDecoder;

impl RegisterDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a `ReadRealTimeData` response body.
    ///
    /// Unparseable JSON, a missing `Data` key or non-numeric entries are
    /// protocol errors; a well-formed array that is too short or holds values
    /// outside 0..=65535 is a decode error.
    pub fn decode_response(&self, body: &str, serial: &str) -> Result<InverterSnapshot> {
        let response: RealTimeDataResponse = serde_json::from_str(body)
            .map_err(|e| HelioError::protocol(format!("Invalid ReadRealTimeData body: {}", e)))?;

        let mut regs = Vec::with_capacity(response.data.len());
        for (i, value) in response.data.iter().enumerate() {
            if !value.is_number() {
                return Err(HelioError::protocol(format!(
                    "Register {} is not a number: {}",
                    i, value
                )));
            }
            let word = value
                .as_u64()
                .and_then(|v| u16::try_from(v).ok())
                .ok_or_else(|| {
                    HelioError::decode(format!("Register {} out of 16-bit range: {}", i, value))
                })?;
            regs.push(word);
        }

        self.decode(&regs, serial)
    }

    /// Decode an already-extracted register array
    pub fn decode(&self, regs: &[u16], serial: &str) -> Result<InverterSnapshot> {
        if regs.len() < REQUIRED_REGISTERS {
            return Err(HelioError::decode(format!(
                "Register array too short: {} < {}",
                regs.len(),
                REQUIRED_REGISTERS
            )));
        }

        let mut snapshot = InverterSnapshot {
            serial: serial.to_string(),
            ..InverterSnapshot::default()
        };
        for spec in REGISTER_MAP {
            let value = spec.read(regs);
            match spec.field {
                Field::L1Power => snapshot.l1_power = value as i32,
                Field::L2Power => snapshot.l2_power = value as i32,
                Field::L3Power => snapshot.l3_power = value as i32,
                Field::YieldTotal => snapshot.yield_total = value,
                Field::YieldToday => snapshot.yield_today = value,
                Field::Pv1Power => snapshot.pv1_power = value as i32,
                Field::Pv2Power => snapshot.pv2_power = value as i32,
                Field::FeedInPower => snapshot.feed_in_power = value as i32,
                Field::BatteryPower => snapshot.battery_power = value as i16,
                Field::LoadPower => snapshot.load_power = value as i16,
                Field::InverterTemperature => snapshot.inverter_temperature = value as i32,
                Field::BatteryDischargedToday => snapshot.battery_discharged_today = value,
                Field::BatteryChargedToday => snapshot.battery_charged_today = value,
                Field::GridSellToday => snapshot.grid_sell_today = value,
                Field::GridBuyToday => snapshot.grid_buy_today = value,
                Field::Soc => snapshot.soc = value as i32,
                Field::BatteryTemperature => snapshot.battery_temperature = value as i32,
            }
        }
        snapshot.status = DongleStatus::Ok;
        Ok(snapshot)
    }
}
