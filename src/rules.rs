//! Load automation rules
//!
//! Both evaluators are pure functions of a [`PowerSampleHistory`]; they never
//! mutate it and never perform I/O.

use crate::config::SmartControlConfig;
use crate::error::{HelioError, Result};
use crate::history::PowerSampleHistory;
use crate::median::SampleField;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Median surplus (battery charge or grid export) that justifies switching the load on
pub const ACTIVATION_THRESHOLD_W: i32 = 1500;
/// Latest SOC at which the battery counts as full
pub const FULL_SOC: i32 = 99;
/// Latest SOC above which a charging battery counts as almost full
pub const ALMOST_FULL_SOC: i32 = 90;

/// Which rule produced a [`Decision`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    #[default]
    NotReady,
    BatteryFull,
    BatteryAlmostFullAndCharging,
    FeedingIn,
    NoSurplus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub active: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn new(active: bool, reason: DecisionReason) -> Self {
        Self { active, reason }
    }
}

pub struct RuleEngine;

impl RuleEngine {
    /// Evaluate the activation rules, first match wins:
    /// - history not full -> off
    /// - latest SOC >= 99 -> on
    /// - latest SOC > 90 and median battery power > threshold -> on
    /// - median feed-in power > threshold -> on
    /// - otherwise off
    pub fn evaluate(history: &PowerSampleHistory) -> Decision {
        if !history.is_ready() {
            return Decision::new(false, DecisionReason::NotReady);
        }
        let soc = history.latest().map(|s| s.soc).unwrap_or_default();

        if soc >= FULL_SOC {
            return Decision::new(true, DecisionReason::BatteryFull);
        }

        let battery = history
            .median_of(SampleField::BatteryPower)
            .unwrap_or_default();
        if soc > ALMOST_FULL_SOC && battery > ACTIVATION_THRESHOLD_W {
            return Decision::new(true, DecisionReason::BatteryAlmostFullAndCharging);
        }

        let feed_in = history
            .median_of(SampleField::FeedInPower)
            .unwrap_or_default();
        if feed_in > ACTIVATION_THRESHOLD_W {
            return Decision::new(true, DecisionReason::FeedingIn);
        }

        Decision::new(false, DecisionReason::NoSurplus)
    }

    pub fn can_activate(history: &PowerSampleHistory) -> bool {
        Self::evaluate(history).active
    }

    /// Typed alternative to the fail-safe `false` for an unfilled window
    pub fn require_ready(history: &PowerSampleHistory) -> Result<()> {
        if history.is_ready() {
            Ok(())
        } else {
            Err(HelioError::stale_history(history.len(), history.capacity()))
        }
    }
}

/// Graded request for the controlled load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmartControlState {
    #[default]
    Unknown,
    FullOff,
    PartialOff,
    KeepCurrentState,
    PartialOn,
    FullOn,
}

impl SmartControlState {
    /// Signed level, `Unknown` excluded
    pub fn level(self) -> Option<i8> {
        match self {
            SmartControlState::Unknown => None,
            SmartControlState::FullOff => Some(-2),
            SmartControlState::PartialOff => Some(-1),
            SmartControlState::KeepCurrentState => Some(0),
            SmartControlState::PartialOn => Some(1),
            SmartControlState::FullOn => Some(2),
        }
    }
}

pub struct SmartControlResolver {
    thresholds: SmartControlConfig,
}

impl SmartControlResolver {
    pub fn new(thresholds: SmartControlConfig) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SmartControlConfig {
        &self.thresholds
    }

    /// Resolve the requested load state. Deactivation rules are checked
    /// before activation rules.
    pub fn resolve(&self, history: &PowerSampleHistory) -> SmartControlState {
        if !history.is_ready() {
            return SmartControlState::Unknown;
        }
        let t = &self.thresholds;
        let soc = history.latest().map(|s| s.soc).unwrap_or_default();
        let battery = history
            .median_of(SampleField::BatteryPower)
            .unwrap_or_default();
        let feed_in = history
            .median_of(SampleField::FeedInPower)
            .unwrap_or_default();
        let has_battery = soc != 0 && battery != 0;

        debug!(
            "Resolving smart control: soc={} battery={} feed_in={}",
            soc, battery, feed_in
        );

        if has_battery && soc < 80 {
            return SmartControlState::FullOff;
        }
        if battery < -t.disable_full_w || feed_in < -t.disable_full_w {
            return SmartControlState::FullOff;
        }
        if battery < -t.disable_partial_w || feed_in < -t.disable_partial_w {
            return SmartControlState::PartialOff;
        }
        if soc >= 95 {
            return SmartControlState::FullOn;
        }
        if soc >= 85 && battery > t.enable_full_w {
            return SmartControlState::FullOn;
        }
        if soc >= 90 && battery > t.enable_partial_w {
            return SmartControlState::PartialOn;
        }
        if feed_in > t.enable_full_w {
            return SmartControlState::FullOn;
        }
        if feed_in > t.enable_partial_w {
            return SmartControlState::PartialOn;
        }
        SmartControlState::KeepCurrentState
    }
}
