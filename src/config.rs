//! System configuration parameters
//!
//! All tunable parameters for the PressControl system.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins::RELAY_GPIOS;

/// Upper bound on pressure channels (sizes fixed arrays in the fabric).
pub const MAX_CHANNELS: usize = 8;

/// Upper bound on the smoothing window.
pub const MAX_HISTORY_LEN: usize = 32;

/// Two-resistor voltage divider in front of an ADC pin.
///
/// `r1_ohm` is the upper (series) leg, `r2_ohm` the leg to ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividerConfig {
    pub r1_ohm: u32,
    pub r2_ohm: u32,
}

/// Rounding applied to a divider-corrected voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DividerRounding {
    /// Nearest millivolt.
    Unit,
    /// Nearest 10 mV.
    Tens,
}

/// Whether per-channel calibration shifts take part in acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftPolicy {
    /// Load persisted shifts, scale the voltage band by them, and accept
    /// calibration requests.
    ApplyToThresholds,
    /// Every shift is 1.0; calibration requests are logged and ignored.
    Disabled,
}

/// Relay controller tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay output index on the board.
    pub output: u8,
    /// Pressure channel whose value drives the relay.
    pub monitored_channel: u8,
    /// Below this (Pa) the relay wants to turn on.
    pub low_mark_pa: u32,
    /// Above this (Pa) the relay is forced off.
    pub high_mark_pa: u32,
    /// Longest continuous ON period (ms).
    pub max_on_ms: u64,
    /// Shortest OFF period before the relay may turn on again (ms).
    pub min_off_ms: u64,
    /// Delay before the controller starts consuming pressure events (ms).
    pub startup_delay_ms: u32,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// Number of live pressure channels.
    pub channel_count: u8,
    /// Reference sampling period; drives the whole acquisition cadence (ms).
    pub cycle_period_ms: u32,
    /// Smoothing window length in samples.
    pub history_len: u8,
    /// Pressure reported at the top of the voltage band (Pa).
    pub max_pressure_pa: u32,

    // --- Dividers ---
    pub reference_divider: DividerConfig,
    pub input_divider: DividerConfig,
    pub divider_rounding: DividerRounding,

    // --- Calibration ---
    pub shift_policy: ShiftPolicy,

    // --- Notification ---
    /// Longest a channel waits to enqueue a pressure event (ms).
    pub publish_timeout_ms: u32,

    // --- Relay ---
    pub relay: RelayConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            channel_count: 5,
            cycle_period_ms: 40,
            history_len: 5,
            max_pressure_pa: 1_200_000, // 1.2 MPa

            // Dividers
            reference_divider: DividerConfig {
                r1_ohm: 1640,
                r2_ohm: 1430,
            },
            input_divider: DividerConfig {
                r1_ohm: 1130,
                r2_ohm: 2640,
            },
            divider_rounding: DividerRounding::Tens,

            shift_policy: ShiftPolicy::ApplyToThresholds,

            publish_timeout_ms: 10, // quarter of a cycle

            relay: RelayConfig {
                output: 0,
                monitored_channel: 0,
                low_mark_pa: 250_000,
                high_mark_pa: 820_000,
                max_on_ms: 5 * 60 * 1000,
                min_off_ms: 5 * 60 * 1000,
                startup_delay_ms: 2000,
            },
        }
    }
}

impl SystemConfig {
    /// Range-check every field.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 || self.channel_count as usize > MAX_CHANNELS {
            return Err(ConfigError::ValidationFailed("channel_count must be 1–8"));
        }
        if self.history_len == 0 || self.history_len as usize > MAX_HISTORY_LEN {
            return Err(ConfigError::ValidationFailed("history_len must be 1–32"));
        }
        if !(10..=1000).contains(&self.cycle_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "cycle_period_ms must be 10–1000",
            ));
        }
        if self.publish_timeout_ms == 0 || self.publish_timeout_ms >= self.cycle_period_ms {
            return Err(ConfigError::ValidationFailed(
                "publish_timeout_ms must be shorter than cycle_period_ms",
            ));
        }
        if self.max_pressure_pa == 0 || self.max_pressure_pa > i32::MAX as u32 {
            return Err(ConfigError::ValidationFailed(
                "max_pressure_pa out of range",
            ));
        }
        for divider in [self.reference_divider, self.input_divider] {
            if divider.r2_ohm == 0 {
                return Err(ConfigError::ValidationFailed(
                    "divider r2_ohm must be non-zero",
                ));
            }
        }

        let relay = &self.relay;
        if relay.output as usize >= RELAY_GPIOS.len() {
            return Err(ConfigError::ValidationFailed(
                "relay.output has no GPIO on this board",
            ));
        }
        if relay.monitored_channel >= self.channel_count {
            return Err(ConfigError::ValidationFailed(
                "relay.monitored_channel must be < channel_count",
            ));
        }
        if relay.low_mark_pa >= relay.high_mark_pa {
            return Err(ConfigError::ValidationFailed(
                "relay.low_mark_pa must be < relay.high_mark_pa",
            ));
        }
        if relay.high_mark_pa > self.max_pressure_pa {
            return Err(ConfigError::ValidationFailed(
                "relay.high_mark_pa must not exceed max_pressure_pa",
            ));
        }
        if relay.max_on_ms == 0 || relay.min_off_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "relay dwell periods must be non-zero",
            ));
        }
        Ok(())
    }
}
