//! Hardware adapters — bridge real peripherals to domain port traits.
//!
//! - [`AdcSampler`] implements [`VoltageSampler`] over ADC1: oversampled,
//!   noise-floored, and converted through the calibration curve.
//! - [`RelayBank`] implements [`ActuatorPort`] over a fixed set of
//!   [`RelayDriver`]s.
//!
//! On non-espidf targets the ADC underneath is simulated (see
//! [`hw_init::sim_set_adc_raw`](crate::drivers::hw_init)).

use embedded_hal::digital::OutputPin;

use crate::app::ports::{ActuatorPort, RelayState, VoltageSampler};
use crate::drivers::hw_init;
use crate::drivers::relay::RelayDriver;
use crate::error::{ActuatorError, SensorError};
use crate::pins;

// ── VoltageSampler ────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct AdcSampler {
    oversample: u32,
    noise_floor: u32,
}

impl Default for AdcSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcSampler {
    pub fn new() -> Self {
        Self {
            oversample: pins::ADC_OVERSAMPLE,
            noise_floor: pins::ADC_NOISE_FLOOR,
        }
    }

    /// Mean of `oversample` raw conversions.
    pub fn read_raw(&self, hw_channel: u8) -> Result<u32, SensorError> {
        let mut sum: u32 = 0;
        for _ in 0..self.oversample {
            sum += hw_init::adc1_read(hw_channel)? as u32;
        }
        Ok(sum / self.oversample)
    }
}

impl VoltageSampler for AdcSampler {
    fn sample_voltage(&mut self, hw_channel: u8) -> Result<u32, SensorError> {
        let raw = self.read_raw(hw_channel)?;
        if raw <= self.noise_floor {
            return Ok(0);
        }
        hw_init::adc1_raw_to_mv(raw)
    }
}

// ── ActuatorPort ──────────────────────────────────────────────

pub struct RelayBank<P: OutputPin, const N: usize> {
    relays: [RelayDriver<P>; N],
}

impl<P: OutputPin, const N: usize> RelayBank<P, N> {
    pub fn new(relays: [RelayDriver<P>; N]) -> Self {
        Self { relays }
    }

    pub fn state(&self, output: u8) -> Option<RelayState> {
        self.relays.get(output as usize).map(RelayDriver::state)
    }
}

impl<P: OutputPin, const N: usize> ActuatorPort for RelayBank<P, N> {
    fn actuate(&mut self, output: u8, state: RelayState) -> Result<(), ActuatorError> {
        self.relays
            .get_mut(output as usize)
            .ok_or(ActuatorError::UnknownOutput(output))?
            .set(state)
    }
}
