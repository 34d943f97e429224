//! Per-sensor acquisition pipeline.
//!
//! ```text
//!  ReferenceMeasured ─▶ sample ─▶ divider ─▶ band check ─▶ history ─▶ mean
//!                                               │
//!                                  absent / ref-err / overload (sentinel,
//!                                  history untouched)
//! ```
//!
//! The processor owns its history, shift, and last reported value; it is
//! only ever driven by its own task.

use log::{info, warn};

use crate::app::ports::{StoragePort, VoltageSampler};
use crate::calibration::{CalibrationStore, DEFAULT_SHIFT};
use crate::config::{ShiftPolicy, SystemConfig};
use crate::error::Error;
use crate::events::ChannelNotice;
use crate::pressure::{self, PressureEvent, PressureValue, MIN_BAND};

use super::divider::VoltageDivider;
use super::history::PressureHistory;
use super::reference::ReferenceProbe;

/// What a processor produced for one notice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelOutput {
    /// Reported value changed.
    Changed(PressureEvent),
    /// A new shift was computed (and persisted if storage allowed).
    Calibrated { channel: u8, shift: f64 },
}

pub struct ChannelProcessor {
    index: u8,
    hw_channel: u8,
    divider: VoltageDivider,
    reference: ReferenceProbe,
    shift: f64,
    policy: ShiftPolicy,
    max_pressure_pa: u32,
    history: PressureHistory,
    reported: PressureValue,
    calibration: CalibrationStore,
}

impl ChannelProcessor {
    /// Build a processor and load its persisted shift.
    ///
    /// Fails only if the smoothing window cannot be allocated or the
    /// divider is degenerate.
    pub fn new(
        index: u8,
        hw_channel: u8,
        reference: ReferenceProbe,
        cfg: &SystemConfig,
        storage: &impl StoragePort,
    ) -> Result<Self, Error> {
        let divider = VoltageDivider::new(cfg.input_divider, cfg.divider_rounding)
            .ok_or(Error::Config("input divider has no ground leg"))?;
        let history = PressureHistory::new(cfg.history_len as usize)
            .ok_or(Error::Init("history buffer allocation failed"))?;
        let calibration = CalibrationStore::new();

        let shift = match cfg.shift_policy {
            ShiftPolicy::ApplyToThresholds => calibration.get(storage, index),
            ShiftPolicy::Disabled => DEFAULT_SHIFT,
        };
        info!("ch{}: adc{} shift {:.6}", index, hw_channel, shift);

        Ok(Self {
            index,
            hw_channel,
            divider,
            reference,
            shift,
            policy: cfg.shift_policy,
            max_pressure_pa: cfg.max_pressure_pa,
            history,
            reported: PressureValue::SensorAbsent,
            calibration,
        })
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    pub fn reported(&self) -> PressureValue {
        self.reported
    }

    pub fn history(&self) -> &PressureHistory {
        &self.history
    }

    /// React to one inbox notice.
    pub fn handle(
        &mut self,
        notice: ChannelNotice,
        sampler: &mut impl VoltageSampler,
        storage: &mut impl StoragePort,
    ) -> Option<ChannelOutput> {
        match notice {
            ChannelNotice::ReferenceMeasured(snap) => self
                .process(snap.millivolts, sampler)
                .map(ChannelOutput::Changed),
            ChannelNotice::CalibrationRequested => {
                self.calibrate(sampler, storage)
                    .map(|shift| ChannelOutput::Calibrated {
                        channel: self.index,
                        shift,
                    })
            }
        }
    }

    /// Run one acquisition step against `reference_mv`.
    ///
    /// Returns an event only when the reported value changes.
    pub fn process(
        &mut self,
        reference_mv: u32,
        sampler: &mut impl VoltageSampler,
    ) -> Option<PressureEvent> {
        let measured = self.sample(sampler);
        let voltage = self.divider.correct(measured);
        let pressure = self.evaluate(voltage, reference_mv);

        if pressure == self.reported {
            return None;
        }
        self.reported = pressure;
        info!(
            "ch{}: {} mV measured, {} mV actual, ref {} mV -> {}",
            self.index, measured, voltage, reference_mv, pressure
        );
        Some(PressureEvent {
            channel: self.index,
            pressure,
        })
    }

    fn evaluate(&mut self, voltage_mv: u32, reference_mv: u32) -> PressureValue {
        if voltage_mv == 0 {
            return PressureValue::SensorAbsent;
        }
        if reference_mv == 0 {
            return PressureValue::ReferencePowerError;
        }
        let (min_mv, max_mv) = pressure::band(reference_mv, self.shift);
        if voltage_mv as f64 > max_mv {
            return PressureValue::SensorOverload;
        }
        let sample = pressure::raw_sample(voltage_mv, min_mv, max_mv, self.max_pressure_pa);
        self.history.push(sample);
        PressureValue::Pascals(self.history.mean())
    }

    /// Re-measure and derive a shift so the current reading becomes the
    /// band floor.  Returns the new shift, or `None` if nothing changed.
    pub fn calibrate(
        &mut self,
        sampler: &mut impl VoltageSampler,
        storage: &mut impl StoragePort,
    ) -> Option<f64> {
        if self.policy == ShiftPolicy::Disabled {
            info!("ch{}: calibration disabled, shift stays 1.0", self.index);
            return None;
        }

        let reference_mv = self.reference.measure(sampler);
        let voltage = self.divider.correct(self.sample(sampler));
        let expected_min = (reference_mv as f64 * MIN_BAND).round();

        if voltage == 0 || expected_min == 0.0 {
            warn!(
                "ch{}: calibration skipped (actual {} mV, expected {} mV)",
                self.index, voltage, expected_min
            );
            return None;
        }

        let shift = voltage as f64 / expected_min;
        self.shift = shift;
        info!(
            "ch{}: calibrated, actual min {} mV / expected {} mV -> shift {:.6}",
            self.index, voltage, expected_min, shift
        );
        if let Err(e) = self.calibration.set(storage, self.index, shift) {
            warn!("ch{}: shift not persisted ({}), kept in memory", self.index, e);
        }
        Some(shift)
    }

    fn sample(&self, sampler: &mut impl VoltageSampler) -> u32 {
        sampler.sample_voltage(self.hw_channel).unwrap_or_else(|e| {
            warn!("ch{}: sample failed ({}), treating as absent", self.index, e);
            0
        })
    }
}
