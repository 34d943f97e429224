//! Reference rail sampling.
//!
//! The tracker is the acquisition clock: each tick measures the reference
//! channel, stores the snapshot in the fabric, and only then wakes the
//! channel processors.

use log::{debug, warn};

use crate::app::ports::VoltageSampler;
use crate::events::{NotificationFabric, ReferenceSnapshot};

use super::divider::VoltageDivider;

/// Divider-corrected reader for the reference channel.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceProbe {
    hw_channel: u8,
    divider: VoltageDivider,
}

impl ReferenceProbe {
    pub fn new(hw_channel: u8, divider: VoltageDivider) -> Self {
        Self {
            hw_channel,
            divider,
        }
    }

    /// Reference voltage in mV.  A failed sample reads as 0 (power absent).
    pub fn measure(&self, sampler: &mut impl VoltageSampler) -> u32 {
        match sampler.sample_voltage(self.hw_channel) {
            Ok(mv) => self.divider.correct(mv),
            Err(e) => {
                warn!("reference: sample failed ({}), treating as 0 mV", e);
                0
            }
        }
    }
}

pub struct ReferenceTracker {
    probe: ReferenceProbe,
    last_mv: Option<u32>,
}

impl ReferenceTracker {
    pub fn new(probe: ReferenceProbe) -> Self {
        Self {
            probe,
            last_mv: None,
        }
    }

    /// One acquisition tick.
    pub fn tick(
        &mut self,
        sampler: &mut impl VoltageSampler,
        fabric: &NotificationFabric,
    ) -> ReferenceSnapshot {
        let mv = self.probe.measure(sampler);
        if self.last_mv != Some(mv) {
            debug!("reference: {} mV", mv);
            if mv == 0 && self.last_mv.is_some_and(|prev| prev != 0) {
                warn!("reference: rail lost");
            }
            self.last_mv = Some(mv);
        }
        fabric.broadcast_reference(mv)
    }
}
