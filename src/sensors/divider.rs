//! Resistive divider correction.
//!
//! ```text
//!   Vin ──[R1]──┬──[R2]── GND
//!               └── ADC   (Vadc = Vin · R2 / (R1 + R2))
//! ```

use crate::config::{DividerConfig, DividerRounding};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageDivider {
    ratio: f64,
    rounding: DividerRounding,
}

impl VoltageDivider {
    /// `None` if the divider has no leg to ground.
    pub fn new(cfg: DividerConfig, rounding: DividerRounding) -> Option<Self> {
        let total = cfg.r1_ohm as f64 + cfg.r2_ohm as f64;
        if cfg.r2_ohm == 0 || total == 0.0 {
            return None;
        }
        Some(Self {
            ratio: cfg.r2_ohm as f64 / total,
            rounding,
        })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Upstream voltage for a pin-side reading, in mV.
    pub fn correct(&self, measured_mv: u32) -> u32 {
        let actual = measured_mv as f64 / self.ratio;
        let rounded = match self.rounding {
            DividerRounding::Unit => actual.round(),
            DividerRounding::Tens => (actual / 10.0).round() * 10.0,
        };
        rounded.min(u32::MAX as f64) as u32
    }
}
