//! Pressure value domain.
//!
//! Real readings occupy `[0, max_pressure_pa]` Pascals.  Three sentinel
//! states sit below zero so a single `i32` can carry either:
//!
//! | Raw  | Meaning                 |
//! |------|-------------------------|
//! | -128 | reference power error   |
//! | -127 | sensor absent           |
//! | -126 | sensor overload         |

use core::fmt;

/// Lower edge of the live voltage band, as a fraction of the reference.
pub const MIN_BAND: f64 = 0.10;
/// Upper edge of the live voltage band, as a fraction of the reference.
pub const MAX_BAND: f64 = 0.90;

/// Pressure quantum (Pa).  Every reported value is a multiple of this.
pub const QUANTUM_PA: u32 = 1000;

pub const RAW_REFERENCE_POWER_ERROR: i32 = -128;
pub const RAW_SENSOR_ABSENT: i32 = -127;
pub const RAW_SENSOR_OVERLOAD: i32 = -126;

/// A reported channel pressure: a measurement or a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureValue {
    Pascals(u32),
    ReferencePowerError,
    SensorAbsent,
    SensorOverload,
}

impl PressureValue {
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Pascals(pa) => pa.min(i32::MAX as u32) as i32,
            Self::ReferencePowerError => RAW_REFERENCE_POWER_ERROR,
            Self::SensorAbsent => RAW_SENSOR_ABSENT,
            Self::SensorOverload => RAW_SENSOR_OVERLOAD,
        }
    }

    /// Decode a raw value.  Unknown negatives map to `SensorAbsent`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            RAW_REFERENCE_POWER_ERROR => Self::ReferencePowerError,
            RAW_SENSOR_OVERLOAD => Self::SensorOverload,
            r if r >= 0 => Self::Pascals(r as u32),
            _ => Self::SensorAbsent,
        }
    }

    pub fn is_measurement(self) -> bool {
        matches!(self, Self::Pascals(_))
    }

    pub fn pascals(self) -> Option<u32> {
        match self {
            Self::Pascals(pa) => Some(pa),
            _ => None,
        }
    }
}

impl fmt::Display for PressureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pascals(pa) => write!(f, "{pa} Pa"),
            Self::ReferencePowerError => write!(f, "REF-ERR"),
            Self::SensorAbsent => write!(f, "ABSENT"),
            Self::SensorOverload => write!(f, "OVERLOAD"),
        }
    }
}

/// "Pressure changed" notification payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureEvent {
    pub channel: u8,
    pub pressure: PressureValue,
}

/// Round to the nearest [`QUANTUM_PA`], halves away from zero.
pub fn quantize(pa: f64) -> u32 {
    if pa <= 0.0 {
        return 0;
    }
    let q = (pa / QUANTUM_PA as f64).round() * QUANTUM_PA as f64;
    q.min(u32::MAX as f64) as u32
}

/// Voltage band `(min, max)` in mV for a reference and calibration shift.
pub fn band(reference_mv: u32, shift: f64) -> (f64, f64) {
    let r = reference_mv as f64;
    (r * MIN_BAND * shift, r * MAX_BAND * shift)
}

/// Instantaneous (unsmoothed) sample for a voltage inside or below the band.
///
/// Callers handle overload first; a voltage above `max` clamps to
/// `max_pressure_pa`.  A degenerate band yields 0.
pub fn raw_sample(voltage_mv: u32, min_mv: f64, max_mv: f64, max_pressure_pa: u32) -> u32 {
    let v = voltage_mv as f64;
    if v < min_mv || max_mv <= min_mv {
        return 0;
    }
    let fraction = ((v - min_mv) / (max_mv - min_mv)).min(1.0);
    quantize(fraction * max_pressure_pa as f64)
}
