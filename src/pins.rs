//! ADC channel / GPIO assignments for the PressControl main board (ESP32).
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding channel numbers.

// ---------------------------------------------------------------------------
// Pressure transducers (ADC1, through the input divider)
// ---------------------------------------------------------------------------

/// ADC1 channel per pressure channel index.
pub const PRESSURE_ADC_CHANNELS: [u8; 5] = [0, 3, 4, 5, 6];

// ---------------------------------------------------------------------------
// Transducer supply reference (ADC1, through the reference divider)
// ---------------------------------------------------------------------------

pub const REFERENCE_ADC_CHANNEL: u8 = 7;

/// Every ADC1 channel configured at boot.
pub const ALL_ADC_CHANNELS: [u8; 6] = [0, 3, 4, 5, 6, REFERENCE_ADC_CHANNEL];

// ---------------------------------------------------------------------------
// ADC sampling
// ---------------------------------------------------------------------------

/// Raw conversions averaged per voltage sample.
pub const ADC_OVERSAMPLE: u32 = 128;
/// Averaged raw counts at or below this read as "no signal".
pub const ADC_NOISE_FLOOR: u32 = 200;
/// Full-scale raw count (12-bit).
pub const ADC_MAX_RAW: u32 = 4095;
/// Approximate full-scale voltage at 12 dB attenuation (host model only).
pub const ADC_FULL_SCALE_MV: u32 = 3300;

// ---------------------------------------------------------------------------
// Relay outputs (active HIGH through driver transistors)
// ---------------------------------------------------------------------------

pub const RELAY_GPIOS: [i32; 2] = [26, 27];
