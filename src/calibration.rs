//! Per-channel calibration shift persistence.
//!
//! A shift is a multiplicative correction (default 1.0) stored as a
//! fixed-point `i64` scaled by 10^15 under `calibration/ch{n}_shift`.

use core::fmt::Write as _;

use heapless::String;
use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

pub const NAMESPACE: &str = "calibration";

/// Fixed-point scale for persisted shifts.
pub const SHIFT_SCALE: f64 = 1e15;

pub const DEFAULT_SHIFT: f64 = 1.0;

/// NVS keys are limited to 15 characters.
pub type ShiftKey = String<15>;

pub fn shift_key(channel: u8) -> ShiftKey {
    let mut key = ShiftKey::new();
    // "ch255_shift" is 11 chars, always fits.
    let _ = write!(key, "ch{}_shift", channel);
    key
}

pub fn encode_shift(shift: f64) -> i64 {
    (shift * SHIFT_SCALE) as i64
}

pub fn decode_shift(raw: i64) -> f64 {
    raw as f64 / SHIFT_SCALE
}

/// Reads and writes calibration shifts through a [`StoragePort`].
#[derive(Debug, Clone, Copy)]
pub struct CalibrationStore {
    namespace: &'static str,
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationStore {
    pub const fn new() -> Self {
        Self {
            namespace: NAMESPACE,
        }
    }

    /// Persisted shift for `channel`, or 1.0 if never set or unreadable.
    pub fn get(&self, storage: &impl StoragePort, channel: u8) -> f64 {
        let key = shift_key(channel);
        let raw = storage.read_i64_or(self.namespace, &key, encode_shift(DEFAULT_SHIFT));
        let shift = decode_shift(raw);
        if shift.is_finite() && shift > 0.0 {
            shift
        } else {
            warn!("calibration: ch{} stored shift {} invalid, using 1.0", channel, shift);
            DEFAULT_SHIFT
        }
    }

    /// Persist `shift` for `channel`.  The backend commits atomically.
    pub fn set(
        &self,
        storage: &mut impl StoragePort,
        channel: u8,
        shift: f64,
    ) -> Result<(), StorageError> {
        let key = shift_key(channel);
        storage.write_i64(self.namespace, &key, encode_shift(shift))?;
        info!("calibration: ch{} shift {:.6} saved", channel, shift);
        Ok(())
    }
}
