//! Fixed-capacity smoothing window.
//!
//! Starts zero-filled; the mean always divides by the full window length,
//! so a fresh channel ramps up over its first `len` samples.

use heapless::Vec;

use crate::config::MAX_HISTORY_LEN;
use crate::pressure::quantize;

pub struct PressureHistory {
    slots: Vec<u32, MAX_HISTORY_LEN>,
    next: usize,
}

impl PressureHistory {
    /// `None` if `len` is zero or exceeds [`MAX_HISTORY_LEN`].
    pub fn new(len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let mut slots = Vec::new();
        slots.resize(len, 0).ok()?;
        Some(Self { slots, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Overwrite the oldest slot.
    pub fn push(&mut self, sample_pa: u32) {
        self.slots[self.next] = sample_pa;
        self.next = (self.next + 1) % self.slots.len();
    }

    /// Window mean, quantized to the pressure step.
    pub fn mean(&self) -> u32 {
        let sum: u64 = self.slots.iter().map(|&s| s as u64).sum();
        quantize(sum as f64 / self.slots.len() as f64)
    }

    pub fn samples(&self) -> &[u32] {
        &self.slots
    }
}
