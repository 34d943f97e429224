//! Relay control — the hysteresis/dwell state machine and its watchdog.

pub mod relay;
pub mod timer;
