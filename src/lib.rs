//! PressControl firmware library.
//!
//! Exposes the acquisition, calibration, relay-control, and notification
//! modules for integration testing.  All ESP-IDF-specific code is guarded
//! by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod calibration;
pub mod config;
pub mod error;
pub mod events;
pub mod pressure;
pub mod tasks;

pub mod pins;

// Adapters and drivers carry cfg-gated hardware code with host twins.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;
