//! Monitor service — the collaborator-facing surface of the core.
//!
//! ```text
//!  display / telemetry ──▶ get_pressure, get_relay_state ─┐
//!                                                          ├─▶ NotificationFabric
//!  button long-press   ──▶ request_calibration ───────────┘
//! ```
//!
//! All calls are non-blocking.  Reads come from the fabric's atomic board;
//! calibration requests are queued to the owning channel's inbox.

use log::info;

use crate::events::NotificationFabric;
use crate::pressure::PressureValue;

use super::ports::RelayState;

#[derive(Clone, Copy)]
pub struct MonitorService<'a> {
    fabric: &'a NotificationFabric,
}

impl<'a> MonitorService<'a> {
    pub fn new(fabric: &'a NotificationFabric) -> Self {
        Self { fabric }
    }

    /// Latest reported value for a channel.
    pub fn get_pressure(&self, channel: u8) -> PressureValue {
        self.fabric.get_pressure(channel)
    }

    pub fn get_relay_state(&self) -> RelayState {
        self.fabric.get_relay_state()
    }

    /// Ask a channel to recalibrate on its next wake-up.
    ///
    /// Returns `false` if the channel is not live or already has a full
    /// inbox.
    pub fn request_calibration(&self, channel: u8) -> bool {
        let queued = self.fabric.request_calibration(channel);
        if queued {
            info!("service: calibration queued for ch{}", channel);
        }
        queued
    }
}
