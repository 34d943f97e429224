//! Outbound application events.
//!
//! The acquisition tasks and the relay controller emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, refresh a display,
//! etc.

use crate::pressure::PressureEvent;

use super::ports::RelayState;

/// Structured events emitted by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Tasks are running (carries the live channel count).
    Started { channels: u8 },

    /// A channel's reported pressure changed.
    PressureChanged(PressureEvent),

    /// A relay output was driven.
    RelaySwitched { output: u8, state: RelayState },

    /// A channel adopted a new calibration shift.
    Calibrated { channel: u8, shift: f64 },
}
