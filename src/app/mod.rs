//! Application core boundary.
//!
//! Port traits in [`ports`] keep acquisition and relay control testable
//! without real peripherals; [`service`] is the read/command surface for
//! display and input collaborators.

pub mod events;
pub mod ports;
pub mod service;
