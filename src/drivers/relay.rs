//! Relay output driver.
//!
//! One digital output per relay, active HIGH.  Generic over
//! [`embedded_hal::digital::OutputPin`] so the same driver runs on an
//! ESP-IDF `PinDriver` or a host test pin.
//!
//! ## Safety contract
//!
//! Dwell-time rules are enforced by the relay controller; this driver is
//! a dumb actuator.  It remembers the last commanded level so repeated
//! commands are cheap and idempotent.

use embedded_hal::digital::OutputPin;

use crate::app::ports::RelayState;
use crate::error::ActuatorError;

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    state: RelayState,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of `pin` and drive it LOW.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(Self {
            pin,
            state: RelayState::Off,
        })
    }

    pub fn set(&mut self, state: RelayState) -> Result<(), ActuatorError> {
        let result = match state {
            RelayState::On => self.pin.set_high(),
            RelayState::Off => self.pin.set_low(),
        };
        result.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = state;
        Ok(())
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }
}
