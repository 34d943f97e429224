//! Pump relay controller.
//!
//! Hysteresis on one pressure channel plus two dwell guards:
//!
//! ```text
//!            UNDER_LOW ∧ MIN_OFF_EXCEEDED
//!   ┌─────┐ ───────────────────────────▶ ┌────┐
//!   │ OFF │                               │ ON │  arms MaxOn watchdog
//!   └─────┘ ◀─────────────────────────── └────┘
//!   arms MinOff   MAX_ON_EXCEEDED
//!   watchdog      ∨ (MIN_OFF_EXCEEDED ∧ ¬UNDER_LOW)
//!                 ∨ ABOVE_HIGH
//! ```
//!
//! Condition flags live in one bitmask.  Any flag change re-runs the ON
//! check and then the OFF check, in that order.

use log::{debug, error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink, RelayState};
use crate::config::RelayConfig;
use crate::pressure::PressureEvent;

use super::timer::{OneShotTimer, TimerId, Watchdog};

pub const PRESSURE_UNDER_LOW: u8 = 0x01;
pub const PRESSURE_ABOVE_HIGH: u8 = 0x02;
pub const MAX_ON_EXCEEDED: u8 = 0x04;
pub const MIN_OFF_EXCEEDED: u8 = 0x08;
pub const RELAY_ON: u8 = 0x10;

/// Something the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayInput {
    Pressure(PressureEvent),
    TimerFired(TimerId),
}

pub struct RelayController {
    cfg: RelayConfig,
    flags: u8,
    timer: OneShotTimer,
}

impl RelayController {
    pub fn new(cfg: RelayConfig) -> Self {
        Self {
            cfg,
            // Safe to switch on as soon as pressure drops.
            flags: MIN_OFF_EXCEEDED,
            timer: OneShotTimer::new(),
        }
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn state(&self) -> RelayState {
        if self.flags & RELAY_ON != 0 {
            RelayState::On
        } else {
            RelayState::Off
        }
    }

    pub fn monitored_channel(&self) -> u8 {
        self.cfg.monitored_channel
    }

    /// Deadline of the armed watchdog, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.timer.deadline_ms()
    }

    /// Armed watchdog whose deadline has passed.
    pub fn due_timer(&self, now_ms: u64) -> Option<TimerId> {
        self.timer.due(now_ms)
    }

    /// Apply one input.  Returns the new relay state if it switched.
    pub fn handle(
        &mut self,
        input: RelayInput,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Option<RelayState> {
        let before = self.flags;
        match input {
            RelayInput::Pressure(ev) => self.on_pressure(ev),
            RelayInput::TimerFired(id) => match self.timer.fire(id) {
                Some(Watchdog::MaxOn) => {
                    self.flags |= MAX_ON_EXCEEDED;
                    self.flags &= !MIN_OFF_EXCEEDED;
                }
                Some(Watchdog::MinOff) => self.flags |= MIN_OFF_EXCEEDED,
                None => debug!("relay: stale {:?} expiry discarded", id.kind),
            },
        }

        if self.flags == before {
            return None;
        }
        debug!("relay: flags 0b{:05b} -> 0b{:05b}", before, self.flags);
        self.evaluate(now_ms, hw, sink)
    }

    /// Fire the watchdog if due.  Convenience for polling loops.
    pub fn poll_timer(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Option<RelayState> {
        let id = self.timer.due(now_ms)?;
        self.handle(RelayInput::TimerFired(id), now_ms, hw, sink)
    }

    fn on_pressure(&mut self, ev: PressureEvent) {
        if ev.channel != self.cfg.monitored_channel {
            return;
        }
        let Some(pa) = ev.pressure.pascals() else {
            return;
        };
        set_flag(&mut self.flags, PRESSURE_UNDER_LOW, pa < self.cfg.low_mark_pa);
        set_flag(&mut self.flags, PRESSURE_ABOVE_HIGH, pa > self.cfg.high_mark_pa);
    }

    fn evaluate(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Option<RelayState> {
        let mut switched = None;
        let f = self.flags;

        if f & RELAY_ON == 0 && f & PRESSURE_UNDER_LOW != 0 && f & MIN_OFF_EXCEEDED != 0 {
            info!("relay: turning ON");
            self.flags &= !(MAX_ON_EXCEEDED | MIN_OFF_EXCEEDED);
            self.drive(RelayState::On, hw, sink);
            self.flags |= RELAY_ON;
            self.timer.arm(Watchdog::MaxOn, now_ms, self.cfg.max_on_ms);
            switched = Some(RelayState::On);
        }

        let f = self.flags;
        let off_wanted = f & MAX_ON_EXCEEDED != 0
            || (f & MIN_OFF_EXCEEDED != 0 && f & PRESSURE_UNDER_LOW == 0)
            || f & PRESSURE_ABOVE_HIGH != 0;
        if f & RELAY_ON != 0 && off_wanted {
            info!("relay: turning OFF");
            self.flags &= !MAX_ON_EXCEEDED;
            self.drive(RelayState::Off, hw, sink);
            self.flags &= !RELAY_ON;
            self.timer.arm(Watchdog::MinOff, now_ms, self.cfg.min_off_ms);
            switched = Some(RelayState::Off);
        }

        switched
    }

    fn drive(&self, state: RelayState, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let output = self.cfg.output;
        if let Err(e) = hw.actuate(output, state) {
            error!("relay: output {} -> {:?} failed: {}", output, state, e);
        }
        sink.emit(&AppEvent::RelaySwitched { output, state });
    }
}

fn set_flag(flags: &mut u8, mask: u8, on: bool) {
    if on {
        *flags |= mask;
    } else {
        *flags &= !mask;
    }
}
