//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  This is also the
//! display consumer's hook: a screen driver would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { channels } => {
                info!("START | channels={}", channels);
            }
            AppEvent::PressureChanged(ev) => {
                info!("PRESS | ch{} = {}", ev.channel, ev.pressure);
            }
            AppEvent::RelaySwitched { output, state } => {
                info!("RELAY | out{} -> {:?}", output, state);
            }
            AppEvent::Calibrated { channel, shift } => {
                info!("CALIB | ch{} shift={:.6}", channel, shift);
            }
        }
    }
}
