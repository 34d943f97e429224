//! Fuzz target: relay controller input sequences
//!
//! Each input byte pair is either a pressure reading on the monitored
//! channel or a clock advance.  Verifies:
//! - The relay never switches ON unless the last reading was under the low mark
//! - The relay is never ON for `max_on_ms` or longer once due deadlines fire
//!
//! cargo fuzz run fuzz_relay_inputs

#![no_main]

use libfuzzer_sys::fuzz_target;
use presscontrol::app::events::AppEvent;
use presscontrol::app::ports::{ActuatorPort, EventSink, RelayState};
use presscontrol::config::SystemConfig;
use presscontrol::control::relay::{RelayController, RelayInput};
use presscontrol::error::ActuatorError;
use presscontrol::pressure::{PressureEvent, PressureValue};

struct Nop;

impl ActuatorPort for Nop {
    fn actuate(&mut self, _: u8, _: RelayState) -> Result<(), ActuatorError> {
        Ok(())
    }
}

impl EventSink for Nop {
    fn emit(&mut self, _: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let cfg = SystemConfig::default().relay;
    let mut ctl = RelayController::new(cfg);
    let (mut hw, mut sink) = (Nop, Nop);

    let mut now = 0u64;
    let mut last_pa: Option<u32> = None;
    let mut on_since = 0u64;

    for pair in data.chunks_exact(2) {
        let arg = pair[1] as u32;
        let switched = if pair[0] & 1 == 0 {
            // 0..=1_275_000 Pa in 5 kPa steps; tag 0xFE sends an overload.
            let pressure = if pair[0] == 0xFE {
                PressureValue::SensorOverload
            } else {
                last_pa = Some(arg * 5000);
                PressureValue::Pascals(arg * 5000)
            };
            let ev = PressureEvent { channel: 0, pressure };
            ctl.handle(RelayInput::Pressure(ev), now, &mut hw, &mut sink)
        } else {
            now += arg as u64 * 5000;
            let mut s = None;
            while let Some(d) = ctl.next_deadline_ms().filter(|&d| d <= now) {
                let fired = ctl.poll_timer(d, &mut hw, &mut sink);
                if fired == Some(RelayState::On) {
                    on_since = d;
                }
                s = fired.or(s);
                if ctl.next_deadline_ms() == Some(d) {
                    break;
                }
            }
            s
        };

        if switched == Some(RelayState::On) {
            assert!(last_pa.is_some_and(|pa| pa < cfg.low_mark_pa));
            if pair[0] & 1 == 0 {
                on_since = now;
            }
        }
        if ctl.state() == RelayState::On {
            assert!(now - on_since < cfg.max_on_ms);
        }
    }
});
