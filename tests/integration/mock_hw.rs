//! Mock adapters for integration tests.
//!
//! Each mock keeps its observable state behind `Rc<RefCell<_>>` so a test
//! can hand the mock to the task set and still inspect it afterwards.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use presscontrol::app::events::AppEvent;
use presscontrol::app::ports::{
    ActuatorPort, Clock, EventSink, RelayState, StorageError, StoragePort, VoltageSampler,
};
use presscontrol::config::{DividerConfig, DividerRounding, SystemConfig};
use presscontrol::error::{ActuatorError, SensorError};

pub const REF_HW: u8 = 7;
pub const HW_CHANNELS: [u8; 5] = [0, 3, 4, 5, 6];

/// Config with pass-through dividers so voltages in tests are "actual" mV.
pub fn plain_config() -> SystemConfig {
    let unity = DividerConfig {
        r1_ohm: 0,
        r2_ohm: 1000,
    };
    SystemConfig {
        reference_divider: unity,
        input_divider: unity,
        divider_rounding: DividerRounding::Unit,
        ..Default::default()
    }
}

// ── MockSampler ───────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSampler {
    volts: Rc<RefCell<HashMap<u8, u32>>>,
    failing: Rc<RefCell<Vec<u8>>>,
}

#[allow(dead_code)]
impl MockSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, hw_channel: u8, millivolts: u32) {
        self.volts.borrow_mut().insert(hw_channel, millivolts);
    }

    pub fn set_reference(&self, millivolts: u32) {
        self.set(REF_HW, millivolts);
    }

    /// Set the voltage of pressure channel `index`.
    pub fn set_channel(&self, index: usize, millivolts: u32) {
        self.set(HW_CHANNELS[index], millivolts);
    }

    pub fn fail(&self, hw_channel: u8) {
        self.failing.borrow_mut().push(hw_channel);
    }
}

impl VoltageSampler for MockSampler {
    fn sample_voltage(&mut self, hw_channel: u8) -> Result<u32, SensorError> {
        if self.failing.borrow().contains(&hw_channel) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.volts.borrow().get(&hw_channel).copied().unwrap_or(0))
    }
}

// ── MockRelays ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockRelays {
    pub calls: Rc<RefCell<Vec<(u8, RelayState)>>>,
}

#[allow(dead_code)]
impl MockRelays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<(u8, RelayState)> {
        self.calls.borrow().last().copied()
    }

    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ActuatorPort for MockRelays {
    fn actuate(&mut self, output: u8, state: RelayState) -> Result<(), ActuatorError> {
        if output > 1 {
            return Err(ActuatorError::UnknownOutput(output));
        }
        self.calls.borrow_mut().push((output, state));
        Ok(())
    }
}

// ── MockStore ─────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockStore {
    pub map: Rc<RefCell<HashMap<String, i64>>>,
    pub fail_writes: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<i64> {
        self.map.borrow().get(&format!("{}::{}", namespace, key)).copied()
    }
}

impl StoragePort for MockStore {
    fn read_i64(&self, namespace: &str, key: &str) -> Result<i64, StorageError> {
        self.get(namespace, key).ok_or(StorageError::NotFound)
    }

    fn write_i64(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::IoError);
        }
        self.map
            .borrow_mut()
            .insert(format!("{}::{}", namespace, key), value);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ManualClock(pub Rc<Cell<u64>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
