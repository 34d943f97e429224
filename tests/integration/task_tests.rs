//! Full task set on the host executor with mock adapters.

use std::time::Duration;

use async_io_mini::Timer;
use edge_executor::LocalExecutor;

use presscontrol::app::events::AppEvent;
use presscontrol::app::ports::RelayState;
use presscontrol::app::service::MonitorService;
use presscontrol::config::{RelayConfig, SystemConfig};
use presscontrol::events::NotificationFabric;
use presscontrol::pressure::PressureValue;
use presscontrol::sensors::AcquisitionManager;
use presscontrol::tasks::{self, Ports, TASK_SLOTS};

use crate::mock_hw::{
    HW_CHANNELS, ManualClock, MockRelays, MockSampler, MockStore, REF_HW, RecordingSink,
    plain_config,
};

fn fast_config() -> SystemConfig {
    let base = plain_config();
    SystemConfig {
        cycle_period_ms: 10,
        publish_timeout_ms: 5,
        relay: RelayConfig {
            startup_delay_ms: 0,
            ..base.relay
        },
        ..base
    }
}

#[test]
fn tasks_acquire_publish_and_switch_relay() {
    let cfg = fast_config();
    let store = MockStore::new();
    let sampler = MockSampler::new();
    let relays = MockRelays::new();
    let sink = RecordingSink::new();

    sampler.set_reference(5000);
    // ch0: 30 kPa, below the low mark. ch1: 600 kPa.
    sampler.set_channel(0, 600);
    sampler.set_channel(1, 2500);

    let fabric = NotificationFabric::new();
    let manager =
        AcquisitionManager::new(&cfg, REF_HW, &HW_CHANNELS, &store).expect("valid config");
    let executor: LocalExecutor<'_, TASK_SLOTS> = LocalExecutor::new();

    tasks::spawn(
        &executor,
        &cfg,
        manager,
        Ports {
            sampler: sampler.clone(),
            storage: store.clone(),
            actuator: relays.clone(),
            sink: sink.clone(),
            clock: ManualClock::default(),
        },
        &fabric,
    );
    futures_lite::future::block_on(executor.run(Timer::after(Duration::from_millis(300))));

    let svc = MonitorService::new(&fabric);
    assert_eq!(svc.get_pressure(0), PressureValue::Pascals(30_000));
    assert_eq!(svc.get_pressure(1), PressureValue::Pascals(600_000));
    assert_eq!(svc.get_pressure(2), PressureValue::SensorAbsent);
    assert!(fabric.reference().cycle > 5);

    assert_eq!(svc.get_relay_state(), RelayState::On);
    assert_eq!(relays.last(), Some((0, RelayState::On)));

    assert_eq!(
        sink.events.borrow().first(),
        Some(&AppEvent::Started { channels: 5 })
    );
    assert!(sink.count(|e| matches!(e, AppEvent::PressureChanged(_))) > 0);
}

#[test]
fn calibration_request_reaches_running_channel() {
    let cfg = SystemConfig {
        history_len: 1,
        ..fast_config()
    };
    let store = MockStore::new();
    let sampler = MockSampler::new();
    let sink = RecordingSink::new();

    sampler.set_reference(5000);
    sampler.set_channel(3, 520);

    let fabric = NotificationFabric::new();
    let manager =
        AcquisitionManager::new(&cfg, REF_HW, &HW_CHANNELS, &store).expect("valid config");
    let executor: LocalExecutor<'_, TASK_SLOTS> = LocalExecutor::new();

    tasks::spawn(
        &executor,
        &cfg,
        manager,
        Ports {
            sampler: sampler.clone(),
            storage: store.clone(),
            actuator: MockRelays::new(),
            sink: sink.clone(),
            clock: ManualClock::default(),
        },
        &fabric,
    );

    let svc = MonitorService::new(&fabric);
    futures_lite::future::block_on(executor.run(async {
        Timer::after(Duration::from_millis(50)).await;
        assert_eq!(svc.get_pressure(3), PressureValue::Pascals(6000));
        assert!(svc.request_calibration(3));
        Timer::after(Duration::from_millis(50)).await;
    }));

    assert_eq!(svc.get_pressure(3), PressureValue::Pascals(0));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Calibrated { channel: 3, .. })),
        1
    );
    assert!(
        store
            .get(
                presscontrol::calibration::NAMESPACE,
                &presscontrol::calibration::shift_key(3)
            )
            .is_some()
    );
}

fn run_with_startup_delay(channel0_mv: u32) -> (NotificationFabric, MockRelays) {
    let base = fast_config();
    let cfg = SystemConfig {
        relay: RelayConfig {
            startup_delay_ms: 100,
            ..base.relay
        },
        ..base
    };
    let store = MockStore::new();
    let sampler = MockSampler::new();
    let relays = MockRelays::new();
    sampler.set_reference(5000);
    sampler.set_channel(0, channel0_mv);

    let fabric = NotificationFabric::new();
    {
        let manager =
            AcquisitionManager::new(&cfg, REF_HW, &HW_CHANNELS, &store).expect("valid config");
        let executor: LocalExecutor<'_, TASK_SLOTS> = LocalExecutor::new();
        tasks::spawn(
            &executor,
            &cfg,
            manager,
            Ports {
                sampler,
                storage: store,
                actuator: relays.clone(),
                sink: RecordingSink::new(),
                clock: ManualClock::default(),
            },
            &fabric,
        );
        futures_lite::future::block_on(executor.run(Timer::after(Duration::from_millis(600))));
    }
    (fabric, relays)
}

#[test]
fn pressure_settled_during_startup_delay_switches_relay_on() {
    // 30 kPa, settled long before the relay task starts listening.
    let (fabric, relays) = run_with_startup_delay(600);
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(30_000));
    assert_eq!(fabric.get_relay_state(), RelayState::On);
    assert_eq!(relays.last(), Some((0, RelayState::On)));
}

#[test]
fn pressure_settled_above_low_mark_keeps_relay_off() {
    // 600 kPa
    let (fabric, relays) = run_with_startup_delay(2500);
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(600_000));
    assert_eq!(fabric.get_relay_state(), RelayState::Off);
    assert_eq!(relays.count(), 0);
}
