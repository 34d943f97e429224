//! Acquisition cycle tests: band mapping, sentinels, smoothing, calibration.

use presscontrol::app::service::MonitorService;
use presscontrol::calibration::{self, NAMESPACE};
use presscontrol::config::{ShiftPolicy, SystemConfig};
use presscontrol::events::NotificationFabric;
use presscontrol::pressure::{PressureEvent, PressureValue};
use presscontrol::sensors::AcquisitionManager;
use presscontrol::sensors::channel::ChannelOutput;

use crate::mock_hw::{HW_CHANNELS, MockSampler, MockStore, REF_HW, plain_config};

const REF_MV: u32 = 5000;

fn manager(cfg: &SystemConfig, store: &MockStore) -> AcquisitionManager {
    AcquisitionManager::new(cfg, REF_HW, &HW_CHANNELS, store).expect("valid config")
}

fn changed(outputs: &[ChannelOutput]) -> Vec<PressureEvent> {
    outputs
        .iter()
        .filter_map(|o| match o {
            ChannelOutput::Changed(ev) => Some(*ev),
            _ => None,
        })
        .collect()
}

// ── Band mapping ──────────────────────────────────────────────

#[test]
fn band_edges_map_to_zero_and_full_scale() {
    let cfg = SystemConfig {
        history_len: 1,
        ..plain_config()
    };
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    // Band is 500..4500 mV.
    sampler.set_channel(0, 500);
    sampler.set_channel(1, 4500);
    sampler.set_channel(2, 4501);
    sampler.set_channel(3, 2500);
    sampler.set_channel(4, 499);

    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);

    let svc = MonitorService::new(&fabric);
    assert_eq!(svc.get_pressure(0), PressureValue::Pascals(0));
    assert_eq!(svc.get_pressure(1), PressureValue::Pascals(1_200_000));
    assert_eq!(svc.get_pressure(2), PressureValue::SensorOverload);
    assert_eq!(svc.get_pressure(3), PressureValue::Pascals(600_000));
    assert_eq!(svc.get_pressure(4), PressureValue::Pascals(0));
}

#[test]
fn divided_inputs_are_corrected_before_mapping() {
    let cfg = SystemConfig {
        history_len: 1,
        ..SystemConfig::default()
    };
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    // 1640/1430 reference divider: 2330 -> 5000 mV.
    // 1130/2640 input divider: 2330 -> 3330 mV.
    sampler.set_reference(2330);
    sampler.set_channel(0, 2330);

    let (snap, _) = mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(snap.millivolts, 5000);
    // (3330 - 500) / 4000 of full scale
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(849_000));
}

// ── Sentinels ─────────────────────────────────────────────────

#[test]
fn absent_wins_over_reference_error() {
    let cfg = plain_config();
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(0);
    sampler.set_channel(1, 2500);

    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(fabric.get_pressure(0), PressureValue::SensorAbsent);
    assert_eq!(fabric.get_pressure(1), PressureValue::ReferencePowerError);
}

#[test]
fn reference_read_failure_reports_power_error() {
    let cfg = plain_config();
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.fail(REF_HW);
    sampler.set_channel(0, 2500);

    let (snap, _) = mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(snap.millivolts, 0);
    assert_eq!(fabric.get_pressure(0), PressureValue::ReferencePowerError);
}

#[test]
fn overload_is_not_folded_into_history() {
    let cfg = plain_config();
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 2500);
    for _ in 0..cfg.history_len {
        mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    }
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(600_000));

    sampler.set_channel(0, 4700);
    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(fabric.get_pressure(0), PressureValue::SensorOverload);
    assert!(
        mgr.channel(0)
            .map(|p| p.history().samples().iter().all(|&s| s == 600_000))
            .unwrap_or(false)
    );

    // Back in band: the window still holds only the earlier samples.
    sampler.set_channel(0, 2500);
    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(600_000));
}

#[test]
fn channels_in_one_cycle_do_not_interfere() {
    let cfg = SystemConfig {
        history_len: 1,
        ..plain_config()
    };
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 0);
    sampler.set_channel(1, 4800);
    sampler.set_channel(2, 1500);

    let (_, outputs) = mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    let events = changed(&outputs);

    // ch0 stays ABSENT (its initial value), so it does not report.
    assert!(events.iter().all(|e| e.channel != 0));
    assert!(events.contains(&PressureEvent {
        channel: 1,
        pressure: PressureValue::SensorOverload,
    }));
    assert!(events.contains(&PressureEvent {
        channel: 2,
        pressure: PressureValue::Pascals(300_000),
    }));
    assert_eq!(fabric.get_pressure(0), PressureValue::SensorAbsent);
}

// ── Smoothing ─────────────────────────────────────────────────

#[test]
fn constant_input_settles_after_full_window() {
    let cfg = SystemConfig {
        history_len: 25,
        channel_count: 1,
        ..plain_config()
    };
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 2500);

    let mut last = 0;
    for cycle in 1..=25u32 {
        mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
        let pa = fabric.get_pressure(0).pascals().unwrap_or(0);
        assert!(pa >= last, "mean must rise while the window fills");
        if cycle < 25 {
            assert!(pa < 600_000);
        }
        last = pa;
    }
    assert_eq!(last, 600_000);

    // Settled: no further change events.
    for _ in 0..10 {
        let (_, outputs) = mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
        assert!(changed(&outputs).is_empty());
    }
}

#[test]
fn first_sample_is_diluted_by_zero_filled_window() {
    let cfg = plain_config();
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 2500);
    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);

    // 600 000 / 5
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(120_000));
}

// ── Calibration ───────────────────────────────────────────────

#[test]
fn calibration_request_shifts_band_and_persists() {
    let cfg = SystemConfig {
        history_len: 1,
        ..plain_config()
    };
    let mut store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);
    let svc = MonitorService::new(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 520);

    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(svc.get_pressure(0), PressureValue::Pascals(6000));

    assert!(svc.request_calibration(0));
    let (_, outputs) = mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);

    let shift = outputs
        .iter()
        .find_map(|o| match o {
            ChannelOutput::Calibrated { channel: 0, shift } => Some(*shift),
            _ => None,
        })
        .expect("calibration output");
    assert!((shift - 1.04).abs() < 1e-9);

    let stored = store
        .get(NAMESPACE, &calibration::shift_key(0))
        .expect("shift persisted");
    assert!((calibration::decode_shift(stored) - 1.04).abs() < 1e-9);

    // The same voltage is now the band floor.
    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(svc.get_pressure(0), PressureValue::Pascals(0));
}

#[test]
fn persisted_shift_is_loaded_at_startup() {
    let cfg = SystemConfig {
        history_len: 1,
        ..plain_config()
    };
    let mut store = MockStore::new();
    store.map.borrow_mut().insert(
        format!("{}::{}", NAMESPACE, calibration::shift_key(2)),
        calibration::encode_shift(1.04),
    );
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    assert!(mgr.channel(2).map(|p| (p.shift() - 1.04).abs() < 1e-9).unwrap_or(false));
    assert_eq!(mgr.channel(1).map(|p| p.shift()), Some(1.0));

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(2, 520);
    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);
    assert_eq!(fabric.get_pressure(2), PressureValue::Pascals(0));
}

#[test]
fn calibration_for_inactive_channel_is_ignored() {
    let cfg = plain_config();
    let store = MockStore::new();
    let fabric = NotificationFabric::new();
    let mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let svc = MonitorService::new(&fabric);
    assert!(!svc.request_calibration(cfg.channel_count));
    assert!(!svc.request_calibration(200));
}

#[test]
fn disabled_shift_policy_ignores_stored_and_requested_shifts() {
    let cfg = SystemConfig {
        history_len: 1,
        shift_policy: ShiftPolicy::Disabled,
        ..plain_config()
    };
    let mut store = MockStore::new();
    store.map.borrow_mut().insert(
        format!("{}::{}", NAMESPACE, calibration::shift_key(0)),
        calibration::encode_shift(1.5),
    );
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);
    assert_eq!(mgr.channel(0).map(|p| p.shift()), Some(1.0));

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 520);
    assert!(fabric.request_calibration(0));
    let (_, outputs) = mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);

    assert!(
        !outputs
            .iter()
            .any(|o| matches!(o, ChannelOutput::Calibrated { .. }))
    );
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(6000));
}

#[test]
fn failed_shift_write_keeps_shift_in_memory() {
    let cfg = SystemConfig {
        history_len: 1,
        ..plain_config()
    };
    let mut store = MockStore::new();
    store.fail_writes.set(true);
    let fabric = NotificationFabric::new();
    let mut mgr = manager(&cfg, &store);
    mgr.register(&fabric);

    let sampler = MockSampler::new();
    sampler.set_reference(REF_MV);
    sampler.set_channel(0, 520);
    assert!(fabric.request_calibration(0));
    mgr.run_cycle(&mut sampler.clone(), &mut store, &fabric);

    assert!(store.get(NAMESPACE, &calibration::shift_key(0)).is_none());
    assert!(mgr.channel(0).map(|p| p.shift() > 1.0).unwrap_or(false));
    assert_eq!(fabric.get_pressure(0), PressureValue::Pascals(0));
}

// ── Construction ──────────────────────────────────────────────

#[test]
fn invalid_config_is_rejected() {
    let store = MockStore::new();
    let cfg = SystemConfig {
        channel_count: 0,
        ..plain_config()
    };
    assert!(AcquisitionManager::new(&cfg, REF_HW, &HW_CHANNELS, &store).is_err());
}

#[test]
fn short_channel_map_is_rejected() {
    let store = MockStore::new();
    let cfg = plain_config();
    assert!(AcquisitionManager::new(&cfg, REF_HW, &HW_CHANNELS[..3], &store).is_err());
}
