//! PressControl Firmware — Main Entry Point
//!
//! Hexagonal architecture with an async, notification-driven core.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  AdcSampler        RelayBank       NvsAdapter     Esp32Time    │
//! │  (VoltageSampler)  (ActuatorPort)  (Config+NVS)   (Clock)      │
//! │  LogEventSink (EventSink)                                      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  ReferenceTracker · ChannelProcessor ×N                │    │
//! │  │  RelayController · NotificationFabric                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::gpio::{OutputPin as _, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use presscontrol::adapters::hardware::{AdcSampler, RelayBank};
use presscontrol::adapters::log_sink::LogEventSink;
use presscontrol::adapters::nvs::NvsAdapter;
use presscontrol::adapters::time::Esp32TimeAdapter;
use presscontrol::app::ports::ConfigPort;
use presscontrol::config::SystemConfig;
use presscontrol::drivers::hw_init;
use presscontrol::drivers::relay::RelayDriver;
use presscontrol::events::NotificationFabric;
use presscontrol::pins;
use presscontrol::sensors::AcquisitionManager;
use presscontrol::tasks::{self, Ports};

static FABRIC: NotificationFabric = NotificationFabric::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PressControl v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals().context("ADC init")?;

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let relay_a = PinDriver::output(peripherals.pins.gpio26.downgrade_output())?;
    let relay_b = PinDriver::output(peripherals.pins.gpio27.downgrade_output())?;
    info!("Relay outputs on GPIO {:?}", pins::RELAY_GPIOS);
    let relays = RelayBank::new([RelayDriver::new(relay_a)?, RelayDriver::new(relay_b)?]);

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let nvs = NvsAdapter::new()?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Acquisition ────────────────────────────────────────
    // History allocation failure is fatal here.
    let manager = AcquisitionManager::new(
        &config,
        pins::REFERENCE_ADC_CHANNEL,
        &pins::PRESSURE_ADC_CHANNELS,
        &nvs,
    )?;

    // ── 5. Run ────────────────────────────────────────────────
    info!("System ready. Starting tasks.");
    tasks::run(
        &config,
        manager,
        Ports {
            sampler: AdcSampler::new(),
            storage: nvs,
            actuator: relays,
            sink: LogEventSink::new(),
            clock: Esp32TimeAdapter::new(),
        },
        &FABRIC,
    );
    Ok(())
}
