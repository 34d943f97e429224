//! One-shot ADC peripheral initialization.
//!
//! Configures ADC1 in oneshot mode for every pressure and reference channel
//! and creates the line-fitting calibration scheme used to turn raw counts
//! into millivolts.  Called once from `main()` before any task starts.
//!
//! On host builds the ADC is simulated: tests inject raw counts per channel
//! with [`sim_set_adc_raw`] and the conversion is a linear model.

use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::error::SensorError;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    AdcChannelConfigFailed { channel: u8, rc: i32 },
    CalibrationSchemeFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::AdcChannelConfigFailed { channel, rc } => {
                write!(f, "ADC1 channel {} config failed (rc={})", channel, rc)
            }
            Self::CalibrationSchemeFailed(rc) => {
                write!(f, "ADC calibration scheme failed (rc={})", rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

// ── Simulation ────────────────────────────────────────────────

static SIM_ADC_RAW: [AtomicU16; 8] = [const { AtomicU16::new(0) }; 8];

/// Inject a raw count for an ADC1 channel (host builds).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_raw(channel: u8, raw: u16) {
    if let Some(slot) = SIM_ADC_RAW.get(channel as usize) {
        slot.store(raw.min(pins::ADC_MAX_RAW as u16), Ordering::Relaxed);
    }
}

// ── Init ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut ADC1_CALI: adc_cali_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task runs; the handles
    // are only written here.
    unsafe { init_adc() }?;
    log::info!("hw_init: ADC1 configured for {} channels", pins::ALL_ADC_CHANNELS.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for &channel in &pins::ALL_ADC_CHANNELS {
        let ret = unsafe { adc_oneshot_config_channel(ADC1_HANDLE, channel as adc_channel_t, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcChannelConfigFailed { channel, rc: ret });
        }
    }

    let cali_cfg = adc_cali_line_fitting_config_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        ..Default::default()
    };
    let ret = unsafe { adc_cali_create_scheme_line_fitting(&cali_cfg, &raw mut ADC1_CALI) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::CalibrationSchemeFailed(ret));
    }
    Ok(())
}

// ── Reads ─────────────────────────────────────────────────────

fn check_channel(channel: u8) -> Result<(), SensorError> {
    if pins::ALL_ADC_CHANNELS.contains(&channel) {
        Ok(())
    } else {
        Err(SensorError::UnknownChannel(channel))
    }
}

/// One raw ADC1 conversion.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u8) -> Result<u16, SensorError> {
    check_channel(channel)?;
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once during init_adc() before any
    // task starts; the oneshot driver serialises conversions internally.
    let ret = unsafe { adc_oneshot_read(ADC1_HANDLE, channel as adc_channel_t, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u8) -> Result<u16, SensorError> {
    check_channel(channel)?;
    Ok(SIM_ADC_RAW[channel as usize].load(Ordering::Relaxed))
}

/// Raw count to millivolts through the calibration curve.
#[cfg(target_os = "espidf")]
pub fn adc1_raw_to_mv(raw: u32) -> Result<u32, SensorError> {
    let mut mv: i32 = 0;
    // SAFETY: ADC1_CALI is written once during init_adc().
    let ret = unsafe { adc_cali_raw_to_voltage(ADC1_CALI, raw as i32, &mut mv) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::ConversionFailed);
    }
    Ok(mv.max(0) as u32)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_raw_to_mv(raw: u32) -> Result<u32, SensorError> {
    Ok((raw.min(pins::ADC_MAX_RAW) * pins::ADC_FULL_SCALE_MV + pins::ADC_MAX_RAW / 2) / pins::ADC_MAX_RAW)
}
