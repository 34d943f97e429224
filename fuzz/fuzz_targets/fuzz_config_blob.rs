//! Fuzz target: stored config blob
//!
//! Decodes arbitrary bytes the way the NVS adapter does and verifies:
//! - No panics on corrupt or truncated blobs
//! - Any blob that passes `validate` builds an `AcquisitionManager`
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use presscontrol::app::ports::{StorageError, StoragePort};
use presscontrol::config::SystemConfig;
use presscontrol::sensors::AcquisitionManager;

struct Empty;

impl StoragePort for Empty {
    fn read_i64(&self, _: &str, _: &str) -> Result<i64, StorageError> {
        Err(StorageError::NotFound)
    }

    fn write_i64(&mut self, _: &str, _: &str, _: i64) -> Result<(), StorageError> {
        Ok(())
    }
}

const HW: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 8];

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = postcard::from_bytes::<SystemConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    let mgr = AcquisitionManager::new(&cfg, 7, &HW, &Empty);
    assert!(mgr.is_ok(), "validated config rejected: {:?}", cfg);
    assert_eq!(mgr.map(|m| m.channel_count()).unwrap_or(0), cfg.channel_count as usize);
});
