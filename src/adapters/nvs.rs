//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for PressControl.
//!
//! - Config is one postcard blob under `presscore/syscfg`, validated on
//!   both save and load.
//! - Calibration shifts and other scalars use native NVS `i64` entries.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Namespaces and keys are limited to 15 bytes (NVS limit).

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub const CONFIG_NAMESPACE: &str = "presscore";
pub const CONFIG_KEY: &str = "syscfg";

/// NVS name limit including the trailing NUL.
const NVS_NAME_BUF: usize = 16;

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

/// NUL-terminated copy of an NVS namespace or key.
fn nvs_name(name: &str) -> Result<[u8; NVS_NAME_BUF], StorageError> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() >= NVS_NAME_BUF || bytes.contains(&0) {
        return Err(StorageError::InvalidKey);
    }
    let mut buf = [0u8; NVS_NAME_BUF];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(buf)
}

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    ints: RefCell<HashMap<String, i64>>,
    #[cfg(not(target_os = "espidf"))]
    blobs: RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32 {
                    return Err(StorageError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK as i32 {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            ints: RefCell::new(HashMap::new()),
            #[cfg(not(target_os = "espidf"))]
            blobs: RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> Result<String, StorageError> {
        nvs_name(namespace)?;
        nvs_name(key)?;
        Ok(format!("{}::{}", namespace, key))
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, StorageError>,
    {
        let ns = nvs_name(namespace)?;
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret == ESP_ERR_NVS_NOT_FOUND as i32 {
            // Read-only open of a namespace that was never written.
            return Err(StorageError::NotFound);
        }
        if ret != ESP_OK as i32 {
            return Err(StorageError::IoError);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn map_esp_err(ret: i32) -> StorageError {
        if ret == ESP_ERR_NVS_NOT_FOUND as i32 {
            StorageError::NotFound
        } else if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }

    #[cfg(target_os = "espidf")]
    fn commit(handle: nvs_handle_t) -> Result<(), StorageError> {
        let ret = unsafe { nvs_commit(handle) };
        if ret != ESP_OK as i32 {
            return Err(Self::map_esp_err(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY)?;
        Ok(self.blobs.borrow().get(&key).cloned())
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let key = nvs_name(CONFIG_KEY)?;
        let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
            let mut size: usize = 0;
            // First call: get size
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK as i32 {
                return Err(Self::map_esp_err(ret));
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(StorageError::IoError);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK as i32 {
                return Err(Self::map_esp_err(ret));
            }
            buf.truncate(size);
            Ok(buf)
        });
        match result {
            Ok(buf) => Ok(Some(buf)),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY)?;
        self.blobs.borrow_mut().insert(key, bytes.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let key = nvs_name(CONFIG_KEY)?;
        Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK as i32 {
                return Err(Self::map_esp_err(ret));
            }
            Self::commit(handle)
        })
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob().map_err(|_| ConfigError::IoError)? else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let cfg: SystemConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(&bytes).map_err(|_| ConfigError::IoError)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read_i64(&self, namespace: &str, key: &str) -> Result<i64, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key)?;
            self.ints
                .borrow()
                .get(&composite)
                .copied()
                .ok_or(StorageError::NotFound)
        }

        #[cfg(target_os = "espidf")]
        {
            let key = nvs_name(key)?;
            Self::with_nvs_handle(namespace, false, |handle| {
                let mut value: i64 = 0;
                let ret = unsafe { nvs_get_i64(handle, key.as_ptr() as *const _, &mut value) };
                if ret != ESP_OK as i32 {
                    return Err(Self::map_esp_err(ret));
                }
                Ok(value)
            })
        }
    }

    fn write_i64(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key)?;
            self.ints.borrow_mut().insert(composite, value);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = nvs_name(key)?;
            Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_set_i64(handle, key.as_ptr() as *const _, value) };
                if ret != ESP_OK as i32 {
                    return Err(Self::map_esp_err(ret));
                }
                Self::commit(handle)
            })
        }
    }
}
