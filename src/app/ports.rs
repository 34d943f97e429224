//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ acquisition / relay core
//! ```
//!
//! Driven adapters (ADC sampler, relay outputs, NVS, event sinks, clock)
//! implement these traits.  The channel processors and the relay controller
//! take them as `&mut impl Trait` at call sites, so the core never touches
//! hardware directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **StoragePort** writes MUST be crash-atomic per key.
//! - All port errors are typed and `Copy`.

use crate::config::SystemConfig;
use crate::error::{ActuatorError, SensorError};

// ───────────────────────────────────────────────────────────────
// Voltage sampler (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

/// Absolute voltage source for one hardware ADC channel.
///
/// Implementations oversample and run the hardware calibration curve.
/// `Ok(0)` means "no measurable signal" and is not an error.
pub trait VoltageSampler {
    fn sample_voltage(&mut self, hw_channel: u8) -> Result<u32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → relay outputs)
// ───────────────────────────────────────────────────────────────

/// Logical relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
}

impl RelayState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Write-side port for digital relay outputs.  `actuate` is idempotent.
pub trait ActuatorPort {
    fn actuate(&mut self, output: u8, state: RelayState) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// display refresh, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock used to arm relay watchdogs.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST call [`SystemConfig::validate`] before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Durable signed-integer key/value store.
///
/// Keys are namespaced.  A write either fully lands or leaves the old
/// value in place; the ESP-IDF NVS commit guarantees this natively.
pub trait StoragePort {
    /// Read a value.  `Err(StorageError::NotFound)` if never written.
    fn read_i64(&self, namespace: &str, key: &str) -> Result<i64, StorageError>;

    /// Write and commit a value.
    fn write_i64(&mut self, namespace: &str, key: &str, value: i64) -> Result<(), StorageError>;

    /// Read a value, or `default` if it was never written or is unreadable.
    fn read_i64_or(&self, namespace: &str, key: &str, default: i64) -> i64 {
        match self.read_i64(namespace, key) {
            Ok(v) => v,
            Err(StorageError::NotFound) => default,
            Err(e) => {
                log::warn!("storage: reading {namespace}/{key} failed: {e}");
                default
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Namespace or key is too long for the backend.
    InvalidKey,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::InvalidKey => write!(f, "invalid namespace or key"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
