//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to              |
//! |------------|-----------------|--------------------------|
//! | `hardware` | VoltageSampler  | ESP32 ADC1 (oneshot)     |
//! |            | ActuatorPort    | relay GPIO outputs       |
//! | `log_sink` | EventSink       | Serial log output        |
//! | `nvs`      | ConfigPort      | NVS / in-memory store    |
//! |            | StoragePort     |                          |
//! | `time`     | Clock           | ESP32 system timer       |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
