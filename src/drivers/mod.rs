//! Low-level peripheral drivers.
//!
//! | Driver    | Peripheral                    |
//! |-----------|-------------------------------|
//! | `hw_init` | ADC1 oneshot + calibration    |
//! | `relay`   | relay outputs (`OutputPin`)   |

pub mod hw_init;
pub mod relay;
