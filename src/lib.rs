#![cfg_attr(not(test), no_std)]

//! Smart street light controller
//!
//! Hardware-independent core of the street light firmware: ultrasonic distance
//! sampling, the mode-driven light control loop, the passage counter and the
//! telemetry report. The firmware binary wires these to the RP2350 pins and
//! the Wi-Fi stack; host unit tests wire them to the mocks in [`system::mock`].

/// Target-independent logging macros
#[macro_use]
pub mod logging;

/// Street light core modules
pub mod system;
