//! Core system components for street light operation
pub mod clock;
pub mod command;
pub mod config;
pub mod distance_sensor;
pub mod error;
pub mod light_controller;
pub mod lines;
pub mod mode;
pub mod telemetry;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{Error, Result};
pub use light_controller::{Cycle, Decision, LightController, ResetGuard};
