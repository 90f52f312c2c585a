//! Error types
//!
//! Every per-cycle failure of the street light maps to one of these variants.
//! Only [`Error::HardwareLine`] is allowed to leave a control cycle; sensor,
//! mode and telemetry errors are logged and degraded locally.

use core::fmt;

use crate::system::lines::Line;

/// Result type for street light operations
pub type Result<T> = core::result::Result<T, Error>;

/// Street light errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum Error {
    /// The echo line did not transition within the configured timeout
    SensorTimeout(EchoEdge),
    /// Unrecognized operating mode requested
    InvalidMode,
    /// The telemetry report could not be delivered
    TelemetryDelivery(TelemetryError),
    /// A hardware line could not be configured or accessed
    HardwareLine(HardwareLineError),
}

/// Echo transition that was being waited for when the sensor timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum EchoEdge {
    /// Echo never went high after the trigger pulse
    Rise,
    /// Echo never went low again after the pulse started
    Fall,
}

/// Hardware line errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum HardwareLineError {
    /// Lines were released by a reset and must be acquired again
    Released,
    /// Line accessed before its direction was configured
    NotConfigured(Line),
    /// Write to an input line
    WrongDirection(Line),
}

/// Telemetry delivery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum TelemetryError {
    /// No endpoint or key configured
    NotConfigured,
    /// Host name could not be resolved
    Dns,
    /// TCP connection could not be established
    Connect,
    /// Socket read or write failed
    Io,
    /// The endpoint did not answer in time
    Timeout,
    /// The endpoint answered with a non-success status code
    Rejected(u16),
    /// The response could not be parsed
    Malformed,
    /// The request did not fit into its buffer
    Overflow,
}

impl From<EchoEdge> for Error {
    fn from(edge: EchoEdge) -> Self {
        Error::SensorTimeout(edge)
    }
}

impl From<HardwareLineError> for Error {
    fn from(e: HardwareLineError) -> Self {
        Error::HardwareLine(e)
    }
}

impl From<TelemetryError> for Error {
    fn from(e: TelemetryError) -> Self {
        Error::TelemetryDelivery(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SensorTimeout(edge) => write!(f, "sensor timeout waiting for echo {}", edge),
            Error::InvalidMode => write!(f, "invalid operating mode"),
            Error::TelemetryDelivery(e) => write!(f, "telemetry delivery failed: {}", e),
            Error::HardwareLine(e) => write!(f, "hardware line error: {}", e),
        }
    }
}

impl fmt::Display for EchoEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EchoEdge::Rise => write!(f, "rise"),
            EchoEdge::Fall => write!(f, "fall"),
        }
    }
}

impl fmt::Display for HardwareLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareLineError::Released => write!(f, "lines released"),
            HardwareLineError::NotConfigured(line) => write!(f, "{} line not configured", line),
            HardwareLineError::WrongDirection(line) => {
                write!(f, "{} line configured as input", line)
            }
        }
    }
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::NotConfigured => write!(f, "endpoint not configured"),
            TelemetryError::Dns => write!(f, "dns lookup failed"),
            TelemetryError::Connect => write!(f, "connection failed"),
            TelemetryError::Io => write!(f, "socket error"),
            TelemetryError::Timeout => write!(f, "timed out"),
            TelemetryError::Rejected(status) => write!(f, "rejected with status {}", status),
            TelemetryError::Malformed => write!(f, "malformed response"),
            TelemetryError::Overflow => write!(f, "request buffer overflow"),
        }
    }
}
