//! Operating modes
//!
//! The street light runs in one of three modes. Mode names arrive as text from
//! the remote mode field, so parsing validates membership and rejects anything
//! else with [`Error::InvalidMode`].

use core::fmt;
use core::str::FromStr;

use crate::system::error::Error;

/// Street light operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum OperatingMode {
    /// Light forced on every cycle
    On,
    /// Light forced off every cycle
    Off,
    /// Light follows the distance sensor
    #[default]
    Auto,
}

impl OperatingMode {
    /// Name used on the telemetry wire
    pub const fn as_str(self) -> &'static str {
        match self {
            OperatingMode::On => "on",
            OperatingMode::Off => "off",
            OperatingMode::Auto => "auto",
        }
    }

    /// Next mode in button order: auto -> on -> off -> auto
    pub const fn next(self) -> Self {
        match self {
            OperatingMode::Auto => OperatingMode::On,
            OperatingMode::On => OperatingMode::Off,
            OperatingMode::Off => OperatingMode::Auto,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = Error;

    /// Case-insensitive; "smart" is accepted as an alias for auto
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("on") {
            Ok(OperatingMode::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(OperatingMode::Off)
        } else if s.eq_ignore_ascii_case("auto") || s.eq_ignore_ascii_case("smart") {
            Ok(OperatingMode::Auto)
        } else {
            Err(Error::InvalidMode)
        }
    }
}
