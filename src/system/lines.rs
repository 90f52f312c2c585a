//! Hardware line capability
//!
//! The street light needs exactly three digital lines: the sensor trigger
//! (output), the sensor echo (input) and the light itself (output). The core
//! never touches pins directly; it is handed a [`HardwareLines`] implementation
//! at construction time, which the firmware backs with RP2350 GPIOs and the
//! unit tests back with [`crate::system::mock::MockLines`].

use core::fmt;

use crate::system::error::HardwareLineError;

/// Logical line used by the street light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum Line {
    /// Ultrasonic sensor trigger
    Trigger,
    /// Ultrasonic sensor echo
    Echo,
    /// Street light output
    Light,
}

impl Line {
    /// All lines in configuration order
    pub const ALL: [Line; 3] = [Line::Trigger, Line::Echo, Line::Light];

    /// Direction the street light requires for this line
    pub const fn direction(self) -> Direction {
        match self {
            Line::Trigger | Line::Light => Direction::Output,
            Line::Echo => Direction::Input,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Trigger => write!(f, "trigger"),
            Line::Echo => write!(f, "echo"),
            Line::Light => write!(f, "light"),
        }
    }
}

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum Direction {
    /// High impedance input
    Input,
    /// Push-pull output
    Output,
}

/// Digital line bank owned by the light controller
///
/// # Invariants
///
/// - A line must have its direction set before it is read or written
/// - After [`HardwareLines::release`] every access fails with
///   [`HardwareLineError::Released`]
pub trait HardwareLines {
    /// Configure the direction of a line
    fn set_direction(&mut self, line: Line, direction: Direction) -> Result<(), HardwareLineError>;

    /// Drive an output line high (`true`) or low (`false`)
    fn write(&mut self, line: Line, high: bool) -> Result<(), HardwareLineError>;

    /// Read the level of a line
    ///
    /// Output lines report the level they are currently driving.
    fn read(&mut self, line: Line) -> Result<bool, HardwareLineError>;

    /// Release all lines back to the platform
    fn release(&mut self);
}

/// Configure trigger, echo and light with their required directions
///
/// The trigger is driven low once configured so the first measurement starts
/// from a clean edge.
pub fn configure<L: HardwareLines>(lines: &mut L) -> Result<(), HardwareLineError> {
    for line in Line::ALL {
        lines.set_direction(line, line.direction())?;
    }
    lines.write(Line::Trigger, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::mock::MockLines;

    #[test]
    fn configure_sets_required_directions() {
        let mut lines = MockLines::new();
        configure(&mut lines).unwrap();

        assert_eq!(lines.direction(Line::Trigger), Some(Direction::Output));
        assert_eq!(lines.direction(Line::Echo), Some(Direction::Input));
        assert_eq!(lines.direction(Line::Light), Some(Direction::Output));
        assert!(!lines.read(Line::Trigger).unwrap());
    }

    #[test]
    fn configure_after_release_fails() {
        let mut lines = MockLines::new();
        lines.release();

        assert_eq!(configure(&mut lines), Err(HardwareLineError::Released));
    }
}
