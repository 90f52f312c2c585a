//! Ultrasonic distance sensor (HC-SR04)
//!
//! # Measurement
//! - 10 µs trigger pulse starts a ping
//! - Echo line stays high for the round-trip time of the ping
//! - Distance = round trip × speed of sound / 2
//!
//! # Timeouts
//! A disconnected or faulty sensor leaves the echo line stuck. Both the wait
//! for the rising edge and the wait for the falling edge are bounded by the
//! configured timeout and fail with [`Error::SensorTimeout`].

use embassy_time::Duration;

use crate::system::clock::Clock;
use crate::system::error::{EchoEdge, Error, Result};
use crate::system::lines::{HardwareLines, Line};

/// Trigger pulse width required by the HC-SR04
pub const TRIGGER_PULSE_US: u32 = 10;

/// Speed of sound at room temperature (cm/s)
pub const SPEED_OF_SOUND_CM_PER_S: f32 = 34_300.0;

/// Converts an echo pulse width into a one-way distance in centimeters
pub fn distance_from_round_trip(elapsed_us: u64) -> f32 {
    (elapsed_us as f32 / 1_000_000.0) * SPEED_OF_SOUND_CM_PER_S / 2.0
}

/// HC-SR04 driver working on borrowed trigger/echo lines
#[derive(Debug, Clone)]
pub struct DistanceSensor {
    echo_timeout_us: u64,
}

impl DistanceSensor {
    pub fn new(echo_timeout: Duration) -> Self {
        Self {
            echo_timeout_us: echo_timeout.as_micros(),
        }
    }

    /// Takes one measurement and returns the distance in centimeters
    ///
    /// Blocks the caller for the length of the echo, at most twice the
    /// configured timeout.
    pub fn measure<L, C>(&self, lines: &mut L, clock: &mut C) -> Result<f32>
    where
        L: HardwareLines,
        C: Clock,
    {
        lines.write(Line::Trigger, true)?;
        clock.delay_us(TRIGGER_PULSE_US);
        lines.write(Line::Trigger, false)?;

        let released_at = clock.now_micros();
        let pulse_start = self.wait_for_echo(lines, clock, true, released_at)?;
        let pulse_end = self.wait_for_echo(lines, clock, false, pulse_start)?;

        Ok(distance_from_round_trip(pulse_end.saturating_sub(pulse_start)))
    }

    /// Busy-polls the echo line until it reaches `level`
    ///
    /// Returns the timestamp of the first poll that saw the level.
    fn wait_for_echo<L, C>(&self, lines: &mut L, clock: &C, level: bool, since: u64) -> Result<u64>
    where
        L: HardwareLines,
        C: Clock,
    {
        loop {
            let now = clock.now_micros();
            if lines.read(Line::Echo)? == level {
                return Ok(now);
            }
            if now.saturating_sub(since) > self.echo_timeout_us {
                let edge = if level { EchoEdge::Rise } else { EchoEdge::Fall };
                return Err(Error::SensorTimeout(edge));
            }
        }
    }
}
