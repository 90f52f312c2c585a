//! Mock hardware for testing
//!
//! - [`MockLines`]: line bank with a scripted echo waveform
//! - [`MockClock`]: clock that advances a fixed step on every read
//! - [`MockSink`]: telemetry sink that records reports or fails on demand

use core::cell::Cell;

use heapless::Vec;

use crate::system::clock::Clock;
use crate::system::distance_sensor::SPEED_OF_SOUND_CM_PER_S;
use crate::system::error::{HardwareLineError, TelemetryError};
use crate::system::lines::{Direction, HardwareLines, Line};
use crate::system::telemetry::{Report, TelemetrySink};

/// Echo pulse width (µs) for an object at `cm`, when the clock steps 1 µs
pub fn round_trip_us(cm: f32) -> u32 {
    (cm * 2.0 / SPEED_OF_SOUND_CM_PER_S * 1_000_000.0 + 0.5) as u32
}

/// Echo waveform replayed after every trigger pulse
///
/// The echo reads low `low_reads` times, then high `high_reads` times, then
/// low again.
#[derive(Debug, Clone, Copy)]
struct EchoScript {
    low_reads: u32,
    high_reads: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct MockLine {
    direction: Option<Direction>,
    level: bool,
    writes: u32,
}

/// Mock line bank
#[derive(Debug, Default)]
pub struct MockLines {
    lines: [MockLine; 3],
    echo: Option<EchoScript>,
    echo_reads: u32,
    released: bool,
}

impl MockLines {
    /// Create a bank with all lines unconfigured
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay this echo waveform after every trigger pulse
    pub fn script_echo(&mut self, low_reads: u32, high_reads: u32) {
        self.echo = Some(EchoScript {
            low_reads,
            high_reads,
        });
        self.echo_reads = 0;
    }

    /// Disconnect the sensor: echo stays low forever
    pub fn disconnect_echo(&mut self) {
        self.echo = None;
    }

    /// Number of writes issued to `line`
    pub fn writes(&self, line: Line) -> u32 {
        self.lines[index(line)].writes
    }

    /// Configured direction of `line`
    pub fn direction(&self, line: Line) -> Option<Direction> {
        self.lines[index(line)].direction
    }

    /// Level of `line` regardless of release state
    pub fn level(&self, line: Line) -> bool {
        self.lines[index(line)].level
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn echo_level(&mut self) -> bool {
        let Some(script) = self.echo else {
            return false;
        };
        self.echo_reads = self.echo_reads.saturating_add(1);
        self.echo_reads > script.low_reads
            && u64::from(self.echo_reads) <= u64::from(script.low_reads) + u64::from(script.high_reads)
    }

    fn configured(&self, line: Line) -> Result<Direction, HardwareLineError> {
        if self.released {
            return Err(HardwareLineError::Released);
        }
        self.lines[index(line)]
            .direction
            .ok_or(HardwareLineError::NotConfigured(line))
    }
}

impl HardwareLines for MockLines {
    fn set_direction(&mut self, line: Line, direction: Direction) -> Result<(), HardwareLineError> {
        if self.released {
            return Err(HardwareLineError::Released);
        }
        self.lines[index(line)].direction = Some(direction);
        Ok(())
    }

    fn write(&mut self, line: Line, high: bool) -> Result<(), HardwareLineError> {
        if self.configured(line)? != Direction::Output {
            return Err(HardwareLineError::WrongDirection(line));
        }
        let state = &mut self.lines[index(line)];
        // Falling trigger edge starts a new ping
        if line == Line::Trigger && state.level && !high {
            self.echo_reads = 0;
        }
        state.level = high;
        state.writes += 1;
        Ok(())
    }

    fn read(&mut self, line: Line) -> Result<bool, HardwareLineError> {
        self.configured(line)?;
        if line == Line::Echo {
            return Ok(self.echo_level());
        }
        Ok(self.lines[index(line)].level)
    }

    fn release(&mut self) {
        self.released = true;
    }
}

fn index(line: Line) -> usize {
    match line {
        Line::Trigger => 0,
        Line::Echo => 1,
        Line::Light => 2,
    }
}

/// Mock clock
///
/// Every call to [`Clock::now_micros`] advances time by `step` µs.
#[derive(Debug)]
pub struct MockClock {
    now: Cell<u64>,
    step: u64,
    delayed: u64,
}

impl MockClock {
    pub fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
            delayed: 0,
        }
    }

    /// Total time spent in [`Clock::delay_us`]
    pub fn delayed_us(&self) -> u64 {
        self.delayed
    }
}

impl Clock for MockClock {
    fn now_micros(&self) -> u64 {
        let now = self.now.get() + self.step;
        self.now.set(now);
        now
    }

    fn delay_us(&mut self, us: u32) {
        self.now.set(self.now.get() + u64::from(us));
        self.delayed += u64::from(us);
    }
}

/// Maximum number of reports kept by [`MockSink`]
pub const MOCK_SINK_CAPACITY: usize = 32;

/// Mock telemetry sink
#[derive(Debug, Default)]
pub struct MockSink {
    reports: Vec<Report, MOCK_SINK_CAPACITY>,
    attempts: u32,
    failure: Option<TelemetryError>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every update fails with `error`
    pub fn failing(error: TelemetryError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Delivered reports, oldest first
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Update calls, delivered or not
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl TelemetrySink for MockSink {
    async fn update(&mut self, report: &Report) -> Result<(), TelemetryError> {
        self.attempts += 1;
        if let Some(error) = self.failure {
            return Err(error);
        }
        let _ = self.reports.push(*report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_script_replays_after_each_trigger() {
        let mut lines = MockLines::new();
        crate::system::lines::configure(&mut lines).unwrap();
        lines.script_echo(1, 2);

        for _ in 0..2 {
            lines.write(Line::Trigger, true).unwrap();
            lines.write(Line::Trigger, false).unwrap();
            let seen: [bool; 4] = core::array::from_fn(|_| lines.read(Line::Echo).unwrap());
            assert_eq!(seen, [false, true, true, false]);
        }
    }

    #[test]
    fn input_lines_reject_writes() {
        let mut lines = MockLines::new();
        crate::system::lines::configure(&mut lines).unwrap();
        assert_eq!(
            lines.write(Line::Echo, true),
            Err(HardwareLineError::WrongDirection(Line::Echo))
        );
    }

    #[test]
    fn unconfigured_lines_reject_access() {
        let mut lines = MockLines::new();
        assert_eq!(
            lines.read(Line::Light),
            Err(HardwareLineError::NotConfigured(Line::Light))
        );
    }

    #[test]
    fn clock_advances_per_read() {
        let mut clock = MockClock::new(5);
        assert_eq!(clock.now_micros(), 5);
        assert_eq!(clock.now_micros(), 10);
        clock.delay_us(10);
        assert_eq!(clock.now_micros(), 25);
        assert_eq!(clock.delayed_us(), 10);
    }

    #[test]
    fn round_trip_matches_speed_of_sound() {
        // 50 cm there and back at 343 m/s
        assert_eq!(round_trip_us(50.0), 2915);
    }
}
