//! Street light control loop
//!
//! Owns the light, the distance sensor, the passage counter and the operating
//! mode. The host calls [`LightController::step`] once per cycle and waits for
//! the returned [`Cycle`] before calling it again.
//!
//! # Modes
//! - On: light forced on, status reported every cycle
//! - Off: light forced off, nothing reported
//! - Auto: one distance sample per cycle; an object at or below the threshold
//!   counts a passage, turns the light on and holds it for the dwell time
//!
//! # Passage counting
//! The counter advances once per cycle that sees an object, not once per
//! object. The dwell hold makes repeated counts unlikely, but an object that
//! is still in range after the hold is counted again.
//!
//! # Failure handling
//! - Sensor timeout: treated as "no detection", light goes off
//! - Telemetry failure: logged, the cycle continues
//! - Hardware line failure: returned to the host

use core::ops::{Deref, DerefMut};

use embassy_time::Duration;

use crate::system::clock::Clock;
use crate::system::command::ModeRequest;
use crate::system::config::Config;
use crate::system::distance_sensor::DistanceSensor;
use crate::system::error::{EchoEdge, Error, Result};
use crate::system::lines::{self, HardwareLines, Line};
use crate::system::mode::OperatingMode;
use crate::system::telemetry::{LightStatus, Report, TelemetrySink};

/// What a cycle decided
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum Decision {
    /// On mode forced the light on
    ForcedOn,
    /// Off mode forced the light off
    ForcedOff,
    /// Object within threshold, passage counted
    Detected { distance_cm: f32 },
    /// Nothing within threshold
    Clear { distance_cm: f32 },
    /// Sensor did not answer; handled as no detection
    SensorFault(EchoEdge),
}

/// Result of a light command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actuation {
    /// The light line was written
    pub switched: bool,
    /// Time the light must be held before the next decision
    pub hold: Option<Duration>,
}

/// Outcome of one control cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub struct Cycle {
    pub decision: Decision,
    /// Dwell hold requested by the decision
    pub hold: Option<Duration>,
    /// Inter-cycle delay
    pub delay: Duration,
}

impl Cycle {
    /// Total time the host must wait before the next step
    pub fn wait(&self) -> Duration {
        self.hold.unwrap_or(Duration::from_ticks(0)) + self.delay
    }
}

/// Mode-driven street light controller
pub struct LightController<L, C, T> {
    lines: L,
    clock: C,
    telemetry: T,
    sensor: DistanceSensor,
    mode: OperatingMode,
    passage_count: u32,
    distance_threshold_cm: f32,
    dwell: Duration,
    cycle_delay: Duration,
}

impl<L, C, T> LightController<L, C, T>
where
    L: HardwareLines,
    C: Clock,
    T: TelemetrySink,
{
    /// Configures the lines and builds a controller in the configured initial mode
    ///
    /// # Errors
    ///
    /// Returns [`Error::HardwareLine`] if any line cannot be configured. The
    /// light cannot work without its lines, so callers should treat this as
    /// fatal.
    pub fn new(mut lines: L, clock: C, telemetry: T, config: &Config) -> Result<Self> {
        lines::configure(&mut lines)?;

        Ok(Self {
            lines,
            clock,
            telemetry,
            sensor: DistanceSensor::new(config.echo_timeout),
            mode: config.initial_mode,
            passage_count: 0,
            distance_threshold_cm: config.distance_threshold_cm,
            dwell: config.dwell,
            cycle_delay: config.cycle_delay,
        })
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OperatingMode) {
        self.mode = mode;
        log_info!("System mode is: {}", mode);
    }

    /// Switches to the mode named by `name`
    ///
    /// Empty text is ignored. Unknown names are logged and leave the mode
    /// unchanged.
    pub fn request_mode(&mut self, name: &str) -> Result<OperatingMode> {
        if name.trim().is_empty() {
            return Ok(self.mode);
        }
        match name.parse::<OperatingMode>() {
            Ok(mode) => {
                self.set_mode(mode);
                Ok(mode)
            }
            Err(e) => {
                log_warn!("Not a valid system mode: {}", name);
                Err(e)
            }
        }
    }

    /// Applies a request taken from the mode command signal
    pub fn apply(&mut self, request: &ModeRequest) -> Result<OperatingMode> {
        match request {
            ModeRequest::Cycle => {
                self.set_mode(self.mode.next());
                Ok(self.mode)
            }
            ModeRequest::Named(name) => self.request_mode(name),
        }
    }

    /// Objects counted since power-up or the last reset
    pub fn passage_count(&self) -> u32 {
        self.passage_count
    }

    /// Reads the light line
    pub fn light_status(&mut self) -> Result<LightStatus> {
        Ok(LightStatus::from_level(self.lines.read(Line::Light)?))
    }

    /// Runs one control cycle
    ///
    /// # Errors
    ///
    /// Only [`Error::HardwareLine`]; every other failure is handled inside the
    /// cycle.
    pub async fn step(&mut self) -> Result<Cycle> {
        let (decision, hold) = match self.mode {
            OperatingMode::On => {
                let actuation = self.turn_on(None).await?;
                (Decision::ForcedOn, actuation.hold)
            }
            OperatingMode::Off => {
                let actuation = self.turn_off(None)?;
                (Decision::ForcedOff, actuation.hold)
            }
            OperatingMode::Auto => self.run_auto().await?,
        };

        Ok(Cycle {
            decision,
            hold,
            delay: self.cycle_delay,
        })
    }

    /// Turns the light on if it is off, then reports status
    ///
    /// The report is sent whether or not the line changed.
    pub async fn turn_on(&mut self, dwell: Option<Duration>) -> Result<Actuation> {
        let switched = if !self.lines.read(Line::Light)? {
            self.lines.write(Line::Light, true)?;
            match dwell {
                Some(dwell) => log_info!("Turning lights on for {} ms", dwell.as_millis()),
                None => log_info!("Turning lights on"),
            }
            true
        } else {
            false
        };

        self.report().await?;

        Ok(Actuation {
            switched,
            hold: dwell,
        })
    }

    /// Turns the light off if it is on
    pub fn turn_off(&mut self, dwell: Option<Duration>) -> Result<Actuation> {
        let switched = if self.lines.read(Line::Light)? {
            self.lines.write(Line::Light, false)?;
            true
        } else {
            false
        };

        Ok(Actuation {
            switched,
            hold: dwell,
        })
    }

    /// Samples the sensor once and switches the light accordingly
    pub async fn run_auto(&mut self) -> Result<(Decision, Option<Duration>)> {
        let distance_cm = match self.sensor.measure(&mut self.lines, &mut self.clock) {
            Ok(distance_cm) => distance_cm,
            Err(Error::SensorTimeout(edge)) => {
                log_warn!("No echo {} from distance sensor, assuming nothing passed", edge);
                let actuation = self.turn_off(None)?;
                return Ok((Decision::SensorFault(edge), actuation.hold));
            }
            Err(e) => return Err(e),
        };

        log_debug!("Distance = {} cm", distance_cm);

        if distance_cm <= self.distance_threshold_cm {
            log_info!("Object detected at {} cm", distance_cm);
            self.passage_count = self.passage_count.saturating_add(1);
            let actuation = self.turn_on(Some(self.dwell)).await?;
            Ok((Decision::Detected { distance_cm }, actuation.hold))
        } else {
            let actuation = self.turn_off(None)?;
            Ok((Decision::Clear { distance_cm }, actuation.hold))
        }
    }

    /// Sends the current status to the telemetry sink
    ///
    /// Delivery failures are logged and swallowed.
    pub async fn report(&mut self) -> Result<()> {
        match self.send_report().await {
            Err(Error::TelemetryDelivery(e)) => {
                log_warn!("Telemetry delivery failed: {}", e);
                Ok(())
            }
            other => other,
        }
    }

    async fn send_report(&mut self) -> Result<()> {
        let report = Report {
            mode: self.mode,
            status: self.light_status()?,
            passage_count: self.passage_count,
        };
        self.telemetry.update(&report).await?;
        log_debug!("Telemetry delivered: {} {} {}", report.mode, report.status, report.passage_count);
        Ok(())
    }

    /// Releases the lines and clears the passage counter
    ///
    /// Every later line access fails with
    /// [`HardwareLineError::Released`](crate::system::error::HardwareLineError::Released).
    pub fn reset(&mut self) {
        log_info!("Passed objects: {}", self.passage_count);
        // light goes dark before the pins are let go
        let _ = self.lines.write(Line::Light, false);
        self.lines.release();
        self.passage_count = 0;
    }

    /// Wraps the controller so it is reset when the guard goes out of scope
    pub fn reset_guard(&mut self) -> ResetGuard<'_, L, C, T> {
        ResetGuard { controller: self }
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

/// Resets the controller on drop, however the owning scope is left
pub struct ResetGuard<'a, L, C, T>
where
    L: HardwareLines,
    C: Clock,
    T: TelemetrySink,
{
    controller: &'a mut LightController<L, C, T>,
}

impl<L, C, T> Deref for ResetGuard<'_, L, C, T>
where
    L: HardwareLines,
    C: Clock,
    T: TelemetrySink,
{
    type Target = LightController<L, C, T>;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl<L, C, T> DerefMut for ResetGuard<'_, L, C, T>
where
    L: HardwareLines,
    C: Clock,
    T: TelemetrySink,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl<L, C, T> Drop for ResetGuard<'_, L, C, T>
where
    L: HardwareLines,
    C: Clock,
    T: TelemetrySink,
{
    fn drop(&mut self) {
        self.controller.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::distance_sensor::distance_from_round_trip;
    use crate::system::error::{HardwareLineError, TelemetryError};
    use crate::system::mock::{round_trip_us, MockClock, MockLines, MockSink};
    use embassy_futures::block_on;

    type TestController = LightController<MockLines, MockClock, MockSink>;

    fn controller_with(sink: MockSink, mode: OperatingMode) -> TestController {
        let config = Config::default().with_threshold_cm(50.0).with_initial_mode(mode);
        LightController::new(MockLines::new(), MockClock::new(1), sink, &config).unwrap()
    }

    fn auto_controller() -> TestController {
        controller_with(MockSink::new(), OperatingMode::Auto)
    }

    fn object_at(controller: &mut TestController, cm: f32) {
        controller.lines_mut().script_echo(20, round_trip_us(cm));
    }

    #[test]
    fn detection_counts_and_holds_light_on() {
        let mut controller = auto_controller();
        object_at(&mut controller, 30.0);

        let cycle = block_on(controller.step()).unwrap();

        assert!(matches!(cycle.decision, Decision::Detected { .. }));
        assert_eq!(controller.passage_count(), 1);
        assert_eq!(controller.light_status(), Ok(LightStatus::On));
        assert_eq!(cycle.hold, Some(Duration::from_secs(10)));
        assert_eq!(cycle.wait(), Duration::from_millis(10_500));

        let reports = controller.telemetry().reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0],
            Report {
                mode: OperatingMode::Auto,
                status: LightStatus::On,
                passage_count: 1,
            }
        );
    }

    #[test]
    fn clear_reading_turns_light_off_without_counting() {
        let mut controller = auto_controller();
        block_on(controller.turn_on(None)).unwrap();
        object_at(&mut controller, 80.0);

        let cycle = block_on(controller.step()).unwrap();

        assert!(matches!(cycle.decision, Decision::Clear { distance_cm } if distance_cm > 50.0));
        assert_eq!(controller.passage_count(), 0);
        assert_eq!(controller.light_status(), Ok(LightStatus::Off));
        assert_eq!(cycle.hold, None);
        assert_eq!(cycle.wait(), Duration::from_millis(500));
        // only the explicit turn_on reported
        assert_eq!(controller.telemetry().attempts(), 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = Config::default()
            .with_threshold_cm(distance_from_round_trip(2_000));
        let mut controller =
            LightController::new(MockLines::new(), MockClock::new(1), MockSink::new(), &config).unwrap();
        controller.lines_mut().script_echo(5, 2_000);

        let cycle = block_on(controller.step()).unwrap();
        assert!(matches!(cycle.decision, Decision::Detected { .. }));
    }

    #[test]
    fn every_detecting_cycle_counts_once() {
        let mut controller = auto_controller();
        object_at(&mut controller, 30.0);

        for expected in 1..=3 {
            block_on(controller.step()).unwrap();
            assert_eq!(controller.passage_count(), expected);
        }
        // light only switched on the first cycle
        assert_eq!(controller.lines().writes(Line::Light), 1);
    }

    #[test]
    fn on_mode_forces_light_and_reports_every_cycle() {
        let mut controller = controller_with(MockSink::new(), OperatingMode::On);
        controller.lines_mut().disconnect_echo();
        let trigger_writes = controller.lines().writes(Line::Trigger);

        for _ in 0..3 {
            let cycle = block_on(controller.step()).unwrap();
            assert_eq!(cycle.decision, Decision::ForcedOn);
            assert_eq!(cycle.hold, None);
            assert_eq!(controller.light_status(), Ok(LightStatus::On));
        }

        assert_eq!(controller.telemetry().reports().len(), 3);
        assert_eq!(controller.lines().writes(Line::Light), 1);
        // sensor never sampled
        assert_eq!(controller.lines().writes(Line::Trigger), trigger_writes);
        assert_eq!(controller.passage_count(), 0);
    }

    #[test]
    fn off_mode_forces_light_off_silently() {
        let mut controller = controller_with(MockSink::new(), OperatingMode::Off);
        block_on(controller.turn_on(None)).unwrap();

        let cycle = block_on(controller.step()).unwrap();

        assert_eq!(cycle.decision, Decision::ForcedOff);
        assert_eq!(controller.light_status(), Ok(LightStatus::Off));
        assert_eq!(controller.telemetry().attempts(), 1);
    }

    #[test]
    fn turn_on_is_idempotent() {
        let mut controller = auto_controller();

        let first = block_on(controller.turn_on(None)).unwrap();
        let second = block_on(controller.turn_on(None)).unwrap();

        assert!(first.switched);
        assert!(!second.switched);
        assert_eq!(controller.lines().writes(Line::Light), 1);
        // status reported both times
        assert_eq!(controller.telemetry().reports().len(), 2);
    }

    #[test]
    fn turn_off_is_idempotent_and_passes_dwell_through() {
        let mut controller = auto_controller();

        let actuation = controller.turn_off(Some(Duration::from_secs(2))).unwrap();

        assert!(!actuation.switched);
        assert_eq!(actuation.hold, Some(Duration::from_secs(2)));
        assert_eq!(controller.lines().writes(Line::Light), 0);
    }

    #[test]
    fn silent_sensor_is_no_detection() {
        let mut controller = auto_controller();
        block_on(controller.turn_on(None)).unwrap();
        controller.lines_mut().disconnect_echo();

        let cycle = block_on(controller.step()).unwrap();

        assert_eq!(cycle.decision, Decision::SensorFault(EchoEdge::Rise));
        assert_eq!(controller.passage_count(), 0);
        assert_eq!(controller.light_status(), Ok(LightStatus::Off));
    }

    #[test]
    fn stuck_echo_is_no_detection() {
        let mut controller = auto_controller();
        controller.lines_mut().script_echo(0, u32::MAX);

        let cycle = block_on(controller.step()).unwrap();

        assert_eq!(cycle.decision, Decision::SensorFault(EchoEdge::Fall));
        assert_eq!(controller.passage_count(), 0);
    }

    #[test]
    fn unreachable_telemetry_does_not_abort_cycle() {
        let mut controller = controller_with(
            MockSink::failing(TelemetryError::Connect),
            OperatingMode::Auto,
        );
        object_at(&mut controller, 10.0);

        let cycle = block_on(controller.step()).unwrap();

        assert!(matches!(cycle.decision, Decision::Detected { .. }));
        assert_eq!(controller.telemetry().attempts(), 1);
        assert_eq!(controller.light_status(), Ok(LightStatus::On));
        assert_eq!(controller.passage_count(), 1);
    }

    #[test]
    fn mode_round_trip() {
        let mut controller = auto_controller();
        for mode in [OperatingMode::On, OperatingMode::Off, OperatingMode::Auto] {
            controller.set_mode(mode);
            assert_eq!(controller.mode(), mode);
        }
    }

    #[test]
    fn invalid_mode_request_leaves_mode_unchanged() {
        let mut controller = controller_with(MockSink::new(), OperatingMode::Off);

        assert_eq!(controller.request_mode("dim"), Err(Error::InvalidMode));
        assert_eq!(controller.mode(), OperatingMode::Off);

        assert_eq!(controller.request_mode("  "), Ok(OperatingMode::Off));
        assert_eq!(controller.mode(), OperatingMode::Off);

        assert_eq!(controller.request_mode("ON"), Ok(OperatingMode::On));
        assert_eq!(controller.mode(), OperatingMode::On);
    }

    #[test]
    fn apply_handles_cycle_and_named_requests() {
        let mut controller = auto_controller();

        assert_eq!(controller.apply(&ModeRequest::Cycle), Ok(OperatingMode::On));
        assert_eq!(controller.apply(&ModeRequest::named("auto")), Ok(OperatingMode::Auto));
        assert_eq!(controller.apply(&ModeRequest::named("bogus")), Err(Error::InvalidMode));
        assert_eq!(controller.mode(), OperatingMode::Auto);
    }

    #[test]
    fn reset_clears_counter_and_releases_lines() {
        let mut controller = auto_controller();
        object_at(&mut controller, 20.0);
        for _ in 0..4 {
            block_on(controller.step()).unwrap();
        }
        assert_eq!(controller.passage_count(), 4);

        controller.reset();

        assert_eq!(controller.passage_count(), 0);
        assert!(controller.lines().is_released());
        assert!(!controller.lines().level(Line::Light));
        assert_eq!(
            controller.light_status(),
            Err(Error::HardwareLine(HardwareLineError::Released))
        );
        assert_eq!(
            block_on(controller.step()),
            Err(Error::HardwareLine(HardwareLineError::Released))
        );
    }

    #[test]
    fn guard_resets_when_scope_ends_early() {
        let mut controller = auto_controller();
        object_at(&mut controller, 20.0);

        let run = |controller: &mut TestController| -> Result<()> {
            let mut guard = controller.reset_guard();
            block_on(guard.step())?;
            guard.lines_mut().release();
            // second cycle fails and leaves the scope through `?`
            block_on(guard.step())?;
            Ok(())
        };

        assert!(run(&mut controller).is_err());
        assert_eq!(controller.passage_count(), 0);
        assert!(controller.lines().is_released());
    }

    #[test]
    fn construction_fails_without_lines() {
        let mut lines = MockLines::new();
        lines.release();

        let result = LightController::new(lines, MockClock::new(1), MockSink::new(), &Config::default());
        assert!(matches!(
            result,
            Err(Error::HardwareLine(HardwareLineError::Released))
        ));
    }
}
