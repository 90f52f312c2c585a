//! RP2350 implementations of the hardware seams

use embassy_rp::gpio::{Flex, Level, Pull};
use embassy_time::{block_for, Duration, Instant};
use smart_street_light::system::clock::Clock;
use smart_street_light::system::error::HardwareLineError;
use smart_street_light::system::lines::{Direction, HardwareLines, Line};

use super::resources::StreetLightResources;

/// One GPIO and the direction it was last given
struct Pin {
    flex: Flex<'static>,
    direction: Option<Direction>,
}

/// Trigger, echo and light lines on RP2350 GPIOs
///
/// Pins start unconfigured. After [`HardwareLines::release`] they are dropped,
/// which returns them to their reset state, and every access fails.
pub struct RpLines {
    pins: Option<[Pin; 3]>,
}

impl RpLines {
    pub fn new(r: StreetLightResources) -> Self {
        let pin = |flex| Pin {
            flex,
            direction: None,
        };
        Self {
            pins: Some([
                pin(Flex::new(r.trigger_pin)),
                pin(Flex::new(r.echo_pin)),
                pin(Flex::new(r.light_pin)),
            ]),
        }
    }

    fn pin(&mut self, line: Line) -> Result<&mut Pin, HardwareLineError> {
        let pins = self.pins.as_mut().ok_or(HardwareLineError::Released)?;
        let index = match line {
            Line::Trigger => 0,
            Line::Echo => 1,
            Line::Light => 2,
        };
        Ok(&mut pins[index])
    }

    fn configured(&mut self, line: Line) -> Result<(&mut Flex<'static>, Direction), HardwareLineError> {
        let pin = self.pin(line)?;
        let direction = pin.direction.ok_or(HardwareLineError::NotConfigured(line))?;
        Ok((&mut pin.flex, direction))
    }
}

impl HardwareLines for RpLines {
    fn set_direction(&mut self, line: Line, direction: Direction) -> Result<(), HardwareLineError> {
        let pin = self.pin(line)?;
        match direction {
            Direction::Output => {
                pin.flex.set_low();
                pin.flex.set_as_output();
            }
            Direction::Input => {
                pin.flex.set_pull(Pull::None);
                pin.flex.set_as_input();
            }
        }
        pin.direction = Some(direction);
        Ok(())
    }

    fn write(&mut self, line: Line, high: bool) -> Result<(), HardwareLineError> {
        let (flex, direction) = self.configured(line)?;
        if direction != Direction::Output {
            return Err(HardwareLineError::WrongDirection(line));
        }
        flex.set_level(Level::from(high));
        Ok(())
    }

    fn read(&mut self, line: Line) -> Result<bool, HardwareLineError> {
        let (flex, direction) = self.configured(line)?;
        Ok(match direction {
            // driven level, so the light state reads back what was written
            Direction::Output => flex.is_set_high(),
            Direction::Input => flex.is_high(),
        })
    }

    fn release(&mut self) {
        self.pins = None;
    }
}

/// Clock backed by the embassy time driver
///
/// The trigger pulse is microseconds long, so it busy-waits instead of
/// yielding to the executor.
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }
}
