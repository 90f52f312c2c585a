//! Pico 2 W board support
//!
//! Binds the hardware-independent controller to RP2350 pins, the embassy
//! time driver and the CYW43 network stack.

pub mod gpio;
pub mod http;
pub mod network;
pub mod resources;
pub mod uplink;

use smart_street_light::system::LightController;

use self::gpio::{EmbassyClock, RpLines};
use self::uplink::ThingSpeakUplink;

/// The controller as wired on the board
pub type StreetLight = LightController<RpLines, EmbassyClock, ThingSpeakUplink>;
