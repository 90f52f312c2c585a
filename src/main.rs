//! Street light firmware entry point
//!
//! Brings up the network, builds the controller and spawns the tasks.

#![no_std]
#![no_main]

use crate::board::gpio::{EmbassyClock, RpLines};
use crate::board::resources::{AssignedResources, ModeButtonResources, StreetLightResources, WifiResources};
use crate::board::uplink::ThingSpeakUplink;
use crate::board::{network, StreetLight};
use crate::task::{mode_button::mode_button, mode_poll::mode_poll, street_light::street_light};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use smart_street_light::log_info;
use smart_street_light::system::config::Config;
use smart_street_light::system::LightController;
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Pico 2 W board support
mod board;
/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);
    let config = Config::default();

    let stack = match network::start(spawner, &config.wifi, r.wifi).await {
        Ok(stack) => Some(stack),
        Err(e) => {
            log_info!("Running without network: {}", e);
            None
        }
    };

    let telemetry = config.telemetry.clone();
    let uplink = ThingSpeakUplink::new(stack, telemetry.clone());

    // A street light that cannot drive its pins has nothing to do
    let light: StreetLight =
        match LightController::new(RpLines::new(r.street_light), EmbassyClock, uplink, &config) {
            Ok(light) => light,
            Err(e) => defmt::panic!("Street light setup failed: {}", e),
        };

    spawner.spawn(street_light(light).unwrap());
    spawner.spawn(mode_button(r.mode_button).unwrap());

    if stack.is_some() && telemetry.mode_polling_enabled() {
        let interval = telemetry.mode_poll_interval;
        spawner.spawn(mode_poll(ThingSpeakUplink::new(stack, telemetry), interval).unwrap());
    }
}
