//! Hardware Resource Management
//!
//! Splits the RP2350 peripherals into one group per task so ownership of every
//! pin is settled at startup.
//!
//! # Resource Groups
//! - Street light: HC-SR04 trigger/echo and the lamp relay
//! - Mode button: push button cycling the operating mode
//! - Wi-Fi: CYW43439 power, SPI pins, PIO block and DMA channel

use assign_resources::assign_resources;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, PIO0};
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_rp::Peri;

assign_resources! {
    /// Distance sensor and lamp lines driven by the control loop
    street_light: StreetLightResources {
        trigger_pin: PIN_15,
        echo_pin: PIN_14,
        light_pin: PIN_16,
    },
    /// Mode button, active high with pull-down
    mode_button: ModeButtonResources {
        pin: PIN_17,
    },
    /// CYW43439 wireless chip
    wifi: WifiResources {
        pwr_pin: PIN_23,
        dio_pin: PIN_24,
        cs_pin: PIN_25,
        clk_pin: PIN_29,
        pio: PIO0,
        dma: DMA_CH0,
    },
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});
