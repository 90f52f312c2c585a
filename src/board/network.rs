//! Wi-Fi bring-up for the Pico 2 W
//!
//! ```text
//! 1. Power the CYW43439 over PIO SPI and load its firmware
//! 2. Spawn the driver and network stack tasks
//! 3. Join the configured WPA2 network, retrying with backoff
//! 4. Wait for a DHCP lease
//! ```
//!
//! The firmware blobs are expected under `cyw43-firmware/` at the crate root.

use cyw43::{aligned_bytes, Control, JoinOptions};
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::Format;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::Pio;
use embassy_time::{with_timeout, Duration, Instant, Timer};
use smart_street_light::system::config::WifiConfig;
use smart_street_light::{log_debug, log_error, log_info, log_warn};
use static_cell::StaticCell;

use super::resources::{Irqs, WifiResources};

/// Join attempts before the board gives up on the network
const MAX_JOIN_ATTEMPTS: u8 = 5;

/// Upper bound for a single join attempt
const JOIN_TIMEOUT: Duration = Duration::from_secs(30);

/// First retry delay, doubled per attempt
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Sockets the stack can hold at once (DNS plus telemetry and mode polling)
const SOCKETS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum WifiError {
    /// No SSID was compiled in
    NotConfigured,
    /// Every join attempt failed
    JoinFailed,
}

/// Brings the network up and returns the stack once it holds an address
pub async fn start(
    spawner: Spawner,
    config: &WifiConfig,
    r: WifiResources,
) -> Result<Stack<'static>, WifiError> {
    if !config.is_configured() {
        log_info!("Wi-Fi not configured, telemetry disabled");
        return Err(WifiError::NotConfigured);
    }

    let fw = aligned_bytes!("../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");
    let nvram = aligned_bytes!("../../cyw43-firmware/nvram_rp2040.bin");

    let pwr = Output::new(r.pwr_pin, Level::Low);
    let cs = Output::new(r.cs_pin, Level::High);
    let mut pio = Pio::new(r.pio, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        r.dio_pin,
        r.clk_pin,
        r.dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw, nvram).await;
    spawner.spawn(wifi_task(runner).unwrap());

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    let mac = control.address().await;
    let seed = seed_from(mac, Instant::now().as_ticks());

    static RESOURCES: StaticCell<StackResources<SOCKETS>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner).unwrap());

    join(&mut control, config).await?;

    log_info!("Waiting for DHCP...");
    stack.wait_config_up().await;
    if let Some(v4) = stack.config_v4() {
        let ip = v4.address.address().octets();
        log_info!("DHCP address {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
    }

    // The driver needs its control handle for the lifetime of the link
    static CONTROL: StaticCell<Control<'static>> = StaticCell::new();
    CONTROL.init(control);

    Ok(stack)
}

async fn join(control: &mut Control<'static>, config: &WifiConfig) -> Result<(), WifiError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        log_info!(
            "Joining {} (attempt {}/{})",
            config.ssid,
            attempt,
            MAX_JOIN_ATTEMPTS
        );

        let options = JoinOptions::new(config.password.as_bytes());
        match with_timeout(JOIN_TIMEOUT, control.join(config.ssid, options)).await {
            Ok(Ok(())) => {
                log_info!("Wi-Fi connected");
                return Ok(());
            }
            Ok(Err(_)) => log_warn!("Join rejected on attempt {}", attempt),
            Err(_) => log_warn!("Join timed out on attempt {}", attempt),
        }

        if attempt >= MAX_JOIN_ATTEMPTS {
            log_error!("Wi-Fi unavailable after {} attempts", MAX_JOIN_ATTEMPTS);
            return Err(WifiError::JoinFailed);
        }

        // leave() clears the chip's half-joined state before the next try
        control.leave().await;
        let delay = retry_delay(attempt - 1);
        log_debug!("Retrying in {} ms", delay.as_millis());
        Timer::after(delay).await;
    }
}

/// Exponential backoff capped at 16 s
fn retry_delay(attempt: u8) -> Duration {
    INITIAL_RETRY_DELAY * (1u32 << attempt.min(4))
}

fn seed_from(mac: [u8; 6], ticks: u64) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..6].copy_from_slice(&mac);
    u64::from_le_bytes(bytes) ^ ticks.rotate_left(17)
}

#[embassy_executor::task]
async fn wifi_task(
    runner: cyw43::Runner<'static, cyw43::SpiBus<Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}
