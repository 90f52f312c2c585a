//! Remote mode polling
//!
//! Reads the mode field of the telemetry channel and forwards it to the
//! control loop. Only changes are forwarded, so a button press stays in effect
//! until someone edits the remote field again.

use embassy_time::Timer;
use smart_street_light::system::command::{self, ModeRequest};
use smart_street_light::system::mode::OperatingMode;
use smart_street_light::{log_debug, log_info};

use crate::board::uplink::ThingSpeakUplink;

#[embassy_executor::task]
pub async fn mode_poll(uplink: ThingSpeakUplink, interval: embassy_time::Duration) {
    let mut last: Option<OperatingMode> = None;

    loop {
        match uplink.fetch_mode().await {
            Ok(Some(mode)) if last != Some(mode) => {
                log_info!("Remote mode is {}", mode);
                command::request_mode(ModeRequest::named(mode.as_str()));
                last = Some(mode);
            }
            Ok(_) => {}
            Err(e) => log_debug!("Mode poll failed: {}", e),
        }

        Timer::after(interval).await;
    }
}
