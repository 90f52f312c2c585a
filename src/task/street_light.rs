//! Street light control loop
//!
//! Runs one decision cycle after another, applying mode requests from the
//! button and the remote mode field between cycles. On shutdown the light is
//! switched off and its pins released before the task ends.

use embassy_time::Timer;
use smart_street_light::system::command;
use smart_street_light::system::Error;
use smart_street_light::{log_error, log_info, log_warn};

use crate::board::StreetLight;

#[embassy_executor::task]
pub async fn street_light(mut light: StreetLight) {
    log_info!("Street light started in {} mode", light.mode());

    let mut light = light.reset_guard();
    loop {
        if command::shutdown_requested() {
            log_info!("Shutdown requested");
            break;
        }

        if let Some(request) = command::take_mode_request() {
            if let Err(e) = light.apply(&request) {
                log_warn!("Ignoring mode request: {}", e);
            }
        }

        match light.step().await {
            Ok(cycle) => Timer::after(cycle.wait()).await,
            Err(Error::HardwareLine(e)) => {
                log_error!("Street light stopped: {}", e);
                break;
            }
            Err(e) => log_warn!("Cycle failed: {}", e),
        }
    }
    // guard drops here: light off, lines released, counter logged
}
