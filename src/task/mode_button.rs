//! Mode button handling
//!
//! A short press cycles AUTO → ON → OFF. Holding the button shuts the street
//! light down.

use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Level, Pull};
use embassy_time::{Duration, Timer};
use smart_street_light::system::command::{self, ModeRequest};
use smart_street_light::log_info;

use crate::board::resources::ModeButtonResources;

/// Hold time that counts as a shutdown request
const SHUTDOWN_HOLD: Duration = Duration::from_secs(3);

/// Button debounce delay
const DEBOUNCE_DURATION: Duration = Duration::from_millis(30);

#[embassy_executor::task]
pub async fn mode_button(r: ModeButtonResources) {
    let mut button = Input::new(r.pin, Pull::Down);

    loop {
        if debounce(&mut button).await != Level::High {
            continue;
        }

        match select(Timer::after(SHUTDOWN_HOLD), debounce(&mut button)).await {
            Either::First(()) => {
                log_info!("Mode button held, shutting down");
                command::request_shutdown();
                button.wait_for_low().await;
            }
            Either::Second(_) => command::request_mode(ModeRequest::Cycle),
        }
    }
}

/// Waits for the next stable level change
async fn debounce(button: &mut Input<'static>) -> Level {
    loop {
        let start = button.get_level();
        button.wait_for_any_edge().await;
        Timer::after(DEBOUNCE_DURATION).await;
        let end = button.get_level();
        if start != end {
            break end;
        }
    }
}
