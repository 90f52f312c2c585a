//! Command Module
//!
//! Carries requests from the button and the remote mode poller to the control
//! task. Uses embassy-sync Signals, so only the most recent mode request
//! survives until the control task picks it up.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::String;

/// Longest mode name accepted from the remote field
pub const MODE_NAME_CAPACITY: usize = 16;

/// Signal for mode change requests
static MODE_REQUEST: Signal<CriticalSectionRawMutex, ModeRequest> = Signal::new();

/// Signal for shutdown requests
static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Mode change request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeRequest {
    /// Advance to the next mode (button press)
    Cycle,
    /// Switch to a mode given by name; validated by the controller
    Named(String<MODE_NAME_CAPACITY>),
}

impl ModeRequest {
    /// Request from raw text; names longer than the buffer are cut, and then
    /// fail validation like any other unknown name
    pub fn named(text: &str) -> Self {
        let mut name = String::new();
        for c in text.trim().chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        ModeRequest::Named(name)
    }
}

/// Signals a mode change request, replacing any request not yet taken
pub fn request_mode(request: ModeRequest) {
    MODE_REQUEST.signal(request);
}

/// Takes the pending mode request, if any, without waiting
pub fn take_mode_request() -> Option<ModeRequest> {
    MODE_REQUEST.try_take()
}

/// Asks the control task to reset the light and stop
pub fn request_shutdown() {
    SHUTDOWN.signal(());
}

/// Consumes a pending shutdown request
pub fn shutdown_requested() -> bool {
    SHUTDOWN.try_take().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_mode_request_wins() {
        request_mode(ModeRequest::Cycle);
        request_mode(ModeRequest::named("off"));
        assert_eq!(take_mode_request(), Some(ModeRequest::named("off")));
        assert_eq!(take_mode_request(), None);
    }

    #[test]
    fn shutdown_is_consumed_once() {
        assert!(!shutdown_requested());
        request_shutdown();
        assert!(shutdown_requested());
        assert!(!shutdown_requested());
    }

    #[test]
    fn named_trims_and_bounds_text() {
        assert_eq!(
            ModeRequest::named("  on\r\n"),
            ModeRequest::Named(String::try_from("on").unwrap())
        );

        let ModeRequest::Named(name) = ModeRequest::named("a-very-long-mode-name-indeed") else {
            panic!("expected named request");
        };
        assert_eq!(name.len(), MODE_NAME_CAPACITY);
    }
}
