//! Telemetry sink posting to a ThingSpeak-compatible channel

use embassy_net::Stack;
use smart_street_light::system::config::TelemetryConfig;
use smart_street_light::system::error::TelemetryError;
use smart_street_light::system::mode::OperatingMode;
use smart_street_light::system::telemetry::{self, Report, TelemetrySink};
use smart_street_light::log_debug;

use super::http;

const RESPONSE_BUFFER: usize = 512;

/// Sends status reports over HTTP
///
/// Without a network stack, or without a write key, every update fails with
/// [`TelemetryError::NotConfigured`]; the controller logs that and carries on.
pub struct ThingSpeakUplink {
    stack: Option<Stack<'static>>,
    config: TelemetryConfig,
}

impl ThingSpeakUplink {
    pub fn new(stack: Option<Stack<'static>>, config: TelemetryConfig) -> Self {
        Self { stack, config }
    }

    /// Fetches the mode requested on the remote mode field
    ///
    /// `Ok(None)` means the field is empty or holds something that is not a
    /// mode name.
    pub async fn fetch_mode(&self) -> Result<Option<OperatingMode>, TelemetryError> {
        let stack = self.stack.ok_or(TelemetryError::NotConfigured)?;
        let request = telemetry::mode_field_request(&self.config)?;

        let mut buf = [0u8; RESPONSE_BUFFER];
        let len = http::exchange(
            stack,
            self.config.host,
            self.config.port,
            request.as_bytes(),
            &mut buf,
            self.config.timeout,
        )
        .await?;

        let response = telemetry::acknowledged(&buf[..len])?;
        Ok(response.text().parse().ok())
    }
}

impl TelemetrySink for ThingSpeakUplink {
    async fn update(&mut self, report: &Report) -> Result<(), TelemetryError> {
        let stack = self.stack.ok_or(TelemetryError::NotConfigured)?;
        let request = telemetry::update_request(&self.config, report)?;

        let mut buf = [0u8; RESPONSE_BUFFER];
        let len = http::exchange(
            stack,
            self.config.host,
            self.config.port,
            request.as_bytes(),
            &mut buf,
            self.config.timeout,
        )
        .await?;

        let response = telemetry::acknowledged(&buf[..len])?;
        log_debug!("Telemetry accepted, entry {}", response.text());
        Ok(())
    }
}
