//! Telemetry reporting
//!
//! Status reports go to a ThingSpeak-compatible HTTP API as a single GET:
//!
//! ```text
//! GET /update.json?api_key=KEY&field1=auto&field2=lights%20on&field3=12 HTTP/1.0
//! ```
//!
//! Requests are built as HTTP/1.0 so the server never answers with a chunked
//! body. This module only encodes requests and parses responses; moving the
//! bytes is up to the [`TelemetrySink`] implementation.

use core::fmt::Write;
use core::fmt;

use heapless::String;

use crate::system::config::TelemetryConfig;
use crate::system::error::TelemetryError;
use crate::system::mode::OperatingMode;

/// Request buffer size
pub const REQUEST_CAPACITY: usize = 384;

/// Encoded HTTP request
pub type Request = String<REQUEST_CAPACITY>;

/// Light status as reported to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum LightStatus {
    On,
    Off,
}

impl LightStatus {
    pub const fn from_level(high: bool) -> Self {
        if high {
            LightStatus::On
        } else {
            LightStatus::Off
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LightStatus::On => "lights on",
            LightStatus::Off => "lights off",
        }
    }
}

impl fmt::Display for LightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub struct Report {
    pub mode: OperatingMode,
    pub status: LightStatus,
    pub passage_count: u32,
}

/// Destination for status reports
///
/// Implementations must bound the time a single update may take; the control
/// loop awaits it inline.
#[allow(async_fn_in_trait)]
pub trait TelemetrySink {
    async fn update(&mut self, report: &Report) -> Result<(), TelemetryError>;
}

/// Parsed HTTP response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    pub status: u16,
    pub body: &'a [u8],
}

impl Response<'_> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, trimmed; empty if not UTF-8
    pub fn text(&self) -> &str {
        core::str::from_utf8(self.body).map(str::trim).unwrap_or("")
    }
}

/// Builds the status update request for `report`
pub fn update_request(config: &TelemetryConfig, report: &Report) -> Result<Request, TelemetryError> {
    if !config.reporting_enabled() {
        return Err(TelemetryError::NotConfigured);
    }

    let mut req = Request::new();
    push(&mut req, "GET ")?;
    push(&mut req, config.update_path)?;
    push(&mut req, "?api_key=")?;
    push_encoded(&mut req, config.api_key)?;
    push(&mut req, "&field1=")?;
    push_encoded(&mut req, report.mode.as_str())?;
    push(&mut req, "&field2=")?;
    push_encoded(&mut req, report.status.as_str())?;
    write!(req, "&field3={}", report.passage_count).map_err(|_| TelemetryError::Overflow)?;
    push_trailer(&mut req, config.host)?;
    Ok(req)
}

/// Builds the request fetching the last value of the remote mode field
pub fn mode_field_request(config: &TelemetryConfig) -> Result<Request, TelemetryError> {
    if !config.mode_polling_enabled() {
        return Err(TelemetryError::NotConfigured);
    }

    let mut req = Request::new();
    push(&mut req, "GET /channels/")?;
    push_encoded(&mut req, config.channel_id)?;
    write!(req, "/fields/{}/last.txt?api_key=", config.mode_field)
        .map_err(|_| TelemetryError::Overflow)?;
    push_encoded(&mut req, config.read_key)?;
    push_trailer(&mut req, config.host)?;
    Ok(req)
}

/// Splits a raw HTTP response into status code and body
pub fn parse_response(raw: &[u8]) -> Result<Response<'_>, TelemetryError> {
    // "HTTP/1.x NNN ..."
    if raw.len() < 12 || !raw.starts_with(b"HTTP/1.") || raw[8] != b' ' {
        return Err(TelemetryError::Malformed);
    }

    let mut status: u16 = 0;
    for &digit in &raw[9..12] {
        if !digit.is_ascii_digit() {
            return Err(TelemetryError::Malformed);
        }
        status = status * 10 + u16::from(digit - b'0');
    }

    let body = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|end| &raw[end + 4..])
        .unwrap_or(&[]);

    Ok(Response { status, body })
}

/// Parses a response and turns non-2xx statuses into [`TelemetryError::Rejected`]
pub fn acknowledged(raw: &[u8]) -> Result<Response<'_>, TelemetryError> {
    let response = parse_response(raw)?;
    if response.is_success() {
        Ok(response)
    } else {
        Err(TelemetryError::Rejected(response.status))
    }
}

fn push(req: &mut Request, s: &str) -> Result<(), TelemetryError> {
    req.push_str(s).map_err(|_| TelemetryError::Overflow)
}

fn push_trailer(req: &mut Request, host: &str) -> Result<(), TelemetryError> {
    push(req, " HTTP/1.0\r\nHost: ")?;
    push(req, host)?;
    push(req, "\r\nConnection: close\r\n\r\n")
}

/// Percent-encodes everything outside the RFC 3986 unreserved set
fn push_encoded(req: &mut Request, s: &str) -> Result<(), TelemetryError> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in s.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            req.push(char::from(b)).map_err(|_| TelemetryError::Overflow)?;
        } else {
            for c in [b'%', HEX[usize::from(b >> 4)], HEX[usize::from(b & 0x0f)]] {
                req.push(char::from(c)).map_err(|_| TelemetryError::Overflow)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelemetryConfig {
        TelemetryConfig {
            api_key: "WRITE KEY",
            read_key: "READKEY",
            channel_id: "424242",
            ..TelemetryConfig::default()
        }
    }

    fn report() -> Report {
        Report {
            mode: OperatingMode::Auto,
            status: LightStatus::On,
            passage_count: 12,
        }
    }

    #[test]
    fn update_request_carries_all_fields() {
        let req = update_request(&config(), &report()).unwrap();
        assert_eq!(
            req.as_str(),
            "GET /update.json?api_key=WRITE%20KEY&field1=auto&field2=lights%20on&field3=12 HTTP/1.0\r\n\
             Host: api.thingspeak.com\r\n\
             Connection: close\r\n\r\n"
        );
    }

    #[test]
    fn update_request_needs_write_key() {
        let config = TelemetryConfig {
            api_key: "",
            ..config()
        };
        assert_eq!(
            update_request(&config, &report()),
            Err(TelemetryError::NotConfigured)
        );
    }

    #[test]
    fn oversized_key_overflows_instead_of_truncating() {
        let key: &'static str = "k".repeat(REQUEST_CAPACITY).leak();
        let config = TelemetryConfig {
            api_key: key,
            ..config()
        };
        assert_eq!(update_request(&config, &report()), Err(TelemetryError::Overflow));
    }

    #[test]
    fn mode_field_request_targets_last_value() {
        let req = mode_field_request(&config()).unwrap();
        assert!(req.starts_with("GET /channels/424242/fields/4/last.txt?api_key=READKEY HTTP/1.0\r\n"));
    }

    #[test]
    fn parses_status_and_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n on\r\n";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(response.text(), "on");
    }

    #[test]
    fn headers_only_response_has_empty_body() {
        let response = parse_response(b"HTTP/1.0 204 No Content\r\n").unwrap();
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn non_success_status_is_rejected() {
        let raw = b"HTTP/1.1 400 Bad Request\r\n\r\n-1";
        assert_eq!(acknowledged(raw), Err(TelemetryError::Rejected(400)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(parse_response(b""), Err(TelemetryError::Malformed));
        assert_eq!(parse_response(b"SSH-2.0-OpenSSH_9.6"), Err(TelemetryError::Malformed));
        assert_eq!(parse_response(b"HTTP/1.1 2x0 OK\r\n"), Err(TelemetryError::Malformed));
    }
}
