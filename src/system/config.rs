//! Street light configuration
//!
//! Defaults match the installed hardware. Credentials are baked in at build
//! time from environment variables; leaving one empty disables the feature
//! that needs it instead of failing the build.
//!
//! | Variable               | Used for                          |
//! |------------------------|-----------------------------------|
//! | `WIFI_SSID`            | network to join                   |
//! | `WIFI_PASSWORD`        | WPA2 passphrase                   |
//! | `TELEMETRY_WRITE_KEY`  | status updates                    |
//! | `TELEMETRY_READ_KEY`   | remote mode polling               |
//! | `TELEMETRY_CHANNEL_ID` | remote mode polling               |

use embassy_time::Duration;

use crate::system::mode::OperatingMode;

/// Detection threshold (cm)
pub const DEFAULT_DISTANCE_THRESHOLD_CM: f32 = 50.0;

/// Time the light is held on after a detection
pub const DEFAULT_DWELL: Duration = Duration::from_secs(10);

/// Pause between control cycles
pub const DEFAULT_CYCLE_DELAY: Duration = Duration::from_millis(500);

/// Longest wait for an echo edge. The HC-SR04 reports "nothing in range" with
/// a ~38 ms pulse, so this has to be a bit longer than that.
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_millis(40);

/// Controller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Objects at or below this distance count as a detection
    pub distance_threshold_cm: f32,
    /// Hold time after a detection
    pub dwell: Duration,
    /// Delay after every cycle
    pub cycle_delay: Duration,
    /// Per-edge echo timeout
    pub echo_timeout: Duration,
    /// Mode at power-up
    pub initial_mode: OperatingMode,
    /// Telemetry endpoint
    pub telemetry: TelemetryConfig,
    /// Wi-Fi credentials
    pub wifi: WifiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distance_threshold_cm: DEFAULT_DISTANCE_THRESHOLD_CM,
            dwell: DEFAULT_DWELL,
            cycle_delay: DEFAULT_CYCLE_DELAY,
            echo_timeout: DEFAULT_ECHO_TIMEOUT,
            initial_mode: OperatingMode::Auto,
            telemetry: TelemetryConfig::default(),
            wifi: WifiConfig::default(),
        }
    }
}

impl Config {
    pub fn with_threshold_cm(mut self, cm: f32) -> Self {
        self.distance_threshold_cm = cm;
        self
    }

    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    pub fn with_cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay = delay;
        self
    }

    pub fn with_echo_timeout(mut self, timeout: Duration) -> Self {
        self.echo_timeout = timeout;
        self
    }

    pub fn with_initial_mode(mut self, mode: OperatingMode) -> Self {
        self.initial_mode = mode;
        self
    }
}

/// Telemetry endpoint configuration (ThingSpeak-compatible HTTP API)
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Endpoint host name
    pub host: &'static str,
    /// Endpoint TCP port
    pub port: u16,
    /// Path of the update call
    pub update_path: &'static str,
    /// Write key sent with every update
    pub api_key: &'static str,
    /// Read key for the mode field
    pub read_key: &'static str,
    /// Channel holding the mode field
    pub channel_id: &'static str,
    /// Field number holding the requested mode
    pub mode_field: u8,
    /// Upper bound for one request, connect to last byte
    pub timeout: Duration,
    /// How often the mode field is fetched
    pub mode_poll_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            host: "api.thingspeak.com",
            port: 80,
            update_path: "/update.json",
            api_key: option_env!("TELEMETRY_WRITE_KEY").unwrap_or(""),
            read_key: option_env!("TELEMETRY_READ_KEY").unwrap_or(""),
            channel_id: option_env!("TELEMETRY_CHANNEL_ID").unwrap_or(""),
            mode_field: 4,
            timeout: Duration::from_secs(5),
            mode_poll_interval: Duration::from_secs(30),
        }
    }
}

impl TelemetryConfig {
    /// Status updates can be sent
    pub fn reporting_enabled(&self) -> bool {
        !self.host.is_empty() && !self.api_key.is_empty()
    }

    /// Mode field can be polled
    pub fn mode_polling_enabled(&self) -> bool {
        !self.host.is_empty() && !self.read_key.is_empty() && !self.channel_id.is_empty()
    }
}

/// Wi-Fi station credentials
#[derive(Debug, Clone)]
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: option_env!("WIFI_SSID").unwrap_or(""),
            password: option_env!("WIFI_PASSWORD").unwrap_or(""),
        }
    }
}

impl WifiConfig {
    /// Returns false if SSID is empty (skip Wi-Fi bring-up)
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}
