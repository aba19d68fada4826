//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. Every default matches the
//! operational parameters the device ships with (port 80, 70 mm fence,
//! 50 mm calibration offset, 10 s socket timeouts, 1 s accept wait).
//!
//! # Example
//!
//! ```rust
//! use fence_sentry::config::{AlarmConfig, Config, ServerConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.server.port, 80);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_server(ServerConfig::default().with_port(8080))
//!     .with_alarm(AlarmConfig::default().with_default_fence_mm(120));
//! ```

use heapless::String as HString;

/// Maximum length for config strings (SSIDs, passphrases, names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete device configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// Control page listener configuration
    pub server: ServerConfig,
    /// Sensor calibration
    pub sensor: SensorConfig,
    /// Alarm fence configuration
    pub alarm: AlarmConfig,
    /// Indicator blink configuration
    pub indicator: IndicatorConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set sensor configuration
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set alarm configuration
    pub fn with_alarm(mut self, alarm: AlarmConfig) -> Self {
        self.alarm = alarm;
        self
    }

    /// Set indicator configuration
    pub fn with_indicator(mut self, indicator: IndicatorConfig) -> Self {
        self.indicator = indicator;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// Control page listener configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// TCP port to listen on
    pub port: u16,
    /// How long to wait for a client before re-polling the sensors
    pub accept_timeout_ms: u32,
    /// Receive timeout for the single request read
    pub receive_timeout_ms: u32,
    /// Send timeout for the response write
    pub send_timeout_ms: u32,
    /// Which `=` in the request carries the new fence value
    pub fence_field_index: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 80,
            accept_timeout_ms: 1000,
            receive_timeout_ms: 10_000,
            send_timeout_ms: 10_000,
            fence_field_index: 7,
        }
    }
}

impl ServerConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the accept wait
    pub fn with_accept_timeout_ms(mut self, ms: u32) -> Self {
        self.accept_timeout_ms = ms;
        self
    }

    /// Set the receive timeout
    pub fn with_receive_timeout_ms(mut self, ms: u32) -> Self {
        self.receive_timeout_ms = ms;
        self
    }

    /// Set the send timeout
    pub fn with_send_timeout_ms(mut self, ms: u32) -> Self {
        self.send_timeout_ms = ms;
        self
    }

    /// Set the fence field position
    pub fn with_fence_field_index(mut self, index: usize) -> Self {
        self.fence_field_index = index;
        self
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// Sensor calibration configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Experimentally determined offset subtracted from every raw range
    pub calibration_offset_mm: u16,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            calibration_offset_mm: 50,
        }
    }
}

impl SensorConfig {
    /// Set the calibration offset
    pub fn with_calibration_offset_mm(mut self, mm: u16) -> Self {
        self.calibration_offset_mm = mm;
        self
    }
}

// ============================================================================
// Alarm Config
// ============================================================================

/// Alarm fence configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmConfig {
    /// Fence distance at power-up, in millimeters
    pub default_fence_mm: i32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            default_fence_mm: Self::DEFAULT_FENCE_MM,
        }
    }
}

impl AlarmConfig {
    /// Power-up fence distance the device ships with
    pub const DEFAULT_FENCE_MM: i32 = 70;

    /// Set the power-up fence distance
    pub fn with_default_fence_mm(mut self, mm: i32) -> Self {
        self.default_fence_mm = mm;
        self
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// Indicator blink configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorConfig {
    /// Tick period; the LED toggles once per tick while triggered
    pub tick_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self { tick_ms: 1000 }
    }
}

impl IndicatorConfig {
    /// Set the tick period
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms;
        self
    }

    /// Visible blink period (one on phase plus one off phase)
    pub fn blink_period_ms(&self) -> u32 {
        self.tick_ms.saturating_mul(2)
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// Network SSID
    pub ssid: ShortString,
    /// WPA2 passphrase
    pub password: ShortString,
    /// Association timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Maximum association attempts before giving up
    pub max_retries: u8,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
            max_retries: 5,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the maximum retry count
    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("fence-sentry"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
