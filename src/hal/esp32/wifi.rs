//! WiFi station management for ESP32-C3.
//!
//! Provides synchronous WiFi station mode using esp-idf-svc. Bring-up is
//! split the way the transport needs it: [`Esp32Wifi::new`] creates the
//! driver, [`start`](Esp32Wifi::start) powers the radio and
//! [`join`](Esp32Wifi::join) associates and waits for DHCP.
//!
//! # Example
//!
//! ```ignore
//! use fence_sentry::hal::esp32::Esp32Wifi;
//! use fence_sentry::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let mut wifi = Esp32Wifi::new(modem, sysloop, Some(nvs))?;
//! wifi.start()?;
//! let ip = wifi.join(&config)?;
//! ```

use core::time::Duration;
use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_hal::sys::EspError;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::config::WifiConfig;

/// WiFi connection manager for ESP32.
pub struct Esp32Wifi {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl Esp32Wifi {
    /// Create the WiFi driver without starting it.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, EspError> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
        Ok(Self { wifi })
    }

    /// Power up the radio in station mode.
    pub fn start(&mut self) -> Result<(), EspError> {
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        info!("[wifi] starting");
        self.wifi.start()
    }

    /// Associate with the configured access point and wait for an address.
    ///
    /// Association is attempted up to `max_retries` times; the DHCP wait is
    /// bounded by `connect_timeout_ms`.
    pub fn join(&mut self, config: &WifiConfig) -> Result<Ipv4Addr, EspError> {
        // Create heapless strings for esp-idf
        let mut ssid: heapless::String<32> = heapless::String::new();
        let _ = ssid.push_str(config.ssid.as_str());
        let mut password: heapless::String<64> = heapless::String::new();
        let _ = password.push_str(config.password.as_str());

        self.wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid,
            password,
            ..Default::default()
        }))?;

        let attempts = config.max_retries.max(1);
        let mut attempt = 1;
        loop {
            info!("[wifi] connecting to '{}' ({}/{})", config.ssid, attempt, attempts);
            match self.wifi.connect() {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!("[wifi] connect failed: {}", e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!("[wifi] waiting for DHCP");
        let timeout = Duration::from_millis(u64::from(config.connect_timeout_ms));
        self.wifi
            .ip_wait_while(|wifi| wifi.is_up().map(|up| !up), Some(timeout))?;

        let ip = self.wifi.wifi().sta_netif().get_ip_info()?.ip;
        info!("[wifi] connected, ip {}", ip);
        Ok(ip)
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Check if WiFi is connected.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
