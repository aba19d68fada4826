//! Station-mode WiFi plus the `std::net` listener.

use core::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use esp_idf_hal::sys::EspError;

use super::wifi::Esp32Wifi;
use crate::config::WifiConfig;
use crate::hal::tcp::{TcpTransport, TcpTransportError};
use crate::traits::Transport;

/// ESP32 transport error.
#[derive(Debug)]
pub enum Esp32TransportError {
    /// Radio or association failure.
    Wifi(EspError),
    /// Socket failure.
    Tcp(TcpTransportError),
}

impl fmt::Display for Esp32TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wifi(e) => write!(f, "WiFi error: {}", e),
            Self::Tcp(e) => write!(f, "TCP error: {}", e),
        }
    }
}

impl std::error::Error for Esp32TransportError {}

impl From<EspError> for Esp32TransportError {
    fn from(e: EspError) -> Self {
        Self::Wifi(e)
    }
}

impl From<TcpTransportError> for Esp32TransportError {
    fn from(e: TcpTransportError) -> Self {
        Self::Tcp(e)
    }
}

/// [`Transport`] over the ESP32's own WiFi station.
///
/// `init` starts the radio, `connect` joins the network, and everything
/// from `start_listener` on is plain sockets on all interfaces.
pub struct Esp32Transport {
    wifi: Esp32Wifi,
    tcp: TcpTransport,
}

impl Esp32Transport {
    /// Wrap a created (not yet started) WiFi driver.
    pub fn new(wifi: Esp32Wifi) -> Self {
        Self {
            wifi,
            tcp: TcpTransport::new(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// Access the WiFi driver.
    pub fn wifi(&self) -> &Esp32Wifi {
        &self.wifi
    }
}

impl Transport for Esp32Transport {
    type Error = Esp32TransportError;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(self.wifi.start()?)
    }

    fn connect(&mut self, credentials: &WifiConfig) -> Result<Ipv4Addr, Self::Error> {
        Ok(self.wifi.join(credentials)?)
    }

    fn start_listener(&mut self, port: u16) -> Result<(), Self::Error> {
        Ok(self.tcp.start_listener(port)?)
    }

    fn wait_for_client(&mut self, timeout_ms: u32) -> Result<Option<SocketAddrV4>, Self::Error> {
        Ok(self.tcp.wait_for_client(timeout_ms)?)
    }

    fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        Ok(self.tcp.receive(buf, timeout_ms)?)
    }

    fn send(&mut self, data: &[u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        Ok(self.tcp.send(data, timeout_ms)?)
    }

    fn close_connection(&mut self) -> Result<(), Self::Error> {
        Ok(self.tcp.close_connection()?)
    }

    fn stop_listener(&mut self) -> Result<(), Self::Error> {
        Ok(self.tcp.stop_listener()?)
    }
}
