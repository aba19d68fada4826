//! ESP32-C3 SuperMini proximity fence firmware.
//!
//! Brings up the board, then hands the main task to the control server:
//! - VL53L0X ranging and the on-die temperature sensor are polled whenever
//!   the server is waiting for a client
//! - The BOOT button clears the alarm from its GPIO interrupt
//! - An `esp_timer` blinks the onboard LED while the alarm is latched
//! - The control page is served on port 80 over station-mode WiFi
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=MyNetwork WIFI_PASSWORD=secret \
//!     cargo build --release --features wifi --bin esp32_main
//! ```

use anyhow::anyhow;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use fence_sentry::hal::esp32::{
    led, start_indicator_timer, Esp32ResetButton, Esp32Temperature, Esp32Transport, Esp32Wifi,
};
use fence_sentry::hal::Vl53l0x;
use fence_sentry::{
    AlarmConfig, Config, ConnectionServer, DeviceState, IndicatorDriver, Monitor, Reading,
    SensorPoll, SensorSource, WifiConfig,
};

static DEVICE: DeviceState = DeviceState::new(AlarmConfig::DEFAULT_FENCE_MM);

/// Sensor poll that also re-arms the reset button interrupt.
struct FirmwarePoll<D, T> {
    monitor: Monitor<D, T>,
    button: Esp32ResetButton,
}

impl<D, T> SensorPoll for FirmwarePoll<D, T>
where
    Monitor<D, T>: SensorPoll,
{
    fn poll(&mut self, state: &DeviceState) -> Reading {
        if let Err(e) = self.button.rearm() {
            warn!("reset button re-arm failed: {}", e);
        }
        self.monitor.poll(state)
    }

    fn latest(&self) -> Reading {
        self.monitor.latest()
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    info!("================================");
    info!("  fence-sentry proximity alarm");
    info!("================================");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default().with_wifi(
        WifiConfig::default()
            .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
            .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
    );
    if !config.wifi.is_configured() {
        return Err(anyhow!("WiFi not configured (set WIFI_SSID/WIFI_PASSWORD)"));
    }
    DEVICE.fence.set(config.alarm.default_fence_mm);

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Range sensor (VL53L0X on GPIO6/7 I2C)
    // =========================================================================
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let mut tof = Vl53l0x::new(i2c);
    tof.init().map_err(|e| anyhow!("VL53L0X init failed: {}", e))?;
    info!("[OK] VL53L0X initialized (GPIO6/7 I2C)");

    // =========================================================================
    // Temperature sensor (on-die)
    // =========================================================================
    let temperature = Esp32Temperature::new(peripherals.temp_sensor)?;
    info!("[OK] Temperature sensor enabled");

    // =========================================================================
    // Indicator (GPIO8 LED) and its tick
    // =========================================================================
    let led = led(peripherals.pins.gpio8.into())?;
    let _blink = start_indicator_timer(
        IndicatorDriver::new(led),
        &DEVICE,
        config.indicator.tick_ms,
    )?;
    info!(
        "[OK] Indicator on GPIO8, {} ms blink",
        config.indicator.blink_period_ms()
    );

    // =========================================================================
    // Reset button (GPIO9, falling edge)
    // =========================================================================
    let button = Esp32ResetButton::new(peripherals.pins.gpio9.into(), &DEVICE)?;
    info!("[OK] Reset button on GPIO9");

    // =========================================================================
    // Network
    // =========================================================================
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;

    let mut poll = FirmwarePoll {
        monitor: Monitor::new(SensorSource::new(tof, temperature, &config.sensor)),
        button,
    };

    // =========================================================================
    // Serve until a stop request
    // =========================================================================
    let mut server = ConnectionServer::new(Esp32Transport::new(wifi), &DEVICE, config.server);
    if let Err(e) = server.run(&config.wifi, &mut poll) {
        error!("server aborted: {}", e);
        return Err(e.into());
    }

    info!("server stopped, halting");
    Ok(())
}
