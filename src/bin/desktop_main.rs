//! Desktop simulator for the proximity fence.
//!
//! Runs the real control server on a local TCP port with simulated sensors:
//! - An object sweeps toward and away from the sensor, now and then leaving
//!   range entirely
//! - Pressing Enter on stdin acts as the reset button
//! - The alarm indicator is a log line on a tick thread
//!
//! # Usage
//!
//! ```bash
//! cargo run --features desktop --bin desktop_main
//! # then open http://127.0.0.1:8080/
//!
//! FENCE_SENTRY_PORT=9000 RUST_LOG=debug cargo run --features desktop --bin desktop_main
//! ```

use std::env;
use std::io::{self, BufRead};
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use log::info;

use fence_sentry::hal::TcpTransport;
use fence_sentry::{
    AlarmConfig, Config, ConnectionServer, DeviceState, DistanceSensor, Indicator,
    IndicatorDriver, Monitor, SensorSource, ServerConfig, TemperatureSensor,
};

/// Default listening port (80 needs privileges on most desktops).
const DEFAULT_PORT: u16 = 8080;

static DEVICE: DeviceState = DeviceState::new(AlarmConfig::DEFAULT_FENCE_MM);

// =============================================================================
// Simulated Hardware
// =============================================================================

/// Raw range that walks back and forth, leaving range at the far end.
struct SweepDistance {
    raw_mm: u16,
    approaching: bool,
}

impl SweepDistance {
    const NEAREST: u16 = 60;
    const FARTHEST: u16 = 600;
    const STEP: u16 = 15;
    const OUT_OF_RANGE: u16 = 8190;
}

impl DistanceSensor for SweepDistance {
    type Error = core::convert::Infallible;

    fn read_distance_mm(&mut self) -> Result<u16, Self::Error> {
        if self.approaching {
            self.raw_mm = self.raw_mm.saturating_sub(Self::STEP).max(Self::NEAREST);
            self.approaching = self.raw_mm > Self::NEAREST;
        } else {
            self.raw_mm = self.raw_mm.saturating_add(Self::STEP);
            if self.raw_mm >= Self::FARTHEST {
                self.approaching = true;
                return Ok(Self::OUT_OF_RANGE);
            }
        }
        Ok(self.raw_mm)
    }
}

/// Room temperature with a slow one-degree wobble.
struct RoomTemperature {
    reads: u32,
}

impl TemperatureSensor for RoomTemperature {
    type Error = core::convert::Infallible;

    fn read_temperature_c(&mut self) -> Result<u8, Self::Error> {
        self.reads = self.reads.wrapping_add(1);
        Ok(if (self.reads / 30) % 2 == 0 { 22 } else { 23 })
    }
}

/// Indicator that logs level changes.
struct LogIndicator {
    lit: bool,
}

impl Indicator for LogIndicator {
    type Error = core::convert::Infallible;

    fn set_lit(&mut self, lit: bool) -> Result<(), Self::Error> {
        if lit != self.lit {
            info!("indicator {}", if lit { "ON" } else { "off" });
        }
        self.lit = lit;
        Ok(())
    }
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = env::var("FENCE_SENTRY_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let config = Config::default().with_server(ServerConfig::default().with_port(port));

    info!("================================");
    info!("  {} desktop simulator", config.device.name);
    info!("================================");
    DEVICE.fence.set(config.alarm.default_fence_mm);
    info!("fence {} mm, press Enter to reset the alarm", DEVICE.fence.get());

    // Reset button: one line on stdin
    thread::spawn(|| {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() {
                break;
            }
            if DEVICE.alarm.clear().is_triggered() {
                info!("alarm reset");
            }
        }
    });

    // Indicator tick
    let tick = Duration::from_millis(u64::from(config.indicator.tick_ms));
    thread::spawn(move || {
        let mut driver = IndicatorDriver::new(LogIndicator { lit: false });
        loop {
            thread::sleep(tick);
            driver.tick(&DEVICE.alarm);
        }
    });

    let sensors = SensorSource::new(
        SweepDistance {
            raw_mm: SweepDistance::FARTHEST / 2,
            approaching: true,
        },
        RoomTemperature { reads: 0 },
        &config.sensor,
    );
    let mut monitor = Monitor::new(sensors);

    let transport = TcpTransport::new(Ipv4Addr::LOCALHOST);
    let mut server = ConnectionServer::new(transport, &DEVICE, config.server);
    server.run(&config.wifi, &mut monitor)?;

    info!("shutting down");
    Ok(())
}
