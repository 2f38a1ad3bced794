//! ESP32 firmware entry point: mounts storage, brings up wifi in AP+STA
//! mode, synchronizes the clock, starts the read-only HTTP endpoints and
//! then hands control to the shared station tick loop.

use std::cell::RefCell;

use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;

use weather_monitor_common::config::StationConfig;
use weather_monitor_common::station::WeatherStation;
use weather_monitor_common::telemetry::{TelemetryClient, TelemetryConfig};

mod clock;
mod screen;
mod sensors;
mod server;
mod storage;
mod transport;
mod wifi;

/// Telemetry channel number and its write credential, baked in at build time.
const CHANNEL: u32 = 1;
const WRITE_KEY: &str = env!("TELEMETRY_WRITE_KEY");

/// Pause between scheduler ticks. Sampling and display refresh happen every
/// tick; uploads are gated by the station's own interval.
const TICK_PAUSE_MS: u32 = 250;

fn main() -> anyhow::Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    EspLogger::initialize_default();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    storage::mount()?;

    // One I2C bus shared between the OLED (0x3C) and the BMP280 (0x76).
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let i2c_bus = RefCell::new(i2c);

    let mut screen = screen::OledScreen::new(RefCellDevice::new(&i2c_bus))?;
    screen.loading_frame();

    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let link = wifi::EspLink::start(wifi)?;

    let clock = clock::EspClock::synchronize()?;

    let sensors = sensors::BoardSensors::new(RefCellDevice::new(&i2c_bus))?;

    let config = StationConfig {
        log_path: storage::log_path(),
        ..Default::default()
    };

    // The read endpoints only need the log path; they run on the http
    // server's own threads.
    let _server = server::start(config.log_path.clone())?;

    let telemetry = TelemetryClient::new(
        transport::EspTransport::new()?,
        TelemetryConfig {
            channel: CHANNEL,
            write_key: WRITE_KEY.into(),
            ..Default::default()
        },
    );

    let mut station = WeatherStation::new(config, clock, sensors, screen, link, telemetry);
    station.initialize();

    info!("entering tick loop");
    loop {
        station.tick();
        FreeRtos::delay_ms(TICK_PAUSE_MS);
    }
}
