//! Desktop bench run of the firmware loop: the real scheduler against
//! simulated sensors, a console display, a logging telemetry transport and a
//! CSV log in the working directory.

use std::time::Duration;

use weather_monitor_common::clock::SystemClock;
use weather_monitor_common::config::StationConfig;
use weather_monitor_common::connectivity::NetworkLink;
use weather_monitor_common::screen::ConsoleScreen;
use weather_monitor_common::sensor::DummySensor;
use weather_monitor_common::station::WeatherStation;
use weather_monitor_common::telemetry::{
    TelemetryClient, TelemetryConfig, Transport, TransportError,
};

/// Always-up link, so bench runs never enter the blocking retry loop.
struct LoopbackLink;

impl NetworkLink for LoopbackLink {
    fn join(&mut self) {}

    fn is_up(&self) -> bool {
        true
    }
}

/// Transport that logs the would-be channel write instead of sending it.
struct LoggingTransport;

impl Transport for LoggingTransport {
    fn post(&mut self, url: &str, body: &str) -> Result<u16, TransportError> {
        log::info!("-> POST {url} {body}");
        Ok(200)
    }
}

/// Our App struct that holds the station and drives its tick loop.
struct App {
    station: WeatherStation<SystemClock, DummySensor, ConsoleScreen, LoopbackLink, LoggingTransport>,
}

impl App {
    /// Pause between ticks; on the device the loop spins much faster, but a
    /// bench run does not need to busy-wait.
    const TICK_PAUSE: Duration = Duration::from_millis(250);

    fn new() -> anyhow::Result<Self> {
        let config = StationConfig::default();
        let telemetry = TelemetryClient::new(LoggingTransport, TelemetryConfig::default());

        let station = WeatherStation::new(
            config,
            SystemClock::new(),
            DummySensor::new()?,
            ConsoleScreen,
            LoopbackLink,
            telemetry,
        );

        Ok(Self { station })
    }

    fn run(&mut self) -> ! {
        self.station.initialize();

        loop {
            self.station.tick();
            std::thread::sleep(Self::TICK_PAUSE);
        }
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run()
}
