//! On-board sensors behind the shared [`SensorSource`] interface.

mod bmp280;
mod dht;

use log::warn;

use weather_monitor_common::sensor::{pressure_altitude, SensorSource};

pub use bmp280::Bmp280;
pub use dht::Dht;

/// DHT data pin on the reference board.
const DHT_PIN: i32 = 32;

/// Both on-board sensors as one source.
///
/// The DHT answers a single transaction with both temperature and humidity,
/// so the transaction runs on the temperature read and the humidity read
/// consumes the cached half. Same for the altitude, which is derived from
/// the most recent pressure read.
pub struct BoardSensors<I> {
    dht: Dht,
    bmp: Bmp280<I>,
    last_dht: Option<(f32, f32)>,
    last_pressure: f32,
}

impl<I: embedded_hal::i2c::I2c> BoardSensors<I> {
    pub fn new(i2c: I) -> anyhow::Result<Self> {
        Ok(Self {
            dht: Dht::new(DHT_PIN),
            bmp: Bmp280::new(i2c)?,
            last_dht: None,
            last_pressure: f32::NAN,
        })
    }
}

impl<I: embedded_hal::i2c::I2c> SensorSource for BoardSensors<I> {
    fn read_temperature(&mut self) -> f32 {
        match self.dht.read() {
            Ok(sample) => {
                self.last_dht = Some(sample);
                sample.0
            }
            Err(e) => {
                warn!("dht read failed: {e:?}");
                self.last_dht = None;
                f32::NAN
            }
        }
    }

    fn read_humidity(&mut self) -> f32 {
        self.last_dht.map_or(f32::NAN, |(_, humidity)| humidity)
    }

    fn read_pressure(&mut self) -> f32 {
        match self.bmp.read_pressure_hpa() {
            Ok(hpa) => {
                self.last_pressure = hpa;
                hpa
            }
            Err(e) => {
                warn!("bmp280 read failed: {e:?}");
                self.last_pressure = f32::NAN;
                f32::NAN
            }
        }
    }

    fn read_altitude(&mut self, reference_hpa: f32) -> f32 {
        pressure_altitude(self.last_pressure, reference_hpa)
    }
}
