//! BMP280 pressure sensor behind the bme280-rs driver (register compatible,
//! the humidity channel simply reads as absent).

use bme280_rs::{Bme280, Configuration, Oversampling, SensorMode};
use esp_idf_svc::hal::delay::Delay;

const ADDRESS: u8 = 0x76;

#[derive(Debug)]
pub enum Bmp280Error {
    /// I2C transaction failed.
    Bus,
    /// No measurement available yet.
    NotReady,
}

pub struct Bmp280<I> {
    sensor: Bme280<I, Delay>,
}

impl<I: embedded_hal::i2c::I2c> Bmp280<I> {
    pub fn new(i2c: I) -> anyhow::Result<Self> {
        let mut sensor = Bme280::new_with_address(i2c, ADDRESS, Delay::new_default());
        sensor
            .init()
            .map_err(|e| anyhow::anyhow!("bmp280 init: {e:?}"))?;

        let configuration = Configuration::default()
            .with_temperature_oversampling(Oversampling::Oversample1)
            .with_pressure_oversampling(Oversampling::Oversample1)
            .with_sensor_mode(SensorMode::Normal);
        sensor
            .set_sampling_configuration(configuration)
            .map_err(|e| anyhow::anyhow!("bmp280 configuration: {e:?}"))?;

        Ok(Self { sensor })
    }

    /// Station pressure in hPa.
    pub fn read_pressure_hpa(&mut self) -> Result<f32, Bmp280Error> {
        let pascal = self
            .sensor
            .read_pressure()
            .map_err(|_| Bmp280Error::Bus)?
            .ok_or(Bmp280Error::NotReady)?;

        Ok(pascal / 100.0)
    }
}
