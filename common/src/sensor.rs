use serde::Deserialize;

/// Produces raw sensor values on demand.
///
/// Implementations return `f32::NAN` when a measurement transiently fails.
/// No retry happens at this layer; the sentinel passes through into the
/// reading as-is.
pub trait SensorSource {
    fn read_temperature(&mut self) -> f32;
    fn read_humidity(&mut self) -> f32;
    fn read_pressure(&mut self) -> f32;
    /// Altitude in meters, derived from `reference_hpa`, the local sea-level
    /// pressure.
    fn read_altitude(&mut self, reference_hpa: f32) -> f32;
}

/// Barometric altitude in meters from station pressure and the sea-level
/// reference, both in hPa (international barometric formula).
pub fn pressure_altitude(pressure_hpa: f32, reference_hpa: f32) -> f32 {
    44_330.0 * (1.0 - (pressure_hpa / reference_hpa).powf(1.0 / 5.255))
}

/// Simulated sensor backed by baseline values embedded as JSON, with a small
/// drift per sample so bench runs produce changing data.
#[derive(Deserialize)]
pub struct DummySensor {
    temperature: f32,
    humidity: f32,
    pressure: f32,
    #[serde(skip)]
    samples: u32,
}

impl DummySensor {
    pub fn new() -> Result<Self, serde_json::Error> {
        serde_json::from_str(include_str!("./dummysensor.json"))
    }

    fn drift(&self) -> f32 {
        (self.samples % 16) as f32 * 0.05
    }
}

impl SensorSource for DummySensor {
    fn read_temperature(&mut self) -> f32 {
        self.samples = self.samples.wrapping_add(1);
        self.temperature + self.drift()
    }

    fn read_humidity(&mut self) -> f32 {
        self.humidity + self.drift()
    }

    fn read_pressure(&mut self) -> f32 {
        self.pressure
    }

    fn read_altitude(&mut self, reference_hpa: f32) -> f32 {
        pressure_altitude(self.pressure, reference_hpa)
    }
}

#[test]
fn test_dummy_sensor() {
    let mut sensor = DummySensor::new().unwrap();

    let temperature = sensor.read_temperature();
    assert!(temperature.is_finite());
    assert!(sensor.read_humidity().is_finite());
    assert!((sensor.read_pressure() - 1008.3).abs() < f32::EPSILON);
}

#[test]
fn altitude_is_zero_at_reference_pressure() {
    assert!(pressure_altitude(1006.0, 1006.0).abs() < 0.01);
    // Lower station pressure means we are above sea level.
    assert!(pressure_altitude(1000.0, 1006.0) > 0.0);
}
