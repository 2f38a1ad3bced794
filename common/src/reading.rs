use serde::{Deserialize, Serialize};

/// Header line of the persistent CSV log. Field order is part of the on-disk
/// format and must not change.
pub const CSV_HEADER: &str = "Timestamp,Temperature,Humidity,Pressure,Altitude";

/// Timestamp format embedded in readings and log records,
/// e.g. `31-12-2024 | 23:59:59`.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y | %H:%M:%S";

/// Placeholder timestamp used while the wall clock has not synchronized yet.
pub const UNSYNCED: &str = "unsynced";

/// One complete snapshot of all sensor measurements plus timestamp.
///
/// Replaced wholesale each tick, never field-by-field.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: f32,
    pub altitude: f32,
    pub timestamp: String,
}

impl Reading {
    /// A reading is valid only when every numeric field was sampled
    /// successfully. A single NaN sentinel makes the whole snapshot partial.
    pub fn is_valid(&self) -> bool {
        self.temperature.is_finite()
            && self.humidity.is_finite()
            && self.pressure.is_finite()
            && self.altitude.is_finite()
    }

    /// Serializes the reading as one log record line, `\n`-terminated,
    /// numeric fields fixed to two decimal places.
    pub fn to_csv_record(&self) -> String {
        format!(
            "{},{:.2},{:.2},{:.2},{:.2}\n",
            self.timestamp, self.temperature, self.humidity, self.pressure, self.altitude
        )
    }
}

#[test]
fn csv_record_is_bit_exact() {
    let reading = Reading {
        temperature: 22.5,
        humidity: 60.1,
        pressure: 1008.3,
        altitude: 45.0,
        timestamp: "01-01-2024 | 00:00:00".into(),
    };
    assert_eq!(
        reading.to_csv_record(),
        "01-01-2024 | 00:00:00,22.50,60.10,1008.30,45.00\n"
    );
}

#[test]
fn nan_field_invalidates_the_whole_reading() {
    let mut reading = Reading {
        temperature: 21.0,
        humidity: 50.0,
        pressure: 1010.0,
        altitude: 12.0,
        timestamp: String::new(),
    };
    assert!(reading.is_valid());

    reading.humidity = f32::NAN;
    assert!(!reading.is_valid());
}
