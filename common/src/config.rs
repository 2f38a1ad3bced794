use std::path::PathBuf;

use crate::connectivity::RetryPolicy;

/// Device-wide configuration, fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct StationConfig {
    /// Minimum spacing between upload/persistence cycles, in milliseconds.
    /// Must be positive.
    pub upload_interval_ms: u32,

    /// Local sea-level pressure used for altitude, in hPa.
    pub reference_pressure_hpa: f32,

    /// Where the CSV log lives.
    pub log_path: PathBuf,

    /// Reset the log to header-only on every start. This reproduces the
    /// original firmware; set to `false` to keep history across restarts.
    pub truncate_on_init: bool,

    /// Connectivity retry behavior.
    pub retry: RetryPolicy,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            upload_interval_ms: 5_000,
            reference_pressure_hpa: 1_006.0,
            log_path: PathBuf::from("WeatherData.csv"),
            truncate_on_init: true,
            retry: RetryPolicy::default(),
        }
    }
}
