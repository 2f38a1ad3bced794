//! Platform-agnostic core of the weather monitor firmware.
//!
//! Everything with real timing, failure-handling and ordering semantics lives
//! here: the tick scheduler, the connectivity manager, the telemetry uploader
//! and the persistent CSV log. Hardware access (sensors, display, wifi, HTTP)
//! happens behind the collaborator traits in [`sensor`], [`screen`],
//! [`connectivity`] and [`telemetry`], implemented per platform.

pub mod clock;
pub mod config;
pub mod connectivity;
pub mod datalog;
pub mod reading;
pub mod screen;
pub mod sensor;
pub mod station;
pub mod telemetry;

pub use reading::Reading;
pub use station::WeatherStation;
