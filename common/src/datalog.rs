use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::reading::{Reading, CSV_HEADER};

/// Why a log operation failed. None of these are fatal to the loop; the
/// scheduler reports them and continues with degraded persistence.
#[derive(Debug)]
pub enum StorageError {
    /// The backing filesystem could not be mounted.
    Mount(String),
    /// The log file could not be opened.
    Open(io::Error),
    /// The record could not be written.
    Write(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Mount(detail) => write!(f, "filesystem mount failed: {detail}"),
            StorageError::Open(e) => write!(f, "log open failed: {e}"),
            StorageError::Write(e) => write!(f, "log write failed: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Mount(_) => None,
            StorageError::Open(e) | StorageError::Write(e) => Some(e),
        }
    }
}

/// Append-only CSV record of readings on local storage.
///
/// The file handle is acquired per operation and released immediately after,
/// so it is closed even when a write fails partway.
pub struct DataLog {
    path: PathBuf,
    truncate_on_init: bool,
}

impl DataLog {
    pub fn new(path: impl Into<PathBuf>, truncate_on_init: bool) -> Self {
        Self {
            path: path.into(),
            truncate_on_init,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the fixed header line. With `truncate_on_init` (the original
    /// firmware's behavior) any prior content is discarded on every start;
    /// without it an existing non-empty log is left untouched.
    pub fn initialize(&self) -> Result<(), StorageError> {
        if !self.truncate_on_init {
            if let Ok(meta) = std::fs::metadata(&self.path) {
                if meta.len() > 0 {
                    debug!("keeping existing log at {}", self.path.display());
                    return Ok(());
                }
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(StorageError::Open)?;
        writeln!(file, "{CSV_HEADER}").map_err(StorageError::Write)
    }

    /// Appends one serialized record.
    pub fn append(&self, reading: &Reading) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(StorageError::Open)?;
        file.write_all(reading.to_csv_record().as_bytes())
            .map_err(StorageError::Write)
    }

    /// Raw log text, for the operator-facing read endpoint.
    pub fn contents(&self) -> Result<String, StorageError> {
        std::fs::read_to_string(&self.path).map_err(StorageError::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Reading {
        Reading {
            temperature: 22.5,
            humidity: 60.1,
            pressure: 1008.3,
            altitude: 45.0,
            timestamp: "01-01-2024 | 00:00:00".into(),
        }
    }

    #[test]
    fn append_after_initialize_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let log = DataLog::new(dir.path().join("WeatherData.csv"), true);

        log.initialize().unwrap();
        log.append(&reading()).unwrap();

        assert_eq!(
            log.contents().unwrap(),
            "Timestamp,Temperature,Humidity,Pressure,Altitude\n\
             01-01-2024 | 00:00:00,22.50,60.10,1008.30,45.00\n"
        );
    }

    #[test]
    fn initialize_twice_leaves_a_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = DataLog::new(dir.path().join("WeatherData.csv"), true);

        log.initialize().unwrap();
        log.append(&reading()).unwrap();
        log.initialize().unwrap();

        let contents = log.contents().unwrap();
        assert_eq!(contents, format!("{CSV_HEADER}\n"));
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn truncation_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let log = DataLog::new(dir.path().join("WeatherData.csv"), false);

        log.initialize().unwrap();
        log.append(&reading()).unwrap();
        log.initialize().unwrap();

        // Header plus the surviving data line.
        assert_eq!(log.contents().unwrap().lines().count(), 2);
    }

    #[test]
    fn records_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = DataLog::new(dir.path().join("WeatherData.csv"), true);
        log.initialize().unwrap();

        for i in 0..3 {
            let mut r = reading();
            r.temperature = 20.0 + i as f32;
            log.append(&r).unwrap();
        }

        let contents = log.contents().unwrap();
        let temps: Vec<&str> = contents
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(temps, ["20.00", "21.00", "22.00"]);
    }
}
