//! SPIFFS mount backing the CSV log.

use std::ffi::CString;
use std::path::PathBuf;

use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};
use log::info;

use weather_monitor_common::datalog::StorageError;

const MOUNT_POINT: &str = "/spiffs";

pub fn log_path() -> PathBuf {
    PathBuf::from(MOUNT_POINT).join("WeatherData.csv")
}

/// Registers the SPIFFS partition under [`MOUNT_POINT`], formatting it on
/// first use.
pub fn mount() -> Result<(), StorageError> {
    let base_path = CString::new(MOUNT_POINT).unwrap();
    let conf = esp_vfs_spiffs_conf_t {
        base_path: base_path.as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };

    esp!(unsafe { esp_vfs_spiffs_register(&conf) })
        .map_err(|e| StorageError::Mount(e.to_string()))?;

    info!("spiffs mounted at {MOUNT_POINT}");
    Ok(())
}
