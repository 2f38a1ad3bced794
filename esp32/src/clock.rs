//! Monotonic tick source plus SNTP-backed wall clock.

use std::time::Instant;

use chrono::FixedOffset;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use log::{info, warn};

use weather_monitor_common::clock::Clock;
use weather_monitor_common::reading::TIMESTAMP_FORMAT;

/// Offset applied to the synchronized UTC time (GMT+5:30).
const UTC_OFFSET_SECS: i32 = 19_800;

/// How long startup waits for the first SNTP sync before carrying on without
/// wall-clock time.
const SYNC_WAIT_MS: u32 = 10_000;

pub struct EspClock {
    started: Instant,
    sntp: EspSntp<'static>,
}

impl EspClock {
    /// Starts SNTP against the default pool and gives the first sync a
    /// bounded window. A device booting without connectivity comes up
    /// unsynchronized; readings carry the placeholder timestamp until the
    /// sync completes in the background.
    pub fn synchronize() -> anyhow::Result<Self> {
        let sntp = EspSntp::new_default()?;

        let mut waited = 0;
        while sntp.get_sync_status() != SyncStatus::Completed && waited < SYNC_WAIT_MS {
            FreeRtos::delay_ms(500);
            waited += 500;
        }

        if sntp.get_sync_status() == SyncStatus::Completed {
            info!("sntp sync complete");
        } else {
            warn!("sntp sync still pending, timestamps unavailable for now");
        }

        Ok(Self {
            started: Instant::now(),
            sntp,
        })
    }
}

impl Clock for EspClock {
    fn now_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    fn wall_clock(&self) -> Option<String> {
        if self.sntp.get_sync_status() != SyncStatus::Completed {
            return None;
        }

        let offset = FixedOffset::east_opt(UTC_OFFSET_SECS)?;
        let now = chrono::Utc::now().with_timezone(&offset);
        Some(now.format(TIMESTAMP_FORMAT).to_string())
    }
}
