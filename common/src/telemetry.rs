use std::fmt;

use crate::reading::Reading;

/// Protocol limit on the number of numbered fields per channel write.
pub const MAX_FIELDS: usize = 8;

/// The telemetry service could not be reached at all.
#[derive(Debug)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Why a publish failed. Publishing is best-effort telemetry: the scheduler
/// logs these and moves on, it never retries.
#[derive(Debug)]
pub enum UploadError {
    /// Network or service unreachable.
    Transport(TransportError),
    /// The remote rejected the write (rate limit, bad key, ...).
    Service { status: u16 },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Transport(e) => write!(f, "upload failed: {e}"),
            UploadError::Service { status } => {
                write!(f, "service rejected the write (status {status})")
            }
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UploadError::Transport(e) => Some(e),
            UploadError::Service { .. } => None,
        }
    }
}

/// One HTTP-style write per publish call.
pub trait Transport {
    /// Posts a form-encoded body, returning the response status code.
    fn post(&mut self, url: &str, body: &str) -> Result<u16, TransportError>;
}

/// Where channel writes go.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub endpoint: String,
    pub channel: u32,
    pub write_key: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.thingspeak.com/update".into(),
            channel: 1,
            write_key: String::new(),
        }
    }
}

/// Maps readings onto the remote channel's numbered fields and submits them,
/// one network write per reading.
pub struct TelemetryClient<T> {
    transport: T,
    config: TelemetryConfig,
}

impl<T: Transport> TelemetryClient<T> {
    pub fn new(transport: T, config: TelemetryConfig) -> Self {
        Self { transport, config }
    }

    /// Single attempt, no internal retry. Field assignment is fixed:
    /// field1 temperature, field2 humidity, field3 pressure, field4 altitude.
    pub fn publish(&mut self, reading: &Reading) -> Result<(), UploadError> {
        let body = self.encode(reading);
        let status = self
            .transport
            .post(&self.config.endpoint, &body)
            .map_err(UploadError::Transport)?;

        if (200..300).contains(&status) {
            log::debug!("channel {} updated", self.config.channel);
            Ok(())
        } else {
            Err(UploadError::Service { status })
        }
    }

    fn encode(&self, reading: &Reading) -> String {
        let fields = [
            reading.temperature,
            reading.humidity,
            reading.pressure,
            reading.altitude,
        ];
        debug_assert!(fields.len() <= MAX_FIELDS);

        let mut body = format!("api_key={}", self.config.write_key);
        for (i, value) in fields.iter().enumerate() {
            body.push_str(&format!("&field{}={:.2}", i + 1, value));
        }
        body
    }
}
