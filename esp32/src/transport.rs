//! TLS-capable HTTP transport for channel writes, reused across uploads.

use embedded_svc::http::client::Client as HttpClient;
use embedded_svc::io::Write;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

use weather_monitor_common::telemetry::{Transport, TransportError};

pub struct EspTransport {
    client: HttpClient<EspHttpConnection>,
}

impl EspTransport {
    pub fn new() -> anyhow::Result<Self> {
        let connection = EspHttpConnection::new(&Configuration {
            use_global_ca_store: true,
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })?;

        Ok(Self {
            client: HttpClient::wrap(connection),
        })
    }
}

impl Transport for EspTransport {
    fn post(&mut self, url: &str, body: &str) -> Result<u16, TransportError> {
        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Content-Length", content_length.as_str()),
        ];

        let mut request = self.client.post(url, &headers).map_err(transport_error)?;
        request.write_all(body.as_bytes()).map_err(transport_error)?;
        let response = request.submit().map_err(transport_error)?;

        Ok(response.status())
    }
}

fn transport_error(e: impl std::fmt::Display) -> TransportError {
    TransportError(e.to_string())
}
