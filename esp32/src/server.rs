//! Read-only HTTP endpoints, reachable through the soft AP: `/` is a small
//! info page, `/csv` serves the current log, `/test` is a liveness probe.

use std::path::PathBuf;

use embedded_svc::http::Method;
use embedded_svc::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use log::info;

const INDEX_HTML: &str = "<!DOCTYPE html>\
<html><head><title>Weather Monitor</title></head>\
<body><h1>Weather Monitor</h1>\
<p>Recorded data: <a href=\"/csv\">WeatherData.csv</a></p>\
</body></html>";

pub fn start(log_path: PathBuf) -> anyhow::Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&Configuration::default())?;

    server.fn_handler::<anyhow::Error, _>("/", Method::Get, |request| {
        let mut response =
            request.into_response(200, Some("OK"), &[("Content-Type", "text/html")])?;
        response.write_all(INDEX_HTML.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler::<anyhow::Error, _>("/csv", Method::Get, move |request| {
        // Missing file (storage wiped, first boot) serves as an empty body.
        let body = std::fs::read_to_string(&log_path).unwrap_or_default();
        let mut response =
            request.into_response(200, Some("OK"), &[("Content-Type", "text/csv")])?;
        response.write_all(body.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler::<anyhow::Error, _>("/test", Method::Get, |request| {
        request.into_ok_response()?.write_all(b"Hello World")?;
        Ok(())
    })?;

    info!("http server ready");
    Ok(server)
}
