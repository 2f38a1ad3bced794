//! Wifi link in mixed AP+STA mode. The soft AP keeps the HTTP endpoints
//! reachable even while the uplink is down; association with the uplink is
//! driven by the connectivity manager through [`NetworkLink`].

use embedded_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration,
};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use weather_monitor_common::connectivity::NetworkLink;

const SSID: &str = env!("WIFI_SSID");
const PASSWORD: &str = env!("WIFI_PASS");

/// Credentials of the soft AP the device itself serves.
const SOFT_SSID: &str = "WeatherMonitor";
const SOFT_PASSWORD: &str = "weather32";

pub struct EspLink {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl EspLink {
    /// Configures and starts the driver. Association itself is left to
    /// [`NetworkLink::join`] so a missing uplink never stalls startup.
    pub fn start(mut wifi: BlockingWifi<EspWifi<'static>>) -> anyhow::Result<Self> {
        let configuration = Configuration::Mixed(
            ClientConfiguration {
                ssid: SSID.try_into().unwrap(),
                auth_method: AuthMethod::WPA2Personal,
                password: PASSWORD.try_into().unwrap(),
                ..Default::default()
            },
            AccessPointConfiguration {
                ssid: SOFT_SSID.try_into().unwrap(),
                password: SOFT_PASSWORD.try_into().unwrap(),
                auth_method: AuthMethod::WPA2Personal,
                ..Default::default()
            },
        );

        wifi.set_configuration(&configuration)?;
        wifi.start()?;
        info!("wifi started, AP '{SOFT_SSID}' + STA '{SSID}'");

        Ok(Self { wifi })
    }
}

impl NetworkLink for EspLink {
    fn join(&mut self) {
        match self.wifi.connect() {
            Ok(()) => {
                if let Err(e) = self.wifi.wait_netif_up() {
                    warn!("netif did not come up: {e}");
                }
            }
            Err(e) => warn!("association attempt failed: {e}"),
        }
    }

    fn is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
