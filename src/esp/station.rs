// esp/station.rs

use std::net::Ipv4Addr;

use anyhow::anyhow;
use embedded_svc::wifi::{ClientConfiguration, Configuration};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    timer::EspTaskTimerService,
    wifi::{AsyncWifi, EspWifi},
};
use log::*;

use crate::*;

pub struct EspStation {
    wifi: AsyncWifi<EspWifi<'static>>,
}

impl EspStation {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        timer: EspTaskTimerService,
    ) -> anyhow::Result<Self> {
        // without an NVS partition nothing of the station config reaches flash
        let espwifi = EspWifi::new(modem, sysloop.clone(), None)?;
        Ok(Self {
            wifi: AsyncWifi::wrap(espwifi, sysloop, timer)?,
        })
    }
}

impl Network for EspStation {
    async fn begin(&mut self, ssid: &str, password: &str) -> anyhow::Result<()> {
        info!("WiFi setting credentials...");
        self.wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| anyhow!("WiFi SSID too long: {ssid:?}"))?,
            password: password
                .try_into()
                .map_err(|_| anyhow!("WiFi password too long"))?,
            ..Default::default()
        }))?;

        info!("WiFi driver starting...");
        Box::pin(self.wifi.start()).await?;

        // association is polled by the caller
        self.wifi.wifi_mut().connect()?;
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.wifi.wifi().is_up().unwrap_or(false)
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.wifi.wifi_mut().disconnect() {
            warn!("WiFi disconnect: {e:?}");
        }
        if let Err(e) = Box::pin(self.wifi.stop()).await {
            warn!("WiFi stop: {e:?}");
        }
    }
}

// EOF
