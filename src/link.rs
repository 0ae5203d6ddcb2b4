// link.rs

use std::net::Ipv4Addr;

use anyhow::bail;
use log::*;
use tokio::time::Duration;

use crate::*;

/// Owns the radio and the broker session for one wake cycle.
pub struct LinkClient<N, B> {
    network: N,
    broker: B,
}

impl<N: Network, B: Broker> LinkClient<N, B> {
    pub fn new(network: N, broker: B) -> Self {
        Self { network, broker }
    }

    pub async fn join_network(
        &mut self,
        ssid: &str,
        password: &str,
        timeout: Duration,
        step: Duration,
    ) -> anyhow::Result<Option<Ipv4Addr>> {
        info!("WiFi connecting to {ssid}");
        self.network.begin(ssid, password).await?;

        let network = &mut self.network;
        if let Err(wait) = poll_until(step, WaitLimit::Deadline(timeout), || {
            network.is_associated().then_some(())
        })
        .await
        {
            error!("WiFi connection failed after {} polls.", wait.attempts);
            bail!(JoinTimeout {
                ssid: ssid.to_string(),
                wait,
            });
        }

        let ip = self.network.local_ip();
        match ip {
            Some(ip) => info!("WiFi connected: {ip}"),
            None => warn!("WiFi connected, no address yet"),
        }
        Ok(ip)
    }

    pub async fn connect_broker(&mut self, settings: &BrokerSettings) -> anyhow::Result<()> {
        info!("MQTT connecting to {}:{}", settings.host, settings.port);
        if self.broker.is_connected() {
            info!("MQTT already connected.");
            return Ok(());
        }

        match self.broker.connect(settings).await {
            Ok(()) => {
                info!("MQTT connected.");
                Ok(())
            }
            Err(e) => {
                match e.downcast_ref::<BrokerRefused>() {
                    Some(r) => error!("MQTT connection failed: status {}", r.code),
                    None => error!("MQTT connection failed: {e:#}"),
                }
                Err(e)
            }
        }
    }

    pub async fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
        if !self.broker.is_connected() {
            error!("MQTT client not connected, nothing sent.");
            bail!(NotConnected);
        }

        info!(
            "MQTT sending {topic} = {}",
            String::from_utf8_lossy(payload)
        );
        match self.broker.publish(topic, payload).await {
            Ok(()) => {
                info!("MQTT send acknowledged.");
                Ok(())
            }
            Err(e) => {
                error!("MQTT send error: {e:#}");
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.broker.disconnect();
    }

    pub async fn shutdown(&mut self) {
        self.disconnect();
        self.network.shutdown().await;
    }
}


// EOF
