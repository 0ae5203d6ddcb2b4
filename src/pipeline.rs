// pipeline.rs

use log::*;
use tokio::time::sleep;

use crate::*;

/// One wake cycle: measure, send, sleep.
///
/// Stages run strictly in order and the first failure skips everything up to
/// the shutdown. Shutdown and sleep run on every path.
pub struct BootPipeline<P, E, N, B, S> {
    config: NodeConfig,
    sensors: SensorPair<P, E>,
    link: LinkClient<N, B>,
    power: PowerCycle<S>,
}

impl<P, E, N, B, S> BootPipeline<P, E, N, B, S>
where
    P: ProbeSensor,
    E: EnvSensor,
    N: Network,
    B: Broker,
    S: DeepSleep,
{
    pub fn new(config: NodeConfig, probe: P, env: E, network: N, broker: B, sleeper: S) -> Self {
        let t = &config.timings;
        let sensors = SensorPair::new(probe, env, t.probe_retry_delay, t.probe_max_attempts);
        let power = PowerCycle::new(sleeper, t.deep_sleep);
        Self {
            sensors,
            link: LinkClient::new(network, broker),
            power,
            config,
        }
    }

    pub async fn run(&mut self) -> RunOutcome {
        let outcome = match self.run_stages().await {
            Ok((reading, Ok(()))) => RunOutcome::Published(reading),
            Ok((reading, Err(e))) => RunOutcome::NotPublished(reading, e),
            Err(e) => {
                if e.is_init() {
                    error!("Init error: {e}");
                } else {
                    error!("Run aborted: {e}");
                }
                RunOutcome::Failed(e)
            }
        };

        info!("Stage: {}", Stage::Shutdown);
        self.link.shutdown().await;
        self.power.enter();
        outcome
    }

    /// Everything before shutdown. The inner result is the publish, which never aborts a run.
    async fn run_stages(&mut self) -> Result<(Reading, anyhow::Result<()>), StageError> {
        let t = self.config.timings.clone();

        info!("Stage: {}", Stage::SerialUp);
        info!("esp32tempnode v{FW_VERSION} starting.");
        sleep(t.serial_settle).await;

        info!("Stage: {}", Stage::InitProbe);
        self.sensors.init_digital_probe().at(Stage::InitProbe)?;

        info!("Stage: {}", Stage::InitEnv);
        self.sensors.init_environmental().at(Stage::InitEnv)?;

        info!("Stage: {}", Stage::WarmUp);
        let reading = self
            .sensors
            .warm_up(t.warmup_reads, t.warmup_delay)
            .await
            .at(Stage::WarmUp)?;
        info!("Measured: {reading:?}");

        info!("Stage: {}", Stage::NetworkJoin);
        self.link
            .join_network(
                &self.config.wifi_ssid,
                &self.config.wifi_pass,
                t.join_timeout,
                t.join_poll,
            )
            .await
            .at(Stage::NetworkJoin)?;

        info!("Stage: {}", Stage::BrokerConnect);
        self.link
            .connect_broker(&self.config.broker)
            .await
            .at(Stage::BrokerConnect)?;

        info!("Stage: {}", Stage::Publish);
        let sent = self.publish(&reading).await;
        if let Err(e) = &sent {
            warn!("{} failed, going to sleep anyway: {e:#}", Stage::Publish);
        }
        Ok((reading, sent))
    }

    async fn publish(&mut self, reading: &Reading) -> anyhow::Result<()> {
        let payload = encode_payload(reading)?;
        self.link.publish(&self.config.mqtt_topic, &payload).await
    }
}


// EOF
