// config.rs

use std::time::Duration;

const DEFAULT_MQTT_PORT: u16 = 1883;

pub const SERIAL_SETTLE: Duration = Duration::from_secs(5);
pub const PROBE_RETRY_DELAY: Duration = Duration::from_millis(100);
pub const WARMUP_READS: u32 = 3;
pub const WARMUP_DELAY: Duration = Duration::from_millis(500);
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(20);
pub const JOIN_POLL: Duration = Duration::from_millis(500);
pub const DEEP_SLEEP: Duration = Duration::from_secs(3 * 60);

#[derive(Clone, Debug)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl BrokerSettings {
    pub fn url(&self) -> String {
        format!("mqtt://{}:{}", self.host, self.port)
    }
}

/// Fixed timing of one wake cycle. Only tests should need anything but the defaults.
#[derive(Clone, Debug)]
pub struct Timings {
    pub serial_settle: Duration,
    pub probe_retry_delay: Duration,
    /// `None` keeps retrying a not-ready probe forever.
    pub probe_max_attempts: Option<u32>,
    pub warmup_reads: u32,
    pub warmup_delay: Duration,
    pub join_timeout: Duration,
    pub join_poll: Duration,
    pub deep_sleep: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            serial_settle: SERIAL_SETTLE,
            probe_retry_delay: PROBE_RETRY_DELAY,
            probe_max_attempts: option_env!("PROBE_MAX_ATTEMPTS").and_then(|n| n.parse().ok()),
            warmup_reads: WARMUP_READS,
            warmup_delay: WARMUP_DELAY,
            join_timeout: JOIN_TIMEOUT,
            join_poll: JOIN_POLL,
            deep_sleep: DEEP_SLEEP,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub broker: BrokerSettings,
    pub mqtt_topic: String,
    pub timings: Timings,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("password").into(),

            broker: BrokerSettings {
                host: option_env!("MQTT_HOST").unwrap_or("mqtt.local").into(),
                port: option_env!("MQTT_PORT")
                    .unwrap_or("-")
                    .parse()
                    .unwrap_or(DEFAULT_MQTT_PORT),
                client_id: option_env!("MQTT_CLIENT_ID").unwrap_or("esp32tempnode").into(),
                username: option_env!("MQTT_USER").unwrap_or_default().into(),
                password: option_env!("MQTT_PASS").unwrap_or_default().into(),
            },
            mqtt_topic: option_env!("MQTT_TOPIC").unwrap_or("esp32tempnode").into(),

            timings: Timings::default(),
        }
    }
}


// EOF
