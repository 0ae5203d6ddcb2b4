// mqtt.rs

use std::{error, fmt, future::Future};

use crate::BrokerSettings;

pub trait Broker {
    fn is_connected(&self) -> bool;

    /// One connection attempt. A refusal should come back as [`BrokerRefused`].
    fn connect(&mut self, settings: &BrokerSettings) -> impl Future<Output = anyhow::Result<()>>;

    /// Sends and waits for the broker to acknowledge.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> impl Future<Output = anyhow::Result<()>>;

    fn disconnect(&mut self);
}

#[derive(Debug)]
pub struct BrokerRefused {
    pub code: i32,
}

impl fmt::Display for BrokerRefused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MQTT broker refused the connection, status {}", self.code)
    }
}

impl error::Error for BrokerRefused {}

/// Connect failed below the MQTT layer (TCP, TLS, DNS).
pub const MQTT_CONNECT_FAILED: i32 = -2;
/// No CONNACK within the connect timeout.
pub const MQTT_CONNECTION_TIMEOUT: i32 = -4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectFailure {
    /// CONNACK return code from the broker, 1..=5.
    Refused(u8),
    Transport,
    NoAnswer,
}

impl ConnectFailure {
    /// Decodes the error reported with a failed connect. `return_code` is the
    /// CONNACK code and only means something when the broker `refused`.
    pub fn from_connack(refused: bool, return_code: u32) -> Self {
        match (refused, u8::try_from(return_code)) {
            (true, Ok(rc)) if rc > 0 => ConnectFailure::Refused(rc),
            _ => ConnectFailure::Transport,
        }
    }

    /// Status in the style of PubSubClient::state(): broker codes are positive.
    pub fn status(self) -> i32 {
        match self {
            ConnectFailure::Refused(rc) => i32::from(rc),
            ConnectFailure::Transport => MQTT_CONNECT_FAILED,
            ConnectFailure::NoAnswer => MQTT_CONNECTION_TIMEOUT,
        }
    }
}

impl From<ConnectFailure> for BrokerRefused {
    fn from(f: ConnectFailure) -> Self {
        BrokerRefused { code: f.status() }
    }
}

#[derive(Debug)]
pub struct NotConnected;

impl fmt::Display for NotConnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MQTT client is not connected")
    }
}

impl error::Error for NotConnected {}


// EOF
