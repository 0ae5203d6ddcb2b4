// measure.rs

use std::{error, fmt, time::Duration};

use anyhow::bail;
use log::*;
use serde::Serialize;
use tokio::time::sleep;

use crate::wait::{poll_until, WaitLimit};

pub const PROBE_RESOLUTION_BITS: u8 = 12;
/// Scratchpad value after power-on, before any conversion has finished.
pub const PROBE_POWER_ON_C: f32 = 85.0;
/// Returned by the probe adapter when the device does not answer on the bus.
pub const PROBE_DISCONNECTED_C: f32 = -127.0;
pub const SEA_LEVEL_HPA: f32 = 1013.25;

pub trait ProbeSensor {
    /// Number of probes found on the bus.
    fn device_count(&mut self) -> anyhow::Result<usize>;
    /// Applies to the first probe found.
    fn set_resolution(&mut self, bits: u8) -> anyhow::Result<()>;
    /// Runs one conversion. May return one of the not-ready sentinels.
    fn read_temperature(&mut self) -> f32;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvSample {
    pub temperature_c: f32,
    pub pressure_pa: f32,
    pub humidity_pct: f32,
}

pub trait EnvSensor {
    fn begin(&mut self) -> anyhow::Result<()>;
    /// Never fails; a sensor that went away reads as garbage.
    fn measure(&mut self) -> EnvSample;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
    pub altitude_m: f32,
    pub humidity_pct: f32,
}

/// One full acquisition, as sent on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    #[serde(rename = "t1")]
    pub probe_temperature_c: f32,
    #[serde(rename = "t2")]
    pub env_temperature_c: f32,
    #[serde(rename = "p")]
    pub pressure_hpa: f32,
    #[serde(rename = "a")]
    pub altitude_m: f32,
    #[serde(rename = "h")]
    pub humidity_pct: f32,
}

#[derive(Debug)]
pub enum SensorError {
    ProbeNotFound,
    EnvSensorNotFound,
    ProbeNotReady { attempts: u32 },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::ProbeNotFound => write!(f, "DS18B20 probe not found"),
            SensorError::EnvSensorNotFound => write!(f, "BME280 sensor not found"),
            SensorError::ProbeNotReady { attempts } => {
                write!(f, "DS18B20 probe not ready after {attempts} reads")
            }
        }
    }
}

impl error::Error for SensorError {}

pub fn is_probe_sentinel(t: f32) -> bool {
    t == PROBE_POWER_ON_C || t == PROBE_DISCONNECTED_C
}

/// Barometric altitude in meters for a pressure given in hPa.
pub fn altitude_from_pressure(pressure_hpa: f32, sea_level_hpa: f32) -> f32 {
    44330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(0.1903))
}

pub struct SensorPair<P, E> {
    probe: P,
    env: E,
    retry_delay: Duration,
    max_attempts: Option<u32>,
}

impl<P: ProbeSensor, E: EnvSensor> SensorPair<P, E> {
    pub fn new(probe: P, env: E, retry_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            probe,
            env,
            retry_delay,
            max_attempts,
        }
    }

    pub fn init_digital_probe(&mut self) -> anyhow::Result<()> {
        info!("DS18B20 init.");
        let count = self.probe.device_count()?;
        if count == 0 {
            error!("DS18B20 probe not found.");
            bail!(SensorError::ProbeNotFound);
        }
        info!("Found {count} DS18B20 probe(s), using the first one.");
        self.probe.set_resolution(PROBE_RESOLUTION_BITS)
    }

    pub fn init_environmental(&mut self) -> anyhow::Result<()> {
        info!("BME280 init.");
        if let Err(e) = self.env.begin() {
            error!("BME280 sensor not found: {e:#}");
            bail!(SensorError::EnvSensorNotFound);
        }
        Ok(())
    }

    pub async fn read_digital_probe_temperature(&mut self) -> anyhow::Result<f32> {
        let limit = match self.max_attempts {
            Some(n) => WaitLimit::Attempts(n),
            None => WaitLimit::Unbounded,
        };
        let probe = &mut self.probe;
        match poll_until(self.retry_delay, limit, || {
            let t = probe.read_temperature();
            (!is_probe_sentinel(t)).then_some(t)
        })
        .await
        {
            Ok(t) => Ok(t),
            Err(e) => {
                error!("DS18B20 still not ready: {e}");
                bail!(SensorError::ProbeNotReady {
                    attempts: e.attempts
                })
            }
        }
    }

    pub fn read_environmental(&mut self) -> EnvReading {
        let s = self.env.measure();
        let pressure_hpa = s.pressure_pa / 100.0;
        EnvReading {
            temperature_c: s.temperature_c,
            pressure_hpa,
            altitude_m: altitude_from_pressure(pressure_hpa, SEA_LEVEL_HPA),
            humidity_pct: s.humidity_pct,
        }
    }

    pub async fn acquire(&mut self) -> anyhow::Result<Reading> {
        info!("Measuring.");
        let t1 = self.read_digital_probe_temperature().await?;
        let env = self.read_environmental();
        Ok(Reading {
            probe_temperature_c: t1,
            env_temperature_c: env.temperature_c,
            pressure_hpa: env.pressure_hpa,
            altitude_m: env.altitude_m,
            humidity_pct: env.humidity_pct,
        })
    }

    /// Takes `reads` acquisitions `delay` apart and keeps only the last one.
    pub async fn warm_up(&mut self, reads: u32, delay: Duration) -> anyhow::Result<Reading> {
        let mut reading = self.acquire().await?;
        for _ in 1..reads {
            sleep(delay).await;
            reading = self.acquire().await?;
        }
        Ok(reading)
    }
}


// EOF
