// esp/sensors.rs

use anyhow::bail;
use bme280::i2c::BME280;
use ds18b20::{Ds18b20, Resolution};
use embedded_hal::{delay::DelayNs, i2c::I2c};
use esp_idf_hal::{
    delay::{Ets, FreeRtos},
    gpio::{AnyIOPin, InputOutput, PinDriver},
    sys::EspError,
};
use log::*;
use one_wire_bus::{Address, OneWire};

use crate::*;

pub type OneWirePin = PinDriver<'static, AnyIOPin, InputOutput>;

pub struct OneWireProbe {
    bus: OneWire<OneWirePin>,
    sensor: Option<Ds18b20>,
    resolution: Resolution,
}

impl OneWireProbe {
    pub fn new(pin: OneWirePin) -> anyhow::Result<Self> {
        let bus = match OneWire::new(pin) {
            Ok(b) => b,
            Err(e) => bail!("Cannot open 1-wire bus: {e:?}"),
        };
        Ok(Self {
            bus,
            sensor: None,
            resolution: Resolution::Bits12,
        })
    }

    fn scan(&mut self) -> anyhow::Result<Vec<Address>> {
        let mut found = Vec::new();
        let mut state = None;
        loop {
            match self.bus.device_search(state.as_ref(), false, &mut Ets) {
                Ok(Some((address, s))) => {
                    if address.family_code() == ds18b20::FAMILY_CODE {
                        found.push(address);
                    }
                    state = Some(s);
                }
                Ok(None) => break,
                Err(e) => bail!("1-wire search failed: {e:?}"),
            }
        }
        Ok(found)
    }
}

impl ProbeSensor for OneWireProbe {
    fn device_count(&mut self) -> anyhow::Result<usize> {
        let found = self.scan()?;
        info!("1-wire devices: {found:?}");
        self.sensor = match found.first() {
            Some(a) => match Ds18b20::new::<EspError>(*a) {
                Ok(s) => Some(s),
                Err(e) => bail!("Cannot use {a:?}: {e:?}"),
            },
            None => None,
        };
        Ok(found.len())
    }

    fn set_resolution(&mut self, bits: u8) -> anyhow::Result<()> {
        let resolution = match bits {
            9 => Resolution::Bits9,
            10 => Resolution::Bits10,
            11 => Resolution::Bits11,
            12 => Resolution::Bits12,
            _ => bail!("Unsupported DS18B20 resolution {bits}"),
        };
        let Some(sensor) = self.sensor.as_ref() else {
            bail!("No DS18B20 selected");
        };
        if let Err(e) = sensor.set_config(i8::MIN, i8::MAX, resolution, &mut self.bus, &mut Ets) {
            bail!("Cannot configure DS18B20: {e:?}");
        }
        self.resolution = resolution;
        Ok(())
    }

    fn read_temperature(&mut self) -> f32 {
        let Some(sensor) = self.sensor.as_ref() else {
            return PROBE_DISCONNECTED_C;
        };
        if let Err(e) = sensor.start_temp_measurement(&mut self.bus, &mut Ets) {
            warn!("DS18B20 conversion failed: {e:?}");
            return PROBE_DISCONNECTED_C;
        }
        self.resolution.delay_for_measurement_time(&mut FreeRtos);

        match sensor.read_data(&mut self.bus, &mut Ets) {
            Ok(data) => data.temperature,
            Err(e) => {
                warn!("DS18B20 read failed: {e:?}");
                PROBE_DISCONNECTED_C
            }
        }
    }
}

pub struct Bme280Sensor<I, D> {
    dev: BME280<I>,
    delay: D,
}

impl<I: I2c, D: DelayNs> Bme280Sensor<I, D> {
    /// Sensor at the primary address, 0x76.
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            dev: BME280::new_primary(i2c),
            delay,
        }
    }
}

impl<I: I2c, D: DelayNs> EnvSensor for Bme280Sensor<I, D> {
    fn begin(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.dev.init(&mut self.delay) {
            bail!("BME280 init failed: {e:?}");
        }
        Ok(())
    }

    fn measure(&mut self) -> EnvSample {
        match self.dev.measure(&mut self.delay) {
            Ok(m) => EnvSample {
                temperature_c: m.temperature,
                pressure_pa: m.pressure,
                humidity_pct: m.humidity,
            },
            Err(e) => {
                warn!("BME280 read failed: {e:?}");
                EnvSample {
                    temperature_c: f32::NAN,
                    pressure_pa: f32::NAN,
                    humidity_pct: f32::NAN,
                }
            }
        }
    }
}

// EOF
