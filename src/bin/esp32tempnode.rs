// bin/esp32tempnode.rs

#![warn(clippy::large_futures)]

#[cfg(target_os = "espidf")]
esp_idf_sys::esp_app_desc!();

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp32tempnode::{esp::*, *};
    use esp_idf_hal::{
        delay::FreeRtos,
        gpio::{IOPin, PinDriver, Pull},
        i2c::{I2cConfig, I2cDriver},
        prelude::*,
    };
    use esp_idf_svc::{eventloop::EspSystemEventLoop, timer::EspTaskTimerService};
    use log::*;

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = NodeConfig::default();
    info!("My config:\n{config:#?}");

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;
    let sysloop = EspSystemEventLoop::take()?;
    let timer = EspTaskTimerService::new()?;

    let mut onewire_pin = PinDriver::input_output_od(pins.gpio4.downgrade())?;
    onewire_pin.set_pull(Pull::Up)?;
    let probe = OneWireProbe::new(onewire_pin)?;

    #[cfg(feature = "esp32c3")]
    let (sda, scl) = (pins.gpio6, pins.gpio7);
    #[cfg(feature = "esp32s")]
    let (sda, scl) = (pins.gpio21, pins.gpio22);

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let env = Bme280Sensor::new(i2c, FreeRtos);

    let station = EspStation::new(peripherals.modem, sysloop, timer)?;

    let mut pipeline = BootPipeline::new(
        config,
        probe,
        env,
        station,
        EspBroker::new(),
        EspDeepSleep,
    );

    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(Box::pin(pipeline.run()));

    // only reached if deep sleep somehow returned
    error!("Woke up without a reset ({outcome:?}), restarting.");
    FreeRtos::delay_ms(3000);
    esp_idf_hal::reset::restart();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "{} {} runs on ESP-IDF targets only; use `cargo test` on the host.",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    std::process::exit(1);
}

// EOF
