// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    // Necessary because of this issue: https://github.com/rust-lang/cargo/issues/9641
    // see also https://github.com/rust-lang/cargo/issues/9554
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::build::CfgArgs::output_propagated("ESP_IDF")?;
        embuild::build::LinkArgs::output_propagated("ESP_IDF")?;
    }

    let settings = [
        ("WIFI_SSID", "internet"),
        ("WIFI_PASS", "password"),
        ("MQTT_HOST", "mqtt.local"),
        ("MQTT_PORT", "1883"),
        ("MQTT_CLIENT_ID", "esp32tempnode"),
        ("MQTT_USER", ""),
        ("MQTT_PASS", ""),
        ("MQTT_TOPIC", "esp32tempnode"),
    ];
    for (key, default) in settings {
        let value = env::var(key).unwrap_or_else(|_| default.into());
        println!("cargo:rerun-if-env-changed={key}");
        println!("cargo:rustc-env={key}={value}");
    }

    // optional, unbounded probe retry unless given
    println!("cargo:rerun-if-env-changed=PROBE_MAX_ATTEMPTS");
    if let Ok(n) = env::var("PROBE_MAX_ATTEMPTS") {
        println!("cargo:rustc-env=PROBE_MAX_ATTEMPTS={n}");
    }

    Ok(())
}

// EOF
