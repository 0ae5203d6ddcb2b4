// lib.rs
#![warn(clippy::large_futures)]

pub use std::time::Duration;

mod config;
pub use config::*;

mod wait;
pub use wait::*;

mod measure;
pub use measure::*;

mod payload;
pub use payload::*;

mod wifi;
pub use wifi::*;

mod mqtt;
pub use mqtt::*;

mod link;
pub use link::*;

mod power;
pub use power::*;

mod state;
pub use state::*;

mod pipeline;
pub use pipeline::*;

#[cfg(target_os = "espidf")]
pub mod esp;

#[cfg(test)]
mod mock;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

// EOF
