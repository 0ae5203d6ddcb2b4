// wifi.rs

use std::{error, fmt, future::Future, net::Ipv4Addr};

use crate::wait::WaitTimeout;

/// Station-mode network interface.
pub trait Network {
    /// Starts the radio and asks to associate. Does not wait for the result.
    fn begin(&mut self, ssid: &str, password: &str) -> impl Future<Output = anyhow::Result<()>>;

    /// Associated and holding a lease.
    fn is_associated(&mut self) -> bool;

    fn local_ip(&self) -> Option<Ipv4Addr>;

    /// Disconnects and stops the radio. Best effort.
    fn shutdown(&mut self) -> impl Future<Output = ()>;
}

#[derive(Debug)]
pub struct JoinTimeout {
    pub ssid: String,
    pub wait: WaitTimeout,
}

impl fmt::Display for JoinTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WiFi {:?} did not connect: {}", self.ssid, self.wait)
    }
}

impl error::Error for JoinTimeout {}

// EOF
