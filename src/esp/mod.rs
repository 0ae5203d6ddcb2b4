// esp/mod.rs

mod sensors;
pub use sensors::*;

mod station;
pub use station::*;

mod client;
pub use client::*;

mod sleep;
pub use sleep::*;

// EOF
