// power.rs

use std::time::Duration;

use log::*;

pub trait DeepSleep {
    /// Lowest-power mode with the radio off. On hardware this never returns;
    /// the next thing to run is a fresh boot.
    fn sleep_for(&mut self, duration: Duration);
}

/// Sleep timer value in microseconds, saturating instead of wrapping.
pub fn sleep_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

pub struct PowerCycle<S> {
    sleeper: S,
    duration: Duration,
}

impl<S: DeepSleep> PowerCycle<S> {
    pub fn new(sleeper: S, duration: Duration) -> Self {
        Self { sleeper, duration }
    }

    pub fn enter(&mut self) {
        info!("Sleeping for {} s.", self.duration.as_secs());
        self.sleeper.sleep_for(self.duration);
    }
}


// EOF
