// esp/sleep.rs

use std::time::Duration;

use crate::*;

pub struct EspDeepSleep;

impl DeepSleep for EspDeepSleep {
    fn sleep_for(&mut self, duration: Duration) {
        // wakes through a full reset, so this never returns
        unsafe { esp_idf_sys::esp_deep_sleep(sleep_micros(duration)) }
    }
}

// EOF
