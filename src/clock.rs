use chrono::Utc;

/// Time source for session accounting. Abstracted so tests can pin the clock
/// instead of sleeping.
pub trait Clock {
    /// Current unix time in seconds. Sub-second precision matches what the
    /// ticket file stores for `inicio`.
    fn now(&self) -> f64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

pub mod test_utils {
    use std::cell::Cell;

    use super::*;

    pub struct FixedClock {
        now: Cell<f64>,
    }

    impl FixedClock {
        pub fn new(now: f64) -> Self {
            Self { now: Cell::new(now) }
        }

        pub fn set(&self, now: f64) {
            self.now.set(now);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> f64 {
            self.now.get()
        }
    }
}
