// src/clock.rs
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// Wall-clock local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    current_time: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(datetime_str: &str) -> Result<Self, chrono::ParseError> {
        let dt = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")?;
        Ok(Self::at(dt))
    }

    pub fn at(dt: NaiveDateTime) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(dt)),
        }
    }

    pub fn set_time(&self, dt: NaiveDateTime) {
        *self.lock() = dt;
    }

    pub fn advance(&self, duration: Duration) {
        *self.lock() += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        self.current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_shared_state() {
        let clock = FixedClock::new("2025-03-10 09:00:00").unwrap();
        let shared = clock.clone();
        shared.advance(Duration::minutes(90));
        assert_eq!(
            clock.time_of_day(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap()
        );
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn fixed_clock_rejects_malformed_input() {
        assert!(FixedClock::new("10-03-2025 09:00").is_err());
    }
}
