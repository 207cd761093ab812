//! Wall-clock access for the desk.
//!
//! Reopen deadlines are compared against `now`, so tests drive time through
//! [`ManualClock`] instead of sleeping.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex, PoisonError};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(at) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop sub-microsecond precision so values survive a store round trip.
#[must_use]
pub fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock, truncate_to_micros};
    use crate::testing::t0;
    use chrono::{TimeDelta, Timelike};
    use std::sync::Arc;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = Arc::new(ManualClock::new(t0()));
        let shared: Arc<dyn Clock> = clock.clone();
        assert_eq!(shared.now(), t0());

        clock.advance(TimeDelta::hours(2));
        assert_eq!(shared.now(), t0() + TimeDelta::hours(2));

        clock.set(t0());
        assert_eq!(shared.now(), t0());
    }

    #[test]
    fn truncation_drops_nanoseconds() {
        let precise = t0().with_nanosecond(123_456_789).expect("valid nanos");
        assert_eq!(truncate_to_micros(precise).nanosecond(), 123_456_000);
    }
}
