//! Injectable wall clock.
//!
//! Every date-bucketing decision in the core (today's log key, streak walk,
//! reminder days) goes through a [`Clock`]. The clock is pinned to one UTC
//! offset for the whole session so that a log written just before midnight
//! and a streak computed just after it agree on which calendar day it was.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use std::cell::Cell;

/// Timestamp type used throughout the core.
pub type Timestamp = DateTime<FixedOffset>;

pub trait Clock {
    /// Current instant, expressed in the clock's pinned offset.
    fn now(&self) -> Timestamp;

    /// Calendar date of `now()` in the pinned offset.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// System clock pinned to a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Pin to the device-local offset as of now.
    pub fn local() -> Self {
        Self {
            offset: *Local::now().offset(),
        }
    }

    /// Pin to an explicit offset in minutes east of UTC.
    ///
    /// Falls back to UTC when the offset is out of range.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Manually driven clock for tests and previews.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Calendar date of `ts` as seen from the clock's offset.
pub fn local_date(ts: &Timestamp, now: &Timestamp) -> NaiveDate {
    ts.with_timezone(now.offset()).date_naive()
}

/// ISO `YYYY-MM-DD` key used in progress logs.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
