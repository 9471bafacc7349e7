use chrono::{DateTime, Local};
use std::cell::Cell;

use crate::workout::WorkoutId;

/// Ids keep the trailing ten digits of the millisecond clock.
const ID_MODULUS: u64 = 10_000_000_000;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to, for deterministic sessions
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

/// Issues timestamp-derived ids that never repeat within a session
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: Option<u64>,
}

impl IdGenerator {
    /// Start above every numeric id already in use
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a WorkoutId>) -> Self {
        let last = existing
            .into_iter()
            .filter_map(|id| id.as_str().parse::<u64>().ok())
            .max();
        Self { last }
    }

    pub fn next(&mut self, at: DateTime<Local>) -> WorkoutId {
        let stamp = at.timestamp_millis().unsigned_abs() % ID_MODULUS;
        let value = match self.last {
            Some(last) if stamp <= last => last + 1,
            _ => stamp,
        };
        self.last = Some(value);
        WorkoutId::new(format!("{value:010}"))
    }
}
