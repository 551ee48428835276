//! Book id generation
//!
//! Ids are the creation time in milliseconds. Two creates inside the same
//! millisecond would collide, so the generator never hands out an id that
//! is less than or equal to the last one it issued.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Process-wide source of book ids
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id based on the current wall clock
    pub fn next_id(&self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    /// Next id given the current time in milliseconds
    pub fn next_at(&self, now_ms: i64) -> i64 {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}
