//! Planet id generation strategies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;

use crate::{Clock, IdGenerator, PlanetId};

/// Millisecond timestamp ids, strictly increasing within one process.
///
/// If the clock has not moved past the last issued value (two adds in the
/// same millisecond, or the clock stepping backwards), the previous value
/// plus one is issued instead.
pub struct TimestampIdGenerator<C: Clock> {
    clock: C,
    last: AtomicU64,
}

impl<C: Clock> TimestampIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last: AtomicU64::new(0),
        }
    }

    fn now_millis(&self) -> u64 {
        self.clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn reserve(&self) -> u64 {
        let now = self.now_millis();
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(prev.saturating_add(1))
    }
}

impl<C: Clock> IdGenerator for TimestampIdGenerator<C> {
    fn next_id(&self) -> PlanetId {
        // Decimal digits are never empty, so this cannot fail.
        PlanetId::new(self.reserve().to_string())
            .unwrap_or_else(|_| PlanetId(String::from("0")))
    }
}
