//! Identifier and time sources consumed by the consistency manager.
//!
//! Both are injected so tests can run against deterministic values.

use crate::model::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Allocates record identifiers. Must not repeat within a process lifetime.
pub trait IdGenerator {
    fn next_id(&self) -> Uuid;
}

/// Supplies the current time for `createdAt`/`updatedAt`.
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

/// Random (version 4) identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Wall clock in Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                Timestamp::try_from(elapsed.as_millis()).unwrap_or(Timestamp::MAX)
            })
    }
}

impl<T: IdGenerator + ?Sized> IdGenerator for &T {
    fn next_id(&self) -> Uuid {
        (**self).next_id()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> Timestamp {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, IdGenerator, RandomIdGenerator, SystemClock};

    #[test]
    fn random_ids_are_distinct_v4() {
        let ids = RandomIdGenerator;
        let first = ids.next_id();
        let second = ids.next_id();
        assert_ne!(first, second);
        assert_eq!(first.get_version_num(), 4);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
