// crates/attendance-core/src/runtime/clock.rs
// ============================================================================
// Module: Clocks
// Description: Wall-clock and manual clock implementations.
// Purpose: Supply registration instants without reading time inside the manager.
// Dependencies: crate::interfaces, time
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads the UTC wall clock. [`ManualClock`] is set explicitly
//! and is used by tests that assert registration ordering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use time::OffsetDateTime;

use crate::interfaces::Clock;
use crate::model::Timestamp;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// UTC wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(OffsetDateTime::now_utc())
    }
}

// ============================================================================
// SECTION: Manual Clock
// ============================================================================

/// Clock that only moves when told to.
///
/// Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Current instant in unix milliseconds.
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock pinned to the given instant.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.as_unix_millis())),
        }
    }

    /// Moves the clock to an explicit instant.
    pub fn set(&self, instant: Timestamp) {
        self.millis.store(instant.as_unix_millis(), Ordering::SeqCst);
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.millis.load(Ordering::SeqCst))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Clock;
    use super::ManualClock;
    use super::Timestamp;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Timestamp::from_unix_millis(10));
        let other = clock.clone();
        clock.advance_millis(5);
        assert_eq!(other.now(), Timestamp::from_unix_millis(15));
        other.set(Timestamp::from_unix_millis(100));
        assert_eq!(clock.now(), Timestamp::from_unix_millis(100));
    }
}
