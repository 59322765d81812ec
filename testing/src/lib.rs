//! # Onboarding Testing
//!
//! Testing utilities for onboarding reducers.
//!
//! This crate provides:
//! - Deterministic clocks for the edition window checks
//! - The [`ReducerTest`] Given-When-Then harness
//! - Assertion helpers over returned effects
//!
//! ## Example
//!
//! ```ignore
//! use onboarding_testing::{clock_at, ReducerTest};
//!
//! ReducerTest::new(OnboardingReducer::new())
//!     .with_env(environment_with_clock(clock_at("2025-03-01T10:00:00Z")))
//!     .given_state(loaded_state())
//!     .when_action(OnboardingAction::Render)
//!     .then_state(|s| assert!(matches!(s.view, View::Dashboard)))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use onboarding_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use onboarding_testing::mocks::FixedClock;
    /// use onboarding_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        clock_at("2025-01-01T00:00:00Z")
    }

    /// Create a fixed clock from an RFC 3339 timestamp
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not valid RFC 3339. Only meant for literals
    /// written in tests.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn clock_at(timestamp: &str) -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339(timestamp)
                .expect("test timestamp should be RFC 3339")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{clock_at, test_clock, FixedClock};
pub use reducer_test::{assertions, ReducerTest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_clock_at_parses_offset() {
        let clock = clock_at("2025-09-01T08:00:00+02:00");
        assert_eq!(clock.now().to_rfc3339(), "2025-09-01T06:00:00+00:00");
    }
}
