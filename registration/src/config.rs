//! Configuration for the onboarding client.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Onboarding configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Wizard route the gate redirects unregistered users to
    pub register_path: String,
    /// Route navigated to after a submission with no failed item
    pub home_path: String,
    /// Notifications retained before the oldest is dropped
    pub max_notifications: usize,
    /// Auto-dismiss delay for notifications in milliseconds (0 keeps them)
    pub notification_ttl_ms: u64,
    /// Timeout applied to each provider call in milliseconds
    pub request_timeout_ms: u64,
    /// Log filter (`RUST_LOG` syntax)
    pub log_level: String,
}

impl OnboardingConfig {
    /// Load configuration from environment variables
    ///
    /// Falls back to defaults for missing or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            register_path: env::var("ONBOARDING_REGISTER_PATH")
                .unwrap_or(defaults.register_path),
            home_path: env::var("ONBOARDING_HOME_PATH").unwrap_or(defaults.home_path),
            max_notifications: env::var("ONBOARDING_MAX_NOTIFICATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_notifications),
            notification_ttl_ms: env::var("ONBOARDING_NOTIFICATION_TTL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.notification_ttl_ms),
            request_timeout_ms: env::var("ONBOARDING_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Auto-dismiss delay, `None` when notifications stay until dismissed
    #[must_use]
    pub const fn notification_ttl(&self) -> Option<Duration> {
        if self.notification_ttl_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.notification_ttl_ms))
        }
    }

    /// Timeout applied to each provider call
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            register_path: "/register".to_string(),
            home_path: "/".to_string(),
            max_notifications: 5,
            notification_ttl_ms: 5000,
            request_timeout_ms: 10_000,
            log_level: "info".to_string(),
        }
    }
}
