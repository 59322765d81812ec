//! Environment for the onboarding reducer.

use crate::config::OnboardingConfig;
use crate::providers::Providers;
use crate::session::Session;
use onboarding_core::environment::Clock;
use std::sync::Arc;

/// Dependencies of the onboarding reducer
///
/// Built once per screen from the session, the configuration and the backend
/// collaborators. Tests swap the clock for a fixed one and the providers for
/// the in-memory backend.
#[derive(Clone)]
pub struct OnboardingEnvironment {
    /// Signed-in user
    pub session: Session,
    /// Configuration
    pub config: OnboardingConfig,
    /// Backend collaborators
    pub providers: Providers,
    clock: Arc<dyn Clock>,
}

impl OnboardingEnvironment {
    /// Create an environment
    #[must_use]
    pub fn new(
        session: Session,
        config: OnboardingConfig,
        providers: Providers,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            config,
            providers,
            clock,
        }
    }

    /// Clock for edition timing
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl std::fmt::Debug for OnboardingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingEnvironment")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
