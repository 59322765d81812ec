//! Onboarding feature: edition gate, registration wizard and submission.
//!
//! [`OnboardingReducer`] owns every state change. Loading, the submission
//! batch, its refetch and the payment redirect are effects executed by the
//! runtime store.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod types;

#[cfg(test)]
mod tests;

pub use actions::OnboardingAction;
pub use environment::OnboardingEnvironment;
pub use reducer::OnboardingReducer;
pub use types::{
    Notification, NotificationLevel, Notifications, OnboardingSnapshot, OnboardingState,
    PendingMutations, RegistrationRecord, SubmissionBatch,
};
