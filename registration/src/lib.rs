//! # Onboarding Registration
//!
//! Competition onboarding for a multi-school sports event: the edition gate
//! deciding what the signed-in user sees, the multi-step registration wizard,
//! the product basket and the reconciliation of that basket with the
//! purchases already stored by the backend.
//!
//! ## Layout
//!
//! - [`types`], [`session`], [`config`], [`error`]: domain records and ambient concerns
//! - [`providers`]: async traits for every backend collaborator
//! - [`catalog`], [`basket`], [`reconciliation`]: product selection and diffing
//! - [`participation`], [`wizard`]: the registration form and its steps
//! - [`lifecycle`]: the edition gate and the once-only registration redirect
//! - [`onboarding`]: the reducer tying everything together
//! - [`backend`]: an in-memory backend and navigators
//!
//! ## Example
//!
//! ```ignore
//! use onboarding_registration::onboarding::{OnboardingAction, OnboardingReducer, OnboardingState};
//! use onboarding_runtime::Store;
//!
//! let store = Store::new(OnboardingState::new(5), OnboardingReducer::new(), env);
//! store.send(OnboardingAction::Load).await?;
//! ```

pub mod backend;
pub mod basket;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod onboarding;
pub mod participation;
pub mod providers;
pub mod reconciliation;
pub mod session;
pub mod types;
pub mod wizard;

pub use basket::{Basket, BasketLine, Toggle, MAX_QUANTITY};
pub use catalog::{Catalog, ProductGroup, SelectionMode};
pub use config::OnboardingConfig;
pub use error::{
    FieldErrors, FieldValidationError, FormLevelError, MutationError, MutationKind,
    MutationTarget, ProviderError,
};
pub use lifecycle::{select_view, IncompleteReason, RedirectGuard, View};
pub use participation::{Declaration, FormEdit, ParticipationKind, RegistrationForm};
pub use providers::{Navigator, Providers};
pub use reconciliation::{PurchaseLine, ReconciliationPlan};
pub use session::{Session, UserProfile};
