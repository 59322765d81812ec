//! Registration wizard.
//!
//! The step list depends on the participation value, forward navigation is
//! gated by a two-phase validation (whole form, then the current step's
//! fields) and `step_done` tracks how far the user got.

pub mod state;
pub mod steps;

pub use state::{PrimaryButton, Transition, WizardState};
pub use steps::{check_advance, compute_steps, Advance, StepId, SPORT_STEP_INDEX};
