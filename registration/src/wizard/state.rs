//! Wizard state machine.

use super::steps::{check_advance, compute_steps, Advance, StepId, SPORT_STEP_INDEX};
use crate::basket::Basket;
use crate::error::{FieldErrors, FormLevelError};
use crate::participation::{fields, FormEdit, ParticipationKind, RegistrationForm};

/// Result of a navigation request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The current step changed
    Moved {
        /// Previous step index
        from: usize,
        /// New step index
        to: usize,
    },
    /// Fields of the current step are invalid
    Blocked,
    /// Nothing to do
    Unchanged,
}

/// Label of the primary wizard button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryButton {
    /// Move to the next step
    Next,
    /// Submit the registration
    Submit,
}

/// Ephemeral wizard state
///
/// `current_step <= step_done` always holds: the user can only stand on a step
/// every earlier step of which was passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardState {
    steps: Vec<StepId>,
    current_step: usize,
    step_done: usize,
    form: RegistrationForm,
    errors: FieldErrors,
    form_error: Option<FormLevelError>,
    /// Selected variants
    pub basket: Basket,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(RegistrationForm::default())
    }
}

impl WizardState {
    /// Fresh wizard on the first step
    #[must_use]
    pub fn new(form: RegistrationForm) -> Self {
        Self {
            steps: compute_steps(form.participation),
            current_step: 0,
            step_done: 0,
            form,
            errors: FieldErrors::new(),
            form_error: None,
            basket: Basket::new(),
        }
    }

    /// Wizard for an existing registration, every step reachable
    #[must_use]
    pub fn prefilled(form: RegistrationForm, basket: Basket) -> Self {
        let mut wizard = Self::new(form);
        wizard.step_done = wizard.steps.len() - 1;
        wizard.basket = basket;
        wizard
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    /// Index of the current step
    #[must_use]
    pub const fn current_step(&self) -> usize {
        self.current_step
    }

    /// Highest step index reached
    #[must_use]
    pub const fn step_done(&self) -> usize {
        self.step_done
    }

    /// The current step
    #[must_use]
    pub fn current(&self) -> StepId {
        self.steps[self.current_step]
    }

    /// Whether the current step is the last one
    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == self.steps.len()
    }

    /// Next on every step but the last, Submit on the last
    #[must_use]
    pub fn primary_button(&self) -> PrimaryButton {
        if self.is_last_step() {
            PrimaryButton::Submit
        } else {
            PrimaryButton::Next
        }
    }

    /// The edited values
    #[must_use]
    pub const fn form(&self) -> &RegistrationForm {
        &self.form
    }

    /// Inline field errors currently shown
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Form-level error currently shown
    #[must_use]
    pub const fn form_error(&self) -> Option<&FormLevelError> {
        self.form_error.as_ref()
    }

    /// Show a form-level error
    pub fn set_form_error(&mut self, error: FormLevelError) {
        self.form_error = Some(error);
    }

    /// Hide the form-level error
    pub fn clear_form_error(&mut self) {
        self.form_error = None;
    }

    /// Move forward if the form or the current step validates
    ///
    /// A blocked transition shows the step's errors inline.
    pub fn scroll_next(&mut self) -> Transition {
        if self.is_last_step() {
            return Transition::Unchanged;
        }
        let step = self.current();
        match check_advance(&self.form, step) {
            Advance::Blocked(errors) => {
                self.errors = errors;
                Transition::Blocked
            },
            Advance::FullFormValid | Advance::StepFieldsValid => {
                for field in step.fields() {
                    self.errors.remove(field);
                }
                let from = self.current_step;
                self.current_step += 1;
                self.step_done = self.step_done.max(from + 1);
                Transition::Moved {
                    from,
                    to: self.current_step,
                }
            },
        }
    }

    /// Move back one step
    pub fn scroll_prev(&mut self) -> Transition {
        if self.current_step == 0 {
            return Transition::Unchanged;
        }
        let from = self.current_step;
        self.current_step -= 1;
        Transition::Moved {
            from,
            to: self.current_step,
        }
    }

    /// Jump to a step already reached
    pub fn jump_to(&mut self, index: usize) -> Transition {
        if index > self.step_done || index >= self.steps.len() || index == self.current_step {
            return Transition::Unchanged;
        }
        let from = self.current_step;
        self.current_step = index;
        Transition::Moved { from, to: index }
    }

    /// Change the participation value
    ///
    /// Crossing between the sport and non-sport branches inserts or removes
    /// the Sport step and clamps `step_done` to the Sport step index.
    pub fn set_participation(&mut self, kind: Option<ParticipationKind>) {
        let was_sport = self.form.is_sport();
        self.form.participation = kind;
        self.errors.remove(fields::PARTICIPATION);

        if was_sport != self.form.is_sport() {
            self.steps = compute_steps(kind);
            self.step_done = self.step_done.min(SPORT_STEP_INDEX);
            self.current_step = self.current_step.min(self.step_done);
            if !self.form.is_sport() {
                for field in StepId::Sport.fields() {
                    self.errors.remove(field);
                }
            }
        }
    }

    /// Apply one field edit and hide that field's error
    pub fn edit(&mut self, edit: FormEdit) {
        self.errors.remove(edit.field());
        self.form.apply(edit);
    }

    /// Validate every field before submission
    ///
    /// On failure the errors are shown, a form-level error lists the invalid
    /// fields and the wizard moves back to the first step holding one.
    pub fn validate_for_submit(&mut self) -> bool {
        let errors = self.form.field_errors();
        if errors.is_empty() {
            return true;
        }
        let first_invalid = self
            .steps
            .iter()
            .position(|step| step.fields().iter().any(|field| errors.contains(field)));
        if let Some(index) = first_invalid {
            self.current_step = self.current_step.min(index);
        }
        self.form_error = Some(FormLevelError::InvalidForm {
            fields: errors.fields().map(ToString::to_string).collect(),
        });
        self.errors = errors;
        false
    }
}
