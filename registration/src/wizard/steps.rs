//! Step sequence and per-step field sets.

use crate::error::FieldErrors;
use crate::participation::{fields, ParticipationKind, RegistrationForm};
use serde::{Deserialize, Serialize};

/// Wizard step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Identity and contact
    Information,
    /// Participation kind
    Participation,
    /// Sport choice, athletes only
    Sport,
    /// Product selection
    Package,
    /// Recap and submission
    Summary,
}

impl StepId {
    /// Fields validated before leaving the step
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Information => &[
                fields::FIRST_NAME,
                fields::LAST_NAME,
                fields::EMAIL,
                fields::PHONE,
            ],
            Self::Participation => &[fields::PARTICIPATION, fields::ALSO_VOLUNTEER],
            Self::Sport => &[
                fields::SPORT_ID,
                fields::SPORT_CATEGORY,
                fields::TEAM_ID,
                fields::LICENSE,
                fields::SUBSTITUTE,
            ],
            Self::Package | Self::Summary => &[],
        }
    }
}

/// Index the Sport step is inserted at
pub const SPORT_STEP_INDEX: usize = 2;

/// Steps for a participation value
///
/// The base sequence is Information, Participation, Package, Summary. Sport is
/// inserted right after Participation for athletes.
#[must_use]
pub fn compute_steps(participation: Option<ParticipationKind>) -> Vec<StepId> {
    let mut steps = vec![
        StepId::Information,
        StepId::Participation,
        StepId::Package,
        StepId::Summary,
    ];
    if participation.is_some_and(ParticipationKind::is_sport) {
        steps.insert(SPORT_STEP_INDEX, StepId::Sport);
    }
    steps
}

/// Outcome of the two-phase check run before moving forward
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The whole form validates
    FullFormValid,
    /// The form has errors, none of them on this step
    StepFieldsValid,
    /// Fields of this step are invalid
    Blocked(FieldErrors),
}

impl Advance {
    /// Whether the transition may happen
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Blocked(_))
    }
}

/// Validate the whole form, then fall back to the fields of `step`
#[must_use]
pub fn check_advance(form: &RegistrationForm, step: StepId) -> Advance {
    let errors = form.field_errors();
    if errors.is_empty() {
        return Advance::FullFormValid;
    }
    let step_errors = errors.restricted_to(step.fields());
    if step_errors.is_empty() {
        Advance::StepFieldsValid
    } else {
        Advance::Blocked(step_errors)
    }
}
