//! Edition lifecycle gate.
//!
//! Picks the top-level view from edition timing and the user's registration
//! and payment state. The gate is a pure function; the registration redirect
//! it may ask for goes through [`RedirectGuard`].

use crate::types::{CompetitionUser, Edition, EditionId};
use chrono::{DateTime, Utc};

/// Everything the gate looks at
#[derive(Clone, Copy, Debug)]
pub struct GateInputs<'a> {
    /// Active edition, once loaded
    pub edition: Option<&'a Edition>,
    /// User's registration, if any
    pub competition_user: Option<&'a CompetitionUser>,
    /// At least one payment was received
    pub has_paid: bool,
    /// The school accepts inscriptions
    pub school_inscription_enabled: bool,
    /// A session token is present
    pub token_present: bool,
    /// A load is in flight
    pub is_loading: bool,
}

/// Why a registration is not complete yet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncompleteReason {
    /// Not validated by the BDS and not paid
    AwaitingValidationAndPayment,
    /// Paid, not validated by the BDS yet
    AwaitingValidation,
    /// Validated by the BDS, not paid yet
    AwaitingPayment,
}

impl IncompleteReason {
    /// Message shown on the incomplete-registration card
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AwaitingValidationAndPayment => {
                "Your registration is waiting for validation by your BDS and your payment has not been received yet."
            },
            Self::AwaitingValidation => {
                "Your payment has been received. Your registration is waiting for validation by your BDS."
            },
            Self::AwaitingPayment => {
                "Your registration has been validated by your BDS. Complete your payment to finalise it."
            },
        }
    }
}

/// Top-level view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// No edition loaded yet
    AwaitingEdition,
    /// The school does not accept inscriptions
    InscriptionsClosed,
    /// The edition has not started
    Waiting {
        /// Opening of the edition
        starts_at: DateTime<Utc>,
    },
    /// The user must go through the wizard
    RedirectToRegistration,
    /// Registered but not validated or not paid
    IncompleteRegistration(IncompleteReason),
    /// Fully registered
    Dashboard,
}

/// Validated by the BDS and paid
#[must_use]
pub fn is_fully_registered(user: Option<&CompetitionUser>, has_paid: bool) -> bool {
    user.is_some_and(|u| u.validated) && has_paid
}

/// Choose the view for `inputs` at `now`
///
/// Without a registration the wizard is only offered while the edition is
/// running and the school accepts inscriptions; otherwise inscriptions are
/// closed.
#[must_use]
pub fn select_view(inputs: &GateInputs<'_>, now: DateTime<Utc>) -> View {
    let Some(edition) = inputs.edition else {
        return View::AwaitingEdition;
    };

    if !edition.has_started(now) {
        return if inputs.school_inscription_enabled {
            View::Waiting {
                starts_at: edition.start_date,
            }
        } else {
            View::InscriptionsClosed
        };
    }

    let Some(user) = inputs.competition_user else {
        return if inputs.school_inscription_enabled && !edition.has_ended(now) {
            View::RedirectToRegistration
        } else {
            View::InscriptionsClosed
        };
    };

    match (user.validated, inputs.has_paid) {
        (true, true) => View::Dashboard,
        (false, false) => View::IncompleteRegistration(IncompleteReason::AwaitingValidationAndPayment),
        (false, true) => View::IncompleteRegistration(IncompleteReason::AwaitingValidation),
        (true, false) => View::IncompleteRegistration(IncompleteReason::AwaitingPayment),
    }
}

/// Values the registration redirect depends on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedirectDeps {
    /// Active edition
    pub edition_id: EditionId,
    /// A registration exists
    pub registered: bool,
    /// The school accepts inscriptions
    pub school_inscription_enabled: bool,
    /// A session token is present
    pub token_present: bool,
    /// The edition is over
    pub edition_ended: bool,
}

/// Fires the registration redirect at most once per dependency combination
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedirectGuard {
    last_fired: Option<RedirectDeps>,
    fired: u32,
}

impl RedirectGuard {
    /// Whether the redirect should fire now, recording it if so
    ///
    /// Never fires while loading, without a token, once the edition is over,
    /// or twice in a row for the same dependencies.
    pub fn should_fire(&mut self, view: &View, inputs: &GateInputs<'_>, now: DateTime<Utc>) -> bool {
        if inputs.is_loading || !inputs.token_present || *view != View::RedirectToRegistration {
            return false;
        }
        let Some(edition) = inputs.edition else {
            return false;
        };
        let deps = RedirectDeps {
            edition_id: edition.id,
            registered: inputs.competition_user.is_some(),
            school_inscription_enabled: inputs.school_inscription_enabled,
            token_present: inputs.token_present,
            edition_ended: edition.has_ended(now),
        };
        if deps.edition_ended || self.last_fired == Some(deps) {
            return false;
        }
        self.last_fired = Some(deps);
        self.fired += 1;
        true
    }

    /// How many times the redirect fired
    #[must_use]
    pub const fn fired(&self) -> u32 {
        self.fired
    }
}
