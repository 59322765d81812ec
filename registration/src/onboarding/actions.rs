//! Actions for the onboarding reducer.

use super::types::{OnboardingSnapshot, RegistrationRecord};
use crate::error::{MutationError, ProviderError};
use crate::participation::{FormEdit, ParticipationKind};
use crate::reconciliation::PurchaseLine;
use crate::types::{CompetitionUser, Participant, ProductId, SportId, VariantId};

/// Onboarding actions
///
/// User intents come from the screens; the other variants are fed back by
/// effects once a backend request settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OnboardingAction {
    // ========== Lifecycle ==========
    /// Load the edition, the registration and the catalog
    Load,

    /// Load succeeded
    Loaded {
        /// Loaded records
        snapshot: Box<OnboardingSnapshot>,
    },

    /// Load failed
    LoadFailed {
        /// Provider failure
        error: ProviderError,
    },

    /// Re-evaluate the view, e.g. after the clock moved
    Render,

    // ========== Wizard navigation ==========
    /// Next button
    ScrollNext,

    /// Previous button
    ScrollPrev,

    /// Step header click
    JumpTo {
        /// Target step index
        index: usize,
    },

    // ========== Form ==========
    /// Choose the participation kind
    SetParticipation {
        /// New value
        kind: Option<ParticipationKind>,
    },

    /// Edit one form field
    EditForm(FormEdit),

    // ========== Basket ==========
    /// Click on a variant
    ToggleVariant {
        /// Product the variant belongs to
        product_id: ProductId,
        /// Variant clicked
        variant_id: VariantId,
    },

    /// Change the quantity of a selected variant
    SetQuantity {
        /// Variant
        variant_id: VariantId,
        /// Requested quantity, clamped
        value: i64,
    },

    // ========== Submission ==========
    /// Submit the wizard
    Submit,

    /// Registration created
    CompetitionUserCreated {
        /// Created record
        user: CompetitionUser,
    },

    /// Declared roles or category changed
    CompetitionUserUpdated {
        /// Updated record
        user: CompetitionUser,
    },

    /// Sport entry created
    ParticipantCreated {
        /// Created record
        participant: Participant,
    },

    /// Sport entry updated
    ParticipantUpdated {
        /// Updated record
        participant: Participant,
    },

    /// Sport entry withdrawn
    ParticipantWithdrawn {
        /// Sport left
        sport_id: SportId,
    },

    /// Purchase created
    PurchaseCreated {
        /// Created line
        line: PurchaseLine,
    },

    /// Purchase deleted
    PurchaseDeleted {
        /// Variant removed
        variant_id: VariantId,
    },

    /// A mutation failed; only its item stays unreconciled
    MutationFailed {
        /// Failure
        error: MutationError,
    },

    /// Fetch the registration record again
    RefreshRegistration,

    /// Registration record fetched
    RegistrationRefreshed {
        /// Authoritative record
        record: Box<RegistrationRecord>,
    },

    /// Registration record could not be fetched
    RefreshFailed {
        /// Provider failure
        error: ProviderError,
    },

    // ========== Payment ==========
    /// Open the payment page
    RequestPayment,

    /// Payment page URL received
    PaymentUrlReceived {
        /// Where to send the user
        url: String,
    },

    /// Payment page could not be opened
    PaymentRequestFailed {
        /// Provider failure
        error: ProviderError,
    },

    // ========== Notifications ==========
    /// Remove a notification
    DismissNotification {
        /// Notification id
        id: u64,
    },
}
