//! State types for the onboarding feature.

use crate::catalog::Catalog;
use crate::error::MutationKind;
use crate::lifecycle::{GateInputs, RedirectGuard, View};
use crate::session::Session;
use crate::types::{CompetitionUser, Edition, Participant, Purchase};
use crate::wizard::WizardState;
use std::collections::VecDeque;

// ============================================================================
// Notifications
// ============================================================================

/// Severity of a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Informational
    Info,
    /// Something succeeded
    Success,
    /// Something failed
    Error,
}

/// A message in the notification channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Identifier used to dismiss it
    pub id: u64,
    /// Severity
    pub level: NotificationLevel,
    /// Text shown to the user
    pub message: String,
}

/// Bounded notification channel, oldest first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notifications {
    items: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_capacity(5)
    }
}

impl Notifications {
    /// Channel keeping at most `capacity` notifications
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Add a notification, dropping the oldest when full
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(Notification {
            id,
            level,
            message: message.into(),
        });
        id
    }

    /// Remove a notification; unknown ids are ignored
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        before != self.items.len()
    }

    /// Notifications, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    /// Number of notifications
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the channel is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recent notification
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.items.back()
    }
}

// ============================================================================
// Pending mutations
// ============================================================================

/// In-flight mutation counts, one per kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingMutations {
    create: u32,
    update: u32,
    delete: u32,
    validate: u32,
}

impl PendingMutations {
    const fn slot(&mut self, kind: MutationKind) -> &mut u32 {
        match kind {
            MutationKind::Create => &mut self.create,
            MutationKind::Update => &mut self.update,
            MutationKind::Delete => &mut self.delete,
            MutationKind::Validate => &mut self.validate,
        }
    }

    /// Record a request of `kind` going out
    pub fn begin(&mut self, kind: MutationKind) {
        *self.slot(kind) += 1;
    }

    /// Record a request of `kind` settling
    pub fn settle(&mut self, kind: MutationKind) {
        let slot = self.slot(kind);
        *slot = slot.saturating_sub(1);
    }

    /// In-flight requests of `kind`
    #[must_use]
    pub const fn count(&self, kind: MutationKind) -> u32 {
        match kind {
            MutationKind::Create => self.create,
            MutationKind::Update => self.update,
            MutationKind::Delete => self.delete,
            MutationKind::Validate => self.validate,
        }
    }

    /// Whether a request of `kind` is in flight
    #[must_use]
    pub const fn is_pending(&self, kind: MutationKind) -> bool {
        self.count(kind) > 0
    }

    /// Whether nothing is in flight
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.create == 0 && self.update == 0 && self.delete == 0 && self.validate == 0
    }
}

/// Tally of one submission
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmissionBatch {
    /// Requests issued
    pub issued: usize,
    /// Requests that failed
    pub failures: usize,
}

// ============================================================================
// Server records
// ============================================================================

/// The user's registration as persisted
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationRecord {
    /// Registration, if any
    pub competition_user: Option<CompetitionUser>,
    /// Sport entry, if any
    pub participant: Option<Participant>,
    /// Purchases
    pub purchases: Vec<Purchase>,
    /// At least one payment was received
    pub has_paid: bool,
}

/// Everything loaded when the onboarding screen opens
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OnboardingSnapshot {
    /// Active edition
    pub edition: Option<Edition>,
    /// The user's registration
    pub record: RegistrationRecord,
    /// Catalog for the user's school
    pub catalog: Catalog,
}

// ============================================================================
// State
// ============================================================================

/// Onboarding state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnboardingState {
    /// Active edition
    pub edition: Option<Edition>,
    /// Persisted registration
    pub record: RegistrationRecord,
    /// Catalog for the user's school, every role
    pub catalog: Catalog,
    /// A load is in flight
    pub is_loading: bool,
    /// Current top-level view
    pub view: View,
    /// Once-only registration redirect
    pub redirect_guard: RedirectGuard,
    /// Wizard
    pub wizard: WizardState,
    /// In-flight mutations
    pub pending: PendingMutations,
    /// A payment URL request is in flight
    pub payment_pending: bool,
    /// Submission waiting for its refetch
    pub batch: Option<SubmissionBatch>,
    /// Notification channel
    pub notifications: Notifications,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self::new(5)
    }
}

impl OnboardingState {
    /// Empty state with a notification channel of `max_notifications`
    #[must_use]
    pub fn new(max_notifications: usize) -> Self {
        Self {
            edition: None,
            record: RegistrationRecord::default(),
            catalog: Catalog::default(),
            is_loading: false,
            view: View::AwaitingEdition,
            redirect_guard: RedirectGuard::default(),
            wizard: WizardState::default(),
            pending: PendingMutations::default(),
            payment_pending: false,
            batch: None,
            notifications: Notifications::with_capacity(max_notifications),
        }
    }

    /// Gate inputs for the current state
    #[must_use]
    pub fn gate_inputs<'a>(&'a self, session: &Session) -> GateInputs<'a> {
        GateInputs {
            edition: self.edition.as_ref(),
            competition_user: self.record.competition_user.as_ref(),
            has_paid: self.record.has_paid,
            school_inscription_enabled: session.school_inscription_enabled,
            token_present: session.token_present(),
            is_loading: self.is_loading,
        }
    }

    /// Catalog offered for the roles currently declared in the wizard
    #[must_use]
    pub fn offered_catalog(&self, session: &Session) -> Catalog {
        self.catalog.offered_to(session.school_type, &self.wizard.form().roles())
    }
}
