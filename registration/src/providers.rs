//! Backend collaborators.
//!
//! Every backend resource the onboarding flow touches sits behind a trait so
//! the reducer only ever sees `Arc<dyn ...>` handles. Production code plugs an
//! HTTP client in; tests and the demo use
//! [`InMemoryBackend`](crate::backend::InMemoryBackend).

use crate::error::ProviderError;
use crate::types::{
    CompetitionUser, CompetitionUserBody, Edition, EditionId, Participant, ParticipantInfo,
    Payment, ProductFilters, ProductVariant, Purchase, SportId, UserId, VariantId,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Provider call result
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Boxed future returned by provider calls
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send + 'a>>;

/// Source of the active edition
pub trait EditionProvider: Send + Sync {
    /// The active edition, if any
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    fn active_edition(&self) -> ProviderFuture<'_, Option<Edition>>;
}

/// The signed-in user's registration
pub trait RegistrationProvider: Send + Sync {
    /// The user's registration for `edition_id`, if any
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    fn my_competition_user(&self, edition_id: EditionId)
    -> ProviderFuture<'_, Option<CompetitionUser>>;

    /// Register the user for an edition
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the registration
    fn create_competition_user(
        &self,
        body: CompetitionUserBody,
    ) -> ProviderFuture<'_, CompetitionUser>;

    /// Change the declared roles and category of an existing registration
    ///
    /// # Errors
    ///
    /// Returns error if there is no registration or the backend refuses the
    /// change
    fn update_competition_user(
        &self,
        body: CompetitionUserBody,
    ) -> ProviderFuture<'_, CompetitionUser>;
}

/// The signed-in user's sport entry
pub trait ParticipantProvider: Send + Sync {
    /// The user's participant record for `edition_id`, if any
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    fn my_participant(&self, edition_id: EditionId) -> ProviderFuture<'_, Option<Participant>>;

    /// Enter a sport
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the entry
    fn create_participant(
        &self,
        sport_id: SportId,
        info: ParticipantInfo,
    ) -> ProviderFuture<'_, Participant>;

    /// Change team, license or substitute flag within the same sport
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the update
    fn update_participant(
        &self,
        sport_id: SportId,
        info: ParticipantInfo,
    ) -> ProviderFuture<'_, Participant>;

    /// Leave a sport
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the withdrawal
    fn withdraw_participant(&self, sport_id: SportId) -> ProviderFuture<'_, ()>;
}

/// Product catalog
pub trait CatalogProvider: Send + Sync {
    /// Variants on sale for the given filters
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    fn list_available_variants(
        &self,
        filters: ProductFilters,
    ) -> ProviderFuture<'_, Vec<ProductVariant>>;
}

/// The signed-in user's purchases
pub trait PurchaseProvider: Send + Sync {
    /// Persisted purchases of `user_id`
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    fn list_my_purchases(&self, user_id: UserId) -> ProviderFuture<'_, Vec<Purchase>>;

    /// Persist a purchase, replacing any purchase of the same variant
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the purchase
    fn create_purchase(&self, body: Purchase) -> ProviderFuture<'_, Purchase>;

    /// Remove the purchase of a variant
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses the deletion
    fn delete_purchase(&self, variant_id: VariantId) -> ProviderFuture<'_, ()>;
}

/// Payments and the payment gateway entry point
pub trait PaymentProvider: Send + Sync {
    /// Payments received for `user_id`
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails
    fn list_my_payments(&self, user_id: UserId) -> ProviderFuture<'_, Vec<Payment>>;

    /// URL of the payment page for the signed-in user
    ///
    /// # Errors
    ///
    /// Returns error if the gateway cannot open a payment
    fn request_payment_redirect_url(&self) -> ProviderFuture<'_, String>;
}

/// Client-side navigation
pub trait Navigator: Send + Sync {
    /// Navigate to `path`
    fn redirect(&self, path: &str);
}

/// Every collaborator the onboarding reducer talks to
#[derive(Clone)]
pub struct Providers {
    /// Editions
    pub editions: Arc<dyn EditionProvider>,
    /// Registrations
    pub registrations: Arc<dyn RegistrationProvider>,
    /// Participants
    pub participants: Arc<dyn ParticipantProvider>,
    /// Catalog
    pub catalog: Arc<dyn CatalogProvider>,
    /// Purchases
    pub purchases: Arc<dyn PurchaseProvider>,
    /// Payments
    pub payments: Arc<dyn PaymentProvider>,
    /// Navigation
    pub navigator: Arc<dyn Navigator>,
}

impl Providers {
    /// Use one backend for every resource
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>, navigator: Arc<dyn Navigator>) -> Self
    where
        B: EditionProvider
            + RegistrationProvider
            + ParticipantProvider
            + CatalogProvider
            + PurchaseProvider
            + PaymentProvider
            + 'static,
    {
        Self {
            editions: backend.clone(),
            registrations: backend.clone(),
            participants: backend.clone(),
            catalog: backend.clone(),
            purchases: backend.clone(),
            payments: backend,
            navigator,
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

/// Await a provider call, giving up after `timeout`
///
/// # Errors
///
/// Returns the call's own error, or [`ProviderError::Unavailable`] when the
/// call did not settle in time.
pub async fn with_timeout<T>(timeout: Duration, call: ProviderFuture<'_, T>) -> ProviderResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Unavailable(format!(
            "no answer within {}ms",
            timeout.as_millis()
        ))),
    }
}
