//! In-memory backend implementing every provider trait.
//!
//! Serves one signed-in user. Every call is recorded in completion order and
//! a failure can be queued for the next call of an operation, optionally
//! restricted to one variant. Seeding and BDS actions are plain methods.

use crate::error::ProviderError;
use crate::providers::{
    CatalogProvider, EditionProvider, ParticipantProvider, PaymentProvider, ProviderFuture,
    ProviderResult, PurchaseProvider, RegistrationProvider,
};
use crate::types::{
    CompetitionUser, CompetitionUserBody, Edition, EditionId, Money, Participant, ParticipantInfo,
    Payment, ProductFilters, ProductVariant, Purchase, SportId, UserId, VariantId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Backend operation, one per provider method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `EditionProvider::active_edition`
    ActiveEdition,
    /// `RegistrationProvider::my_competition_user`
    MyCompetitionUser,
    /// `RegistrationProvider::create_competition_user`
    CreateCompetitionUser,
    /// `RegistrationProvider::update_competition_user`
    UpdateCompetitionUser,
    /// `ParticipantProvider::my_participant`
    MyParticipant,
    /// `ParticipantProvider::create_participant`
    CreateParticipant,
    /// `ParticipantProvider::update_participant`
    UpdateParticipant,
    /// `ParticipantProvider::withdraw_participant`
    WithdrawParticipant,
    /// `CatalogProvider::list_available_variants`
    ListVariants,
    /// `PurchaseProvider::list_my_purchases`
    ListPurchases,
    /// `PurchaseProvider::create_purchase`
    CreatePurchase,
    /// `PurchaseProvider::delete_purchase`
    DeletePurchase,
    /// `PaymentProvider::list_my_payments`
    ListPayments,
    /// `PaymentProvider::request_payment_redirect_url`
    RequestPaymentUrl,
}

impl Operation {
    /// Whether the operation changes data
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateCompetitionUser
                | Self::UpdateCompetitionUser
                | Self::CreateParticipant
                | Self::UpdateParticipant
                | Self::WithdrawParticipant
                | Self::CreatePurchase
                | Self::DeletePurchase
        )
    }
}

/// A recorded call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendCall {
    /// Operation
    pub operation: Operation,
    /// Variant the call was about, for purchase mutations
    pub variant_id: Option<VariantId>,
    /// Whether the call succeeded
    pub succeeded: bool,
}

#[derive(Debug)]
struct QueuedFailure {
    operation: Operation,
    variant_id: Option<VariantId>,
    error: ProviderError,
}

#[derive(Debug, Default)]
struct Data {
    edition: Option<Edition>,
    users: HashMap<UserId, CompetitionUser>,
    participants: HashMap<UserId, Participant>,
    variants: Vec<ProductVariant>,
    purchases: HashMap<UserId, Vec<Purchase>>,
    payments: HashMap<UserId, Vec<Payment>>,
    payment_url: String,
}

/// In-memory backend for tests and the demo
#[derive(Debug)]
pub struct InMemoryBackend {
    user_id: UserId,
    latency: Duration,
    data: RwLock<Data>,
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<Vec<QueuedFailure>>,
}

impl InMemoryBackend {
    /// Empty backend serving `user_id`
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            latency: Duration::ZERO,
            data: RwLock::new(Data {
                payment_url: "https://pay.example.org/checkout".to_string(),
                ..Data::default()
            }),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Delay every call by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Data> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Data> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn call_log(&self) -> MutexGuard<'_, Vec<BackendCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failure_queue(&self) -> MutexGuard<'_, Vec<QueuedFailure>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========== Seeding ==========

    /// Set the active edition
    pub fn set_edition(&self, edition: Option<Edition>) {
        self.write().edition = edition;
    }

    /// Add variants to the catalog
    pub fn add_variants(&self, variants: impl IntoIterator<Item = ProductVariant>) {
        self.write().variants.extend(variants);
    }

    /// Store a registration as if it had been submitted earlier
    pub fn seed_competition_user(&self, user: CompetitionUser) {
        self.write().users.insert(user.user_id, user);
    }

    /// Store a sport entry
    pub fn seed_participant(&self, participant: Participant) {
        self.write().participants.insert(participant.user_id, participant);
    }

    /// Store a purchase of `user_id`
    pub fn seed_purchase(&self, user_id: UserId, purchase: Purchase) {
        let mut data = self.write();
        let purchases = data.purchases.entry(user_id).or_default();
        purchases.retain(|p| p.product_variant_id != purchase.product_variant_id);
        purchases.push(purchase);
    }

    /// Set the URL returned by the payment provider
    pub fn set_payment_url(&self, url: impl Into<String>) {
        self.write().payment_url = url.into();
    }

    // ========== External actors ==========

    /// BDS approval of a registration; returns whether one existed
    pub fn validate_registration(&self, user_id: UserId, validated: bool) -> bool {
        match self.write().users.get_mut(&user_id) {
            Some(user) => {
                user.validated = validated;
                true
            },
            None => false,
        }
    }

    /// A payment received for `user_id`
    pub fn record_payment(&self, user_id: UserId, amount: Money, paid_at: DateTime<Utc>) {
        self.write().payments.entry(user_id).or_default().push(Payment {
            user_id,
            amount,
            paid_at,
        });
    }

    // ========== Failure injection ==========

    /// Fail the next call of `operation`
    pub fn fail_next(&self, operation: Operation, error: ProviderError) {
        self.failure_queue().push(QueuedFailure {
            operation,
            variant_id: None,
            error,
        });
    }

    /// Fail the next call of `operation` about `variant_id`
    pub fn fail_next_for_variant(&self, operation: Operation, variant_id: VariantId, error: ProviderError) {
        self.failure_queue().push(QueuedFailure {
            operation,
            variant_id: Some(variant_id),
            error,
        });
    }

    // ========== Inspection ==========

    /// Registration of `user_id`
    #[must_use]
    pub fn competition_user(&self, user_id: UserId) -> Option<CompetitionUser> {
        self.read().users.get(&user_id).cloned()
    }

    /// Sport entry of `user_id`
    #[must_use]
    pub fn participant(&self, user_id: UserId) -> Option<Participant> {
        self.read().participants.get(&user_id).cloned()
    }

    /// Purchases of `user_id`
    #[must_use]
    pub fn purchases(&self, user_id: UserId) -> Vec<Purchase> {
        self.read().purchases.get(&user_id).cloned().unwrap_or_default()
    }

    /// Calls in completion order
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.call_log().clone()
    }

    /// Number of calls of `operation`
    #[must_use]
    pub fn call_count(&self, operation: Operation) -> usize {
        self.call_log()
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.call_log().clear();
    }

    /// Wait out the latency, then consume a queued failure if one matches
    async fn enter(&self, operation: Operation, variant_id: Option<VariantId>) -> ProviderResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failure = {
            let mut queue = self.failure_queue();
            queue
                .iter()
                .position(|f| {
                    f.operation == operation && (f.variant_id.is_none() || f.variant_id == variant_id)
                })
                .map(|index| queue.remove(index).error)
        };
        match failure {
            Some(error) => {
                self.log(operation, variant_id, false);
                Err(error)
            },
            None => Ok(()),
        }
    }

    fn log(&self, operation: Operation, variant_id: Option<VariantId>, succeeded: bool) {
        self.call_log().push(BackendCall {
            operation,
            variant_id,
            succeeded,
        });
    }

    fn finish<T>(
        &self,
        operation: Operation,
        variant_id: Option<VariantId>,
        result: ProviderResult<T>,
    ) -> ProviderResult<T> {
        self.log(operation, variant_id, result.is_ok());
        if let Err(error) = &result {
            tracing::debug!(?operation, %error, "in-memory backend refused call");
        }
        result
    }
}

impl EditionProvider for InMemoryBackend {
    fn active_edition(&self) -> ProviderFuture<'_, Option<Edition>> {
        Box::pin(async move {
            self.enter(Operation::ActiveEdition, None).await?;
            let edition = self.read().edition.clone().filter(|e| e.active);
            self.finish(Operation::ActiveEdition, None, Ok(edition))
        })
    }
}

impl RegistrationProvider for InMemoryBackend {
    fn my_competition_user(
        &self,
        edition_id: EditionId,
    ) -> ProviderFuture<'_, Option<CompetitionUser>> {
        Box::pin(async move {
            self.enter(Operation::MyCompetitionUser, None).await?;
            let user = self
                .read()
                .users
                .get(&self.user_id)
                .filter(|u| u.edition_id == edition_id)
                .cloned();
            self.finish(Operation::MyCompetitionUser, None, Ok(user))
        })
    }

    fn create_competition_user(
        &self,
        body: CompetitionUserBody,
    ) -> ProviderFuture<'_, CompetitionUser> {
        Box::pin(async move {
            self.enter(Operation::CreateCompetitionUser, None).await?;
            let result = {
                let mut data = self.write();
                if data.users.contains_key(&self.user_id) {
                    Err(ProviderError::Rejected("already registered".to_string()))
                } else {
                    let user = CompetitionUser {
                        user_id: self.user_id,
                        edition_id: body.edition_id,
                        is_athlete: body.roles.athlete,
                        is_volunteer: body.roles.volunteer,
                        is_pompom: body.roles.pompom,
                        is_fanfare: body.roles.fanfare,
                        is_cameraman: body.roles.cameraman,
                        sport_category: body.sport_category,
                        validated: false,
                    };
                    data.users.insert(self.user_id, user.clone());
                    Ok(user)
                }
            };
            self.finish(Operation::CreateCompetitionUser, None, result)
        })
    }

    fn update_competition_user(
        &self,
        body: CompetitionUserBody,
    ) -> ProviderFuture<'_, CompetitionUser> {
        Box::pin(async move {
            self.enter(Operation::UpdateCompetitionUser, None).await?;
            let result = {
                let mut data = self.write();
                let entered = data.participants.contains_key(&self.user_id);
                match data
                    .users
                    .get_mut(&self.user_id)
                    .filter(|u| u.edition_id == body.edition_id)
                {
                    None => Err(ProviderError::NotFound("registration".to_string())),
                    Some(_) if entered && !body.roles.athlete => Err(ProviderError::Rejected(
                        "withdraw from your sport before giving up the athlete role".to_string(),
                    )),
                    Some(user) => {
                        user.is_athlete = body.roles.athlete;
                        user.is_volunteer = body.roles.volunteer;
                        user.is_pompom = body.roles.pompom;
                        user.is_fanfare = body.roles.fanfare;
                        user.is_cameraman = body.roles.cameraman;
                        user.sport_category = body.sport_category;
                        Ok(user.clone())
                    },
                }
            };
            self.finish(Operation::UpdateCompetitionUser, None, result)
        })
    }
}

impl ParticipantProvider for InMemoryBackend {
    fn my_participant(&self, edition_id: EditionId) -> ProviderFuture<'_, Option<Participant>> {
        Box::pin(async move {
            self.enter(Operation::MyParticipant, None).await?;
            let participant = {
                let data = self.read();
                let registered = data
                    .users
                    .get(&self.user_id)
                    .is_some_and(|u| u.edition_id == edition_id);
                data.participants
                    .get(&self.user_id)
                    .filter(|_| registered)
                    .cloned()
            };
            self.finish(Operation::MyParticipant, None, Ok(participant))
        })
    }

    fn create_participant(
        &self,
        sport_id: SportId,
        info: ParticipantInfo,
    ) -> ProviderFuture<'_, Participant> {
        Box::pin(async move {
            self.enter(Operation::CreateParticipant, None).await?;
            let result = {
                let mut data = self.write();
                if !data.users.get(&self.user_id).is_some_and(|u| u.is_athlete) {
                    Err(ProviderError::Rejected("only registered athletes can enter a sport".to_string()))
                } else if data.participants.contains_key(&self.user_id) {
                    Err(ProviderError::Rejected("withdraw from the current sport first".to_string()))
                } else {
                    let participant = Participant {
                        user_id: self.user_id,
                        sport_id,
                        school_id: info.school_id,
                        team_id: info.team_id,
                        license: info.license,
                        is_license_valid: false,
                        substitute: info.substitute,
                    };
                    data.participants.insert(self.user_id, participant.clone());
                    Ok(participant)
                }
            };
            self.finish(Operation::CreateParticipant, None, result)
        })
    }

    fn update_participant(
        &self,
        sport_id: SportId,
        info: ParticipantInfo,
    ) -> ProviderFuture<'_, Participant> {
        Box::pin(async move {
            self.enter(Operation::UpdateParticipant, None).await?;
            let result = match self
                .write()
                .participants
                .get_mut(&self.user_id)
                .filter(|p| p.sport_id == sport_id)
            {
                Some(participant) => {
                    participant.team_id = info.team_id;
                    participant.substitute = info.substitute;
                    if participant.license != info.license {
                        participant.license = info.license;
                        participant.is_license_valid = false;
                    }
                    Ok(participant.clone())
                },
                None => Err(ProviderError::NotFound(format!("participant for sport {sport_id}"))),
            };
            self.finish(Operation::UpdateParticipant, None, result)
        })
    }

    fn withdraw_participant(&self, sport_id: SportId) -> ProviderFuture<'_, ()> {
        Box::pin(async move {
            self.enter(Operation::WithdrawParticipant, None).await?;
            let result = {
                let mut data = self.write();
                if data
                    .participants
                    .get(&self.user_id)
                    .is_some_and(|p| p.sport_id == sport_id)
                {
                    data.participants.remove(&self.user_id);
                    Ok(())
                } else {
                    Err(ProviderError::NotFound(format!("participant for sport {sport_id}")))
                }
            };
            self.finish(Operation::WithdrawParticipant, None, result)
        })
    }
}

impl CatalogProvider for InMemoryBackend {
    fn list_available_variants(
        &self,
        filters: ProductFilters,
    ) -> ProviderFuture<'_, Vec<ProductVariant>> {
        Box::pin(async move {
            self.enter(Operation::ListVariants, None).await?;
            let variants = {
                let data = self.read();
                if data.edition.as_ref().is_some_and(|e| e.id == filters.edition_id) {
                    data.variants
                        .iter()
                        .filter(|v| v.school_type == filters.school_type)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                }
            };
            self.finish(Operation::ListVariants, None, Ok(variants))
        })
    }
}

impl PurchaseProvider for InMemoryBackend {
    fn list_my_purchases(&self, user_id: UserId) -> ProviderFuture<'_, Vec<Purchase>> {
        Box::pin(async move {
            self.enter(Operation::ListPurchases, None).await?;
            let purchases = self.purchases(user_id);
            self.finish(Operation::ListPurchases, None, Ok(purchases))
        })
    }

    fn create_purchase(&self, body: Purchase) -> ProviderFuture<'_, Purchase> {
        let variant_id = Some(body.product_variant_id);
        Box::pin(async move {
            self.enter(Operation::CreatePurchase, variant_id).await?;
            let result = {
                let mut data = self.write();
                match data.variants.iter().find(|v| v.id == body.product_variant_id) {
                    None => Err(ProviderError::NotFound(format!(
                        "variant {}",
                        body.product_variant_id
                    ))),
                    Some(_) if body.quantity == 0 => {
                        Err(ProviderError::Rejected("quantity must be at least 1".to_string()))
                    },
                    Some(variant) if variant.unique && body.quantity > 1 => Err(
                        ProviderError::Rejected("unique variants are bought once".to_string()),
                    ),
                    Some(_) => {
                        let purchases = data.purchases.entry(self.user_id).or_default();
                        purchases.retain(|p| p.product_variant_id != body.product_variant_id);
                        purchases.push(body);
                        Ok(body)
                    },
                }
            };
            self.finish(Operation::CreatePurchase, variant_id, result)
        })
    }

    fn delete_purchase(&self, variant_id: VariantId) -> ProviderFuture<'_, ()> {
        Box::pin(async move {
            self.enter(Operation::DeletePurchase, Some(variant_id)).await?;
            let result = {
                let mut data = self.write();
                let purchases = data.purchases.entry(self.user_id).or_default();
                let before = purchases.len();
                purchases.retain(|p| p.product_variant_id != variant_id);
                if purchases.len() == before {
                    Err(ProviderError::NotFound(format!("purchase of variant {variant_id}")))
                } else {
                    Ok(())
                }
            };
            self.finish(Operation::DeletePurchase, Some(variant_id), result)
        })
    }
}

impl PaymentProvider for InMemoryBackend {
    fn list_my_payments(&self, user_id: UserId) -> ProviderFuture<'_, Vec<Payment>> {
        Box::pin(async move {
            self.enter(Operation::ListPayments, None).await?;
            let payments = self.read().payments.get(&user_id).cloned().unwrap_or_default();
            self.finish(Operation::ListPayments, None, Ok(payments))
        })
    }

    fn request_payment_redirect_url(&self) -> ProviderFuture<'_, String> {
        Box::pin(async move {
            self.enter(Operation::RequestPaymentUrl, None).await?;
            let url = format!("{}?user={}", self.read().payment_url, self.user_id);
            self.finish(Operation::RequestPaymentUrl, None, Ok(url))
        })
    }
}
