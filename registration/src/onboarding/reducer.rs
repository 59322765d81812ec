//! Reducer for the onboarding feature.
//!
//! State only changes here. Backend work is returned as effects whose
//! outcome comes back as an [`OnboardingAction`]. A submission is one
//! sequential effect: registration, then sport entry, then every purchase
//! change in parallel, then the refetch of the registration record. The
//! refetch therefore only starts once the whole batch has settled. Giving up
//! the athlete role swaps the first two stages so the sport entry is
//! withdrawn before the role.

use super::actions::OnboardingAction;
use super::environment::OnboardingEnvironment;
use super::types::{
    NotificationLevel, OnboardingSnapshot, OnboardingState, RegistrationRecord, SubmissionBatch,
};
use crate::basket::{Basket, Toggle};
use crate::catalog::Catalog;
use crate::error::{FormLevelError, MutationError, MutationKind, MutationTarget};
use crate::lifecycle::select_view;
use crate::participation::{Declaration, RegistrationForm};
use crate::providers::{with_timeout, ParticipantProvider, ProviderResult, Providers};
use crate::reconciliation::{self, ReconciliationPlan};
use crate::session::Session;
use crate::types::{
    CompetitionUserBody, EditionId, ParticipantInfo, ProductFilters, Purchase, SportId, UserId,
};
use crate::wizard::WizardState;
use onboarding_core::{async_effect, delay, effect::Effect, reducer::Reducer, request, smallvec, SmallVec};
use std::sync::Arc;
use std::time::Duration;

type Effects = SmallVec<[Effect<OnboardingAction>; 4]>;

/// Onboarding reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct OnboardingReducer;

impl OnboardingReducer {
    /// Create a new onboarding reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for OnboardingReducer {
    type State = OnboardingState;
    type Action = OnboardingAction;
    type Environment = OnboardingEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            // ========== Lifecycle ==========
            OnboardingAction::Load => {
                if state.is_loading {
                    return smallvec![Effect::None];
                }
                state.is_loading = true;
                let providers = env.providers.clone();
                let session = env.session.clone();
                let timeout = env.config.request_timeout();
                smallvec![request! {
                    call: load_snapshot(providers, session, timeout),
                    on_success: |snapshot| Some(OnboardingAction::Loaded {
                        snapshot: Box::new(snapshot),
                    }),
                    on_error: |error| Some(OnboardingAction::LoadFailed { error })
                }]
            },

            OnboardingAction::Loaded { snapshot } => {
                let OnboardingSnapshot {
                    edition,
                    record,
                    catalog,
                } = *snapshot;
                state.is_loading = false;
                state.edition = edition;
                state.catalog = catalog;
                state.record = record;
                state.wizard = wizard_from_record(state, &env.session);
                tracing::debug!(
                    registered = state.record.competition_user.is_some(),
                    variants = state.catalog.variants().len(),
                    "onboarding loaded"
                );
                render(state, env).into_iter().collect()
            },

            OnboardingAction::LoadFailed { error } => {
                state.is_loading = false;
                tracing::warn!(%error, "onboarding load failed");
                state.notifications.push(
                    NotificationLevel::Error,
                    format!("Could not load your registration: {error}"),
                );
                render(state, env).into_iter().collect()
            },

            OnboardingAction::Render => render(state, env).into_iter().collect(),

            // ========== Wizard navigation ==========
            OnboardingAction::ScrollNext => {
                let transition = state.wizard.scroll_next();
                tracing::debug!(?transition, "scroll next");
                smallvec![Effect::None]
            },

            OnboardingAction::ScrollPrev => {
                let transition = state.wizard.scroll_prev();
                tracing::debug!(?transition, "scroll prev");
                smallvec![Effect::None]
            },

            OnboardingAction::JumpTo { index } => {
                let transition = state.wizard.jump_to(index);
                tracing::debug!(index, ?transition, "jump to step");
                smallvec![Effect::None]
            },

            // ========== Form ==========
            OnboardingAction::SetParticipation { kind } => {
                state.wizard.set_participation(kind);
                let offered = state.offered_catalog(&env.session);
                prune_basket(state, &offered);
                refresh_form_error(state, &offered);
                smallvec![Effect::None]
            },

            OnboardingAction::EditForm(edit) => {
                let roles = state.wizard.form().roles();
                state.wizard.edit(edit);
                let offered = state.offered_catalog(&env.session);
                if state.wizard.form().roles() != roles {
                    prune_basket(state, &offered);
                }
                refresh_form_error(state, &offered);
                smallvec![Effect::None]
            },

            // ========== Basket ==========
            OnboardingAction::ToggleVariant {
                product_id,
                variant_id,
            } => {
                let offered = state.offered_catalog(&env.session);
                let toggle = state
                    .wizard
                    .basket
                    .toggle_variant(&offered, product_id, variant_id);
                if toggle == Toggle::Unknown {
                    tracing::warn!(%product_id, %variant_id, "variant is not offered");
                }
                refresh_form_error(state, &offered);
                smallvec![Effect::None]
            },

            OnboardingAction::SetQuantity { variant_id, value } => {
                let quantity = state.wizard.basket.set_quantity(variant_id, value);
                tracing::debug!(%variant_id, value, ?quantity, "set quantity");
                smallvec![Effect::None]
            },

            // ========== Submission ==========
            OnboardingAction::Submit => submit(state, env),

            OnboardingAction::CompetitionUserCreated { user } => {
                state.pending.settle(MutationKind::Create);
                state.record.competition_user = Some(user);
                smallvec![Effect::None]
            },

            OnboardingAction::CompetitionUserUpdated { user } => {
                state.pending.settle(MutationKind::Update);
                state.record.competition_user = Some(user);
                smallvec![Effect::None]
            },

            OnboardingAction::ParticipantCreated { participant } => {
                state.pending.settle(MutationKind::Create);
                state.record.participant = Some(participant);
                smallvec![Effect::None]
            },

            OnboardingAction::ParticipantUpdated { participant } => {
                state.pending.settle(MutationKind::Update);
                state.record.participant = Some(participant);
                smallvec![Effect::None]
            },

            OnboardingAction::ParticipantWithdrawn { sport_id } => {
                state.pending.settle(MutationKind::Delete);
                if state
                    .record
                    .participant
                    .as_ref()
                    .is_some_and(|p| p.sport_id == sport_id)
                {
                    state.record.participant = None;
                }
                smallvec![Effect::None]
            },

            OnboardingAction::PurchaseCreated { line } => {
                state.pending.settle(MutationKind::Create);
                let purchases = &mut state.record.purchases;
                purchases.retain(|p| p.product_variant_id != line.variant_id);
                purchases.push(Purchase::from(line));
                smallvec![Effect::None]
            },

            OnboardingAction::PurchaseDeleted { variant_id } => {
                state.pending.settle(MutationKind::Delete);
                state
                    .record
                    .purchases
                    .retain(|p| p.product_variant_id != variant_id);
                smallvec![Effect::None]
            },

            OnboardingAction::MutationFailed { error } => {
                state.pending.settle(error.kind);
                if let Some(batch) = state.batch.as_mut() {
                    batch.failures += 1;
                }
                tracing::warn!(%error, "mutation failed");
                state
                    .notifications
                    .push(NotificationLevel::Error, format!("Could not save: {error}"));
                smallvec![Effect::None]
            },

            OnboardingAction::RefreshRegistration => {
                if state.is_loading || state.batch.is_some() {
                    return smallvec![Effect::None];
                }
                let Some(edition_id) = state.edition.as_ref().map(|e| e.id) else {
                    return smallvec![Effect::None];
                };
                state.is_loading = true;
                smallvec![refresh(env, edition_id)]
            },

            OnboardingAction::RegistrationRefreshed { record } => {
                state.is_loading = false;
                state.record = *record;
                let offered = state.offered_catalog(&env.session);
                let (basket, unknown) = Basket::from_purchases(&state.record.purchases, &offered);
                if !unknown.is_empty() {
                    tracing::warn!(count = unknown.len(), "persisted purchases outside the offered catalog");
                }
                state.wizard.basket = basket;
                refresh_form_error(state, &offered);

                let mut effects = Effects::new();
                if let Some(batch) = state.batch.take() {
                    effects.extend(finish_batch(state, env, batch));
                }
                effects.extend(render(state, env));
                effects
            },

            OnboardingAction::RefreshFailed { error } => {
                state.is_loading = false;
                tracing::warn!(%error, "registration refresh failed");
                state.notifications.push(
                    NotificationLevel::Error,
                    format!("Could not refresh your registration: {error}"),
                );

                let mut effects = Effects::new();
                if let Some(batch) = state.batch.take() {
                    // the record already holds every confirmed mutation
                    let offered = state.offered_catalog(&env.session);
                    let (basket, _) = Basket::from_purchases(&state.record.purchases, &offered);
                    state.wizard.basket = basket;
                    refresh_form_error(state, &offered);
                    effects.extend(finish_batch(state, env, batch));
                }
                effects.extend(render(state, env));
                effects
            },

            // ========== Payment ==========
            OnboardingAction::RequestPayment => {
                if state.payment_pending || state.record.competition_user.is_none() {
                    return smallvec![Effect::None];
                }
                state.payment_pending = true;
                let payments = Arc::clone(&env.providers.payments);
                let timeout = env.config.request_timeout();
                smallvec![request! {
                    call: with_timeout(timeout, payments.request_payment_redirect_url()),
                    on_success: |url| Some(OnboardingAction::PaymentUrlReceived { url }),
                    on_error: |error| Some(OnboardingAction::PaymentRequestFailed { error })
                }]
            },

            OnboardingAction::PaymentUrlReceived { url } => {
                state.payment_pending = false;
                tracing::info!(%url, "redirecting to payment");
                smallvec![navigate(env, url)]
            },

            OnboardingAction::PaymentRequestFailed { error } => {
                state.payment_pending = false;
                tracing::warn!(%error, "payment request failed");
                state.notifications.push(
                    NotificationLevel::Error,
                    format!("Could not open the payment page: {error}"),
                );
                smallvec![Effect::None]
            },

            // ========== Notifications ==========
            OnboardingAction::DismissNotification { id } => {
                state.notifications.dismiss(id);
                smallvec![Effect::None]
            },
        }
    }
}

// ============================================================================
// View gate
// ============================================================================

/// Recompute the view and fire the registration redirect if the guard allows
fn render(state: &mut OnboardingState, env: &OnboardingEnvironment) -> Option<Effect<OnboardingAction>> {
    let now = env.clock().now();
    let inputs = state.gate_inputs(&env.session);
    let view = select_view(&inputs, now);
    let mut guard = state.redirect_guard;
    let fire = guard.should_fire(&view, &inputs, now);
    state.redirect_guard = guard;

    if state.view != view {
        tracing::debug!(?view, "view changed");
        state.view = view;
    }
    if !fire {
        return None;
    }
    tracing::info!(path = %env.config.register_path, "redirecting to registration");
    Some(navigate(env, env.config.register_path.clone()))
}

fn navigate(env: &OnboardingEnvironment, path: String) -> Effect<OnboardingAction> {
    let navigator = Arc::clone(&env.providers.navigator);
    async_effect! {
        navigator.redirect(&path);
        None
    }
}

/// Push a notification that dismisses itself after the configured delay
fn notify(
    state: &mut OnboardingState,
    env: &OnboardingEnvironment,
    level: NotificationLevel,
    message: impl Into<String>,
) -> Effect<OnboardingAction> {
    let id = state.notifications.push(level, message);
    match env.config.notification_ttl() {
        Some(ttl) => delay! {
            duration: ttl,
            action: OnboardingAction::DismissNotification { id }
        },
        None => Effect::None,
    }
}

// ============================================================================
// Wizard helpers
// ============================================================================

/// Wizard matching the persisted registration, or a fresh one
fn wizard_from_record(state: &OnboardingState, session: &Session) -> WizardState {
    let Some(user) = state.record.competition_user.as_ref() else {
        return WizardState::new(RegistrationForm::from_profile(&session.profile));
    };
    let form = RegistrationForm::from_records(&session.profile, user, state.record.participant.as_ref());
    let offered = state.catalog.offered_to(session.school_type, &form.roles());
    let (basket, unknown) = Basket::from_purchases(&state.record.purchases, &offered);
    if !unknown.is_empty() {
        tracing::warn!(count = unknown.len(), "persisted purchases outside the offered catalog");
    }
    WizardState::prefilled(form, basket)
}

/// Drop basket lines the declared roles no longer allow
fn prune_basket(state: &mut OnboardingState, offered: &Catalog) {
    let removed = state.wizard.basket.retain_offered(offered);
    if !removed.is_empty() {
        tracing::debug!(removed = removed.len(), "basket pruned after role change");
    }
}

/// Keep a shown form-level error in sync with the form and basket
fn refresh_form_error(state: &mut OnboardingState, offered: &Catalog) {
    match state.wizard.form_error().cloned() {
        Some(FormLevelError::MissingRequiredProduct { .. }) => {
            match state.wizard.basket.first_missing_required(offered) {
                Some(product_name) => {
                    let error = FormLevelError::MissingRequiredProduct {
                        product_name: product_name.to_string(),
                    };
                    state.wizard.set_form_error(error);
                },
                None => state.wizard.clear_form_error(),
            }
        },
        Some(FormLevelError::InvalidForm { .. }) if state.wizard.form().field_errors().is_empty() => {
            state.wizard.clear_form_error();
        },
        _ => {},
    }
}

// ============================================================================
// Submission
// ============================================================================

/// One outgoing mutation
struct Mutation {
    kind: MutationKind,
    effect: Effect<OnboardingAction>,
}

fn submit(state: &mut OnboardingState, env: &OnboardingEnvironment) -> Effects {
    if state.batch.is_some() || state.pending.is_pending(MutationKind::Create) {
        tracing::debug!("submission already in flight");
        return smallvec![Effect::None];
    }
    if !state.wizard.is_last_step() {
        tracing::debug!(step = state.wizard.current_step(), "submit outside the last step");
        return smallvec![Effect::None];
    }
    let Some(edition_id) = state.edition.as_ref().map(|e| e.id) else {
        state.wizard.set_form_error(FormLevelError::NoActiveEdition);
        return smallvec![Effect::None];
    };
    if !state.wizard.validate_for_submit() {
        tracing::info!(
            invalid = state.wizard.errors().len(),
            "submission blocked by invalid fields"
        );
        return smallvec![Effect::None];
    }
    let Some(declaration) = state.wizard.form().declaration() else {
        return smallvec![Effect::None];
    };

    let offered = state.offered_catalog(&env.session);
    let plan = match reconciliation::plan(&state.wizard.basket, &offered, &state.record.purchases) {
        Ok(plan) => plan,
        Err(error) => {
            tracing::info!(%error, "submission blocked");
            state.wizard.set_form_error(error);
            return smallvec![Effect::None];
        },
    };
    state.wizard.clear_form_error();
    tracing::info!(
        creates = plan.to_create.len(),
        deletes = plan.to_delete.len(),
        "reconciling purchases"
    );

    let timeout = env.config.request_timeout();
    let body = declaration.competition_user(edition_id);
    let current_user = state.record.competition_user.as_ref();
    // a sport entry must be withdrawn before the athlete role is dropped
    let leaves_sport = current_user.is_some_and(|u| u.is_athlete) && !body.roles.athlete;
    let registration: Vec<Mutation> = match current_user {
        None => vec![create_competition_user(&env.providers, body, timeout)],
        Some(user) if !user.matches(&body) => {
            vec![update_competition_user(&env.providers, body, timeout)]
        },
        Some(_) => Vec::new(),
    };
    let participant = participant_mutations(state, env, &declaration, timeout);
    let purchases = purchase_mutations(&env.providers, plan, timeout);

    let ordered = if leaves_sport {
        [(participant, true), (registration, true), (purchases, false)]
    } else {
        [(registration, true), (participant, true), (purchases, false)]
    };

    let mut batch = SubmissionBatch::default();
    let mut stages = Vec::new();
    for (group, sequential) in ordered {
        if group.is_empty() {
            continue;
        }
        let mut effects = Vec::with_capacity(group.len());
        for mutation in group {
            state.pending.begin(mutation.kind);
            batch.issued += 1;
            effects.push(mutation.effect);
        }
        stages.push(if sequential {
            Effect::Sequential(effects)
        } else {
            Effect::Parallel(effects)
        });
    }
    stages.push(refresh(env, edition_id));
    state.batch = Some(batch);

    smallvec![Effect::Sequential(stages)]
}

fn finish_batch(state: &mut OnboardingState, env: &OnboardingEnvironment, batch: SubmissionBatch) -> Effects {
    if batch.failures == 0 {
        tracing::info!(issued = batch.issued, "registration saved");
        smallvec![
            notify(state, env, NotificationLevel::Success, "Your registration has been saved."),
            navigate(env, env.config.home_path.clone()),
        ]
    } else {
        tracing::warn!(issued = batch.issued, failures = batch.failures, "registration partially saved");
        state.notifications.push(
            NotificationLevel::Error,
            format!(
                "{} of {} changes could not be saved. Your selection shows what was saved.",
                batch.failures, batch.issued
            ),
        );
        smallvec![Effect::None]
    }
}

fn create_competition_user(providers: &Providers, body: CompetitionUserBody, timeout: Duration) -> Mutation {
    let registrations = Arc::clone(&providers.registrations);
    Mutation {
        kind: MutationKind::Create,
        effect: request! {
            call: with_timeout(timeout, registrations.create_competition_user(body)),
            on_success: |user| Some(OnboardingAction::CompetitionUserCreated { user }),
            on_error: |error| Some(OnboardingAction::MutationFailed {
                error: MutationError::new(MutationKind::Create, MutationTarget::CompetitionUser, error),
            })
        },
    }
}

fn update_competition_user(providers: &Providers, body: CompetitionUserBody, timeout: Duration) -> Mutation {
    let registrations = Arc::clone(&providers.registrations);
    Mutation {
        kind: MutationKind::Update,
        effect: request! {
            call: with_timeout(timeout, registrations.update_competition_user(body)),
            on_success: |user| Some(OnboardingAction::CompetitionUserUpdated { user }),
            on_error: |error| Some(OnboardingAction::MutationFailed {
                error: MutationError::new(MutationKind::Update, MutationTarget::CompetitionUser, error),
            })
        },
    }
}

/// Sport entry changes: withdraw the old sport before entering a new one
fn participant_mutations(
    state: &OnboardingState,
    env: &OnboardingEnvironment,
    declaration: &Declaration,
    timeout: Duration,
) -> Vec<Mutation> {
    let school_id = env.session.school_id;
    let current = state.record.participant.as_ref();
    let wanted = declaration.sport.as_ref();
    let participants = &env.providers.participants;

    match (current, wanted) {
        (Some(current), Some(entry)) if current.sport_id != entry.sport_id => vec![
            withdraw_participant(participants, current.sport_id, timeout),
            create_participant(participants, entry.sport_id, entry.info(school_id), timeout),
        ],
        (Some(current), Some(entry)) if current.info() != entry.info(school_id) => {
            let participants = Arc::clone(participants);
            let (sport_id, info) = (entry.sport_id, entry.info(school_id));
            vec![Mutation {
                kind: MutationKind::Update,
                effect: request! {
                    call: with_timeout(timeout, participants.update_participant(sport_id, info)),
                    on_success: |participant| Some(OnboardingAction::ParticipantUpdated { participant }),
                    on_error: |error| Some(OnboardingAction::MutationFailed {
                        error: MutationError::new(MutationKind::Update, MutationTarget::Participant(sport_id), error),
                    })
                },
            }]
        },
        (Some(current), None) => vec![withdraw_participant(participants, current.sport_id, timeout)],
        (None, Some(entry)) => vec![create_participant(
            participants,
            entry.sport_id,
            entry.info(school_id),
            timeout,
        )],
        _ => Vec::new(),
    }
}

fn create_participant(
    participants: &Arc<dyn ParticipantProvider>,
    sport_id: SportId,
    info: ParticipantInfo,
    timeout: Duration,
) -> Mutation {
    let participants = Arc::clone(participants);
    Mutation {
        kind: MutationKind::Create,
        effect: request! {
            call: with_timeout(timeout, participants.create_participant(sport_id, info)),
            on_success: |participant| Some(OnboardingAction::ParticipantCreated { participant }),
            on_error: |error| Some(OnboardingAction::MutationFailed {
                error: MutationError::new(MutationKind::Create, MutationTarget::Participant(sport_id), error),
            })
        },
    }
}

fn withdraw_participant(
    participants: &Arc<dyn ParticipantProvider>,
    sport_id: SportId,
    timeout: Duration,
) -> Mutation {
    let participants = Arc::clone(participants);
    Mutation {
        kind: MutationKind::Delete,
        effect: request! {
            call: with_timeout(timeout, participants.withdraw_participant(sport_id)),
            on_success: |()| Some(OnboardingAction::ParticipantWithdrawn { sport_id }),
            on_error: |error| Some(OnboardingAction::MutationFailed {
                error: MutationError::new(MutationKind::Delete, MutationTarget::Participant(sport_id), error),
            })
        },
    }
}

/// Independent creates and deletes
fn purchase_mutations(providers: &Providers, plan: ReconciliationPlan, timeout: Duration) -> Vec<Mutation> {
    let creates = plan.to_create.into_iter().map(|line| {
        let purchases = Arc::clone(&providers.purchases);
        Mutation {
            kind: MutationKind::Create,
            effect: request! {
                call: with_timeout(timeout, purchases.create_purchase(Purchase::from(line))),
                on_success: |_| Some(OnboardingAction::PurchaseCreated { line }),
                on_error: |error| Some(OnboardingAction::MutationFailed {
                    error: MutationError::new(MutationKind::Create, MutationTarget::Purchase(line.variant_id), error),
                })
            },
        }
    });
    let deletes = plan.to_delete.into_iter().map(|line| {
        let purchases = Arc::clone(&providers.purchases);
        let variant_id = line.variant_id;
        Mutation {
            kind: MutationKind::Delete,
            effect: request! {
                call: with_timeout(timeout, purchases.delete_purchase(variant_id)),
                on_success: |()| Some(OnboardingAction::PurchaseDeleted { variant_id }),
                on_error: |error| Some(OnboardingAction::MutationFailed {
                    error: MutationError::new(MutationKind::Delete, MutationTarget::Purchase(variant_id), error),
                })
            },
        }
    });
    creates.chain(deletes).collect()
}

// ============================================================================
// Loading
// ============================================================================

fn refresh(env: &OnboardingEnvironment, edition_id: EditionId) -> Effect<OnboardingAction> {
    let providers = env.providers.clone();
    let user_id = env.session.user_id;
    let timeout = env.config.request_timeout();
    request! {
        call: fetch_record(&providers, edition_id, user_id, timeout),
        on_success: |record| Some(OnboardingAction::RegistrationRefreshed {
            record: Box::new(record),
        }),
        on_error: |error| Some(OnboardingAction::RefreshFailed { error })
    }
}

async fn load_snapshot(
    providers: Providers,
    session: Session,
    timeout: Duration,
) -> ProviderResult<OnboardingSnapshot> {
    let Some(edition) = with_timeout(timeout, providers.editions.active_edition()).await? else {
        return Ok(OnboardingSnapshot::default());
    };
    let filters = ProductFilters {
        edition_id: edition.id,
        school_type: session.school_type,
    };
    let (record, variants) = futures::try_join!(
        fetch_record(&providers, edition.id, session.user_id, timeout),
        with_timeout(timeout, providers.catalog.list_available_variants(filters)),
    )?;
    Ok(OnboardingSnapshot {
        edition: Some(edition),
        record,
        catalog: Catalog::new(variants),
    })
}

async fn fetch_record(
    providers: &Providers,
    edition_id: EditionId,
    user_id: UserId,
    timeout: Duration,
) -> ProviderResult<RegistrationRecord> {
    let (competition_user, participant, purchases, payments) = futures::try_join!(
        with_timeout(timeout, providers.registrations.my_competition_user(edition_id)),
        with_timeout(timeout, providers.participants.my_participant(edition_id)),
        with_timeout(timeout, providers.purchases.list_my_purchases(user_id)),
        with_timeout(timeout, providers.payments.list_my_payments(user_id)),
    )?;
    Ok(RegistrationRecord {
        competition_user,
        participant,
        purchases,
        has_paid: !payments.is_empty(),
    })
}
