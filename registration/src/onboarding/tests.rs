//! Reducer tests for the onboarding feature.
//!
//! Effects are inspected, not executed; the in-memory backend only backs the
//! environment.

#![allow(clippy::expect_used)]

use super::*;
use crate::backend::{InMemoryBackend, RecordingNavigator};
use crate::basket::Basket;
use crate::catalog::fixtures::{counted, for_public, variant};
use crate::catalog::Catalog;
use crate::config::OnboardingConfig;
use crate::error::{FormLevelError, MutationError, MutationKind, MutationTarget, ProviderError};
use crate::lifecycle::{IncompleteReason, View};
use crate::participation::fixtures::{valid_form, valid_sport_form};
use crate::participation::{FormEdit, ParticipationKind, RegistrationForm};
use crate::providers::Providers;
use crate::session::Session;
use crate::types::{
    CompetitionUser, Edition, EditionId, Participant, ProductId, ProductVariant, PublicType,
    Purchase, SchoolId, SchoolType, SportCategory, SportId, UserId,
};
use crate::wizard::{StepId, WizardState};
use chrono::Duration as ChronoDuration;
use onboarding_core::effect::Effect;
use onboarding_core::environment::Clock;
use onboarding_testing::{assertions, test_clock, ReducerTest};
use std::sync::Arc;

fn session() -> Session {
    Session::new(UserId::new(), SchoolId::new(), SchoolType::Others).with_token("session-token")
}

fn config() -> OnboardingConfig {
    OnboardingConfig {
        notification_ttl_ms: 0,
        ..OnboardingConfig::default()
    }
}

fn environment_with(session: Session, config: OnboardingConfig) -> OnboardingEnvironment {
    let backend = Arc::new(InMemoryBackend::new(session.user_id));
    let navigator = Arc::new(RecordingNavigator::new());
    OnboardingEnvironment::new(
        session,
        config,
        Providers::from_backend(backend, navigator),
        Arc::new(test_clock()),
    )
}

fn environment() -> OnboardingEnvironment {
    environment_with(session(), config())
}

/// Running edition: opened a month before the test clock, closes in two months
fn running_edition() -> Edition {
    let now = test_clock().now();
    Edition {
        id: EditionId::new(),
        year: 2025,
        name: "Challenge 2025".to_string(),
        start_date: now - ChronoDuration::days(31),
        end_date: now + ChronoDuration::days(60),
        active: true,
    }
}

fn registration(env: &OnboardingEnvironment, edition: &Edition, athlete: bool) -> CompetitionUser {
    CompetitionUser {
        user_id: env.session.user_id,
        edition_id: edition.id,
        is_athlete: athlete,
        is_volunteer: !athlete,
        is_pompom: false,
        is_fanfare: false,
        is_cameraman: false,
        sport_category: athlete.then_some(SportCategory::Mixed),
        validated: false,
    }
}

/// State with a loaded edition and catalog, the wizard on its last step
fn ready_state(
    edition: &Edition,
    variants: Vec<ProductVariant>,
    record: RegistrationRecord,
    form: RegistrationForm,
    selected: &[&ProductVariant],
) -> OnboardingState {
    let mut state = OnboardingState::new(5);
    state.edition = Some(edition.clone());
    state.catalog = Catalog::new(variants);
    state.record = record;

    let offered = state.catalog.offered_to(SchoolType::Others, &form.roles());
    let mut basket = Basket::new();
    for chosen in selected {
        basket.toggle_variant(&offered, chosen.product_id, chosen.id);
    }
    let mut wizard = WizardState::prefilled(form, basket);
    let last = wizard.steps().len() - 1;
    wizard.jump_to(last);
    state.wizard = wizard;
    state
}

fn has_delay(effects: &[Effect<OnboardingAction>]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Delay { .. }))
}

// ============================================================================
// Loading and the gate
// ============================================================================

#[test]
fn test_load_marks_loading_and_requests_snapshot() {
    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(OnboardingState::default())
        .when_action(OnboardingAction::Load)
        .then_state(|state| assert!(state.is_loading))
        .then_effects(|effects| assertions::assert_request_count(effects, 1))
        .run();
}

#[test]
fn test_load_while_loading_is_ignored() {
    let mut state = OnboardingState::default();
    state.is_loading = true;

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::Load)
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_unregistered_user_is_redirected_once() {
    let edition = running_edition();
    let snapshot = OnboardingSnapshot {
        edition: Some(edition),
        record: RegistrationRecord::default(),
        catalog: Catalog::default(),
    };

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(OnboardingState::default())
        .when_actions([
            OnboardingAction::Loaded {
                snapshot: Box::new(snapshot),
            },
            OnboardingAction::Render,
            OnboardingAction::Render,
        ])
        .then_state(|state| {
            assert_eq!(state.view, View::RedirectToRegistration);
            assert_eq!(state.redirect_guard.fired(), 1);
        })
        .then_effects(|effects| assertions::assert_request_count(effects, 1))
        .run();
}

#[test]
fn test_no_redirect_without_token() {
    let snapshot = OnboardingSnapshot {
        edition: Some(running_edition()),
        ..OnboardingSnapshot::default()
    };

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment_with(session().signed_out(), config()))
        .given_state(OnboardingState::default())
        .when_action(OnboardingAction::Loaded {
            snapshot: Box::new(snapshot),
        })
        .then_state(|state| {
            assert_eq!(state.view, View::RedirectToRegistration);
            assert_eq!(state.redirect_guard.fired(), 0);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_closed_school_shows_inscriptions_closed() {
    let snapshot = OnboardingSnapshot {
        edition: Some(running_edition()),
        ..OnboardingSnapshot::default()
    };

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment_with(session().with_inscription_enabled(false), config()))
        .given_state(OnboardingState::default())
        .when_action(OnboardingAction::Loaded {
            snapshot: Box::new(snapshot),
        })
        .then_state(|state| assert_eq!(state.view, View::InscriptionsClosed))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_existing_registration_prefills_wizard() {
    let env = environment();
    let edition = running_edition();
    let pass = variant(ProductId::new(), "Pass", true);
    let drinks = counted(ProductId::new(), "Drinks", 200);
    let record = RegistrationRecord {
        competition_user: Some(registration(&env, &edition, false)),
        participant: None,
        purchases: vec![
            Purchase {
                product_variant_id: pass.id,
                quantity: 1,
            },
            Purchase {
                product_variant_id: drinks.id,
                quantity: 4,
            },
        ],
        has_paid: false,
    };
    let snapshot = OnboardingSnapshot {
        edition: Some(edition),
        record,
        catalog: Catalog::new([pass.clone(), drinks.clone()]),
    };

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(OnboardingState::default())
        .when_action(OnboardingAction::Loaded {
            snapshot: Box::new(snapshot),
        })
        .then_state(move |state| {
            assert_eq!(
                state.view,
                View::IncompleteRegistration(IncompleteReason::AwaitingValidationAndPayment)
            );
            assert_eq!(state.wizard.form().participation, Some(ParticipationKind::Volunteer));
            assert_eq!(state.wizard.step_done(), state.wizard.steps().len() - 1);
            assert!(state.wizard.basket.contains(pass.id));
            assert_eq!(state.wizard.basket.quantity_of(drinks.id), Some(4));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_load_failure_is_reported() {
    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(OnboardingState::default())
        .when_actions([
            OnboardingAction::Load,
            OnboardingAction::LoadFailed {
                error: ProviderError::Unavailable("offline".to_string()),
            },
        ])
        .then_state(|state| {
            assert!(!state.is_loading);
            assert_eq!(state.view, View::AwaitingEdition);
            let latest = state.notifications.latest().expect("notification");
            assert_eq!(latest.level, NotificationLevel::Error);
        })
        .run();
}

// ============================================================================
// Wizard and basket
// ============================================================================

#[test]
fn test_switching_away_from_sport_prunes_athlete_variants() {
    let edition = running_edition();
    let athlete_pack = for_public(ProductId::new(), "Athlete pack", PublicType::Athlete);
    let tshirt = variant(ProductId::new(), "T-shirt", false);
    let state = ready_state(
        &edition,
        vec![athlete_pack.clone(), tshirt.clone()],
        RegistrationRecord::default(),
        valid_sport_form(),
        &[&athlete_pack, &tshirt],
    );
    assert!(state.wizard.basket.contains(athlete_pack.id));

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::SetParticipation {
            kind: Some(ParticipationKind::Volunteer),
        })
        .then_state(move |state| {
            assert!(!state.wizard.basket.contains(athlete_pack.id));
            assert!(state.wizard.basket.contains(tshirt.id));
            assert!(!state.wizard.steps().contains(&StepId::Sport));
            assert!(state.wizard.step_done() <= crate::wizard::SPORT_STEP_INDEX);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_toggle_clears_missing_required_error() {
    let edition = running_edition();
    let pass = variant(ProductId::new(), "Pass", true);
    let mut state = ready_state(
        &edition,
        vec![pass.clone()],
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[],
    );
    state.wizard.set_form_error(FormLevelError::MissingRequiredProduct {
        product_name: "Pass".to_string(),
    });

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::ToggleVariant {
            product_id: pass.product_id,
            variant_id: pass.id,
        })
        .then_state(|state| assert_eq!(state.wizard.form_error(), None))
        .run();
}

#[test]
fn test_quantity_is_clamped() {
    let edition = running_edition();
    let drinks = counted(ProductId::new(), "Drinks", 200);
    let state = ready_state(
        &edition,
        vec![drinks.clone()],
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[&drinks],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::SetQuantity {
            variant_id: drinks.id,
            value: 250,
        })
        .then_state(move |state| {
            assert_eq!(state.wizard.basket.quantity_of(drinks.id), Some(99));
        })
        .run();
}

#[test]
fn test_edit_hides_field_error() {
    let mut state = OnboardingState::default();
    state.wizard = WizardState::new(RegistrationForm::default());
    state.wizard.scroll_next();
    assert!(!state.wizard.errors().is_empty());

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::EditForm(FormEdit::FirstName("Ada".to_string())))
        .then_state(|state| {
            assert!(!state.wizard.errors().contains(crate::participation::fields::FIRST_NAME));
        })
        .run();
}

#[test]
fn test_giving_up_volunteering_prunes_volunteer_variants() {
    let edition = running_edition();
    let shirt = for_public(ProductId::new(), "Volunteer shirt", PublicType::Volunteer);
    let tshirt = variant(ProductId::new(), "T-shirt", false);
    let mut form = valid_form(ParticipationKind::Pompom);
    form.also_volunteer = true;
    let state = ready_state(
        &edition,
        vec![shirt.clone(), tshirt.clone()],
        RegistrationRecord::default(),
        form,
        &[&shirt, &tshirt],
    );
    assert!(state.wizard.basket.contains(shirt.id));

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::EditForm(FormEdit::AlsoVolunteer(false)))
        .then_state(move |state| {
            assert!(!state.wizard.basket.contains(shirt.id));
            assert!(state.wizard.basket.contains(tshirt.id));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_edit_keeping_roles_leaves_basket_alone() {
    let edition = running_edition();
    let shirt = for_public(ProductId::new(), "Volunteer shirt", PublicType::Volunteer);
    let state = ready_state(
        &edition,
        vec![shirt.clone()],
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[&shirt],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::EditForm(FormEdit::AlsoVolunteer(false)))
        .then_state(move |state| assert!(state.wizard.basket.contains(shirt.id)))
        .run();
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_submit_outside_last_step_is_ignored() {
    let edition = running_edition();
    let mut state = ready_state(
        &edition,
        Vec::new(),
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[],
    );
    state.wizard.jump_to(0);

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| assert!(state.batch.is_none()))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_submit_without_required_product_is_blocked() {
    let edition = running_edition();
    let pass = variant(ProductId::new(), "Pass", true);
    let state = ready_state(
        &edition,
        vec![pass],
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Fanfare),
        &[],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            assert_eq!(
                state.wizard.form_error(),
                Some(&FormLevelError::MissingRequiredProduct {
                    product_name: "Pass".to_string()
                })
            );
            assert!(state.batch.is_none());
            assert!(state.pending.is_idle());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_submit_with_invalid_form_returns_to_first_invalid_step() {
    let edition = running_edition();
    let mut form = valid_form(ParticipationKind::Volunteer);
    form.email = "not-an-email".to_string();
    let state = ready_state(&edition, Vec::new(), RegistrationRecord::default(), form, &[]);

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            assert_eq!(state.wizard.current(), StepId::Information);
            assert!(matches!(
                state.wizard.form_error(),
                Some(FormLevelError::InvalidForm { .. })
            ));
            assert!(state.batch.is_none());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_submit_without_edition_is_blocked() {
    let edition = running_edition();
    let mut state = ready_state(
        &edition,
        Vec::new(),
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[],
    );
    state.edition = None;

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            assert_eq!(state.wizard.form_error(), Some(&FormLevelError::NoActiveEdition));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_first_submission_issues_every_mutation_then_refresh() {
    let edition = running_edition();
    let pass = variant(ProductId::new(), "Pass", true);
    let drinks = counted(ProductId::new(), "Drinks", 200);
    let state = ready_state(
        &edition,
        vec![pass.clone(), drinks.clone()],
        RegistrationRecord::default(),
        valid_sport_form(),
        &[&pass, &drinks],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            let batch = state.batch.expect("batch in flight");
            // registration, sport entry, two purchases
            assert_eq!(batch.issued, 4);
            assert_eq!(state.pending.count(MutationKind::Create), 4);
            assert_eq!(state.wizard.form_error(), None);
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assert!(matches!(effects[0], Effect::Sequential(ref stages) if stages.len() == 4));
            assertions::assert_request_count(effects, 5);
        })
        .run();
}

#[test]
fn test_sport_switch_withdraws_before_entering() {
    let env = environment();
    let edition = running_edition();
    let current_sport = SportId::new();
    let record = RegistrationRecord {
        competition_user: Some(registration(&env, &edition, true)),
        participant: Some(Participant {
            user_id: env.session.user_id,
            sport_id: current_sport,
            school_id: env.session.school_id,
            team_id: None,
            license: None,
            substitute: false,
            is_license_valid: false,
        }),
        purchases: Vec::new(),
        has_paid: false,
    };
    let form = valid_sport_form();
    assert_ne!(form.sport_id, Some(current_sport));
    let state = ready_state(&edition, Vec::new(), record, form, &[]);

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            assert_eq!(state.pending.count(MutationKind::Delete), 1);
            assert_eq!(state.pending.count(MutationKind::Create), 1);
            assert_eq!(state.batch.map(|b| b.issued), Some(2));
        })
        .then_effects(|effects| {
            let Effect::Sequential(stages) = &effects[0] else {
                unreachable!("submission is sequential");
            };
            // sport entry stage, then refresh
            assert_eq!(stages.len(), 2);
            assert!(matches!(&stages[0], Effect::Sequential(ops) if ops.len() == 2));
            assertions::assert_request_count(effects, 3);
        })
        .run();
}

#[test]
fn test_becoming_athlete_updates_registration_before_entering() {
    let env = environment();
    let edition = running_edition();
    let pompom = CompetitionUser {
        is_pompom: true,
        is_volunteer: false,
        ..registration(&env, &edition, false)
    };
    let record = RegistrationRecord {
        competition_user: Some(pompom),
        ..RegistrationRecord::default()
    };
    let state = ready_state(&edition, Vec::new(), record, valid_sport_form(), &[]);

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            assert_eq!(state.pending.count(MutationKind::Update), 1);
            assert_eq!(state.pending.count(MutationKind::Create), 1);
            assert_eq!(state.batch.map(|b| b.issued), Some(2));
        })
        .then_effects(|effects| {
            let Effect::Sequential(stages) = &effects[0] else {
                unreachable!("submission is sequential");
            };
            // registration update, sport entry, refresh
            assert_eq!(stages.len(), 3);
            assertions::assert_request_count(effects, 3);
        })
        .run();
}

#[test]
fn test_leaving_sport_withdraws_then_updates_registration() {
    let env = environment();
    let edition = running_edition();
    let record = RegistrationRecord {
        competition_user: Some(registration(&env, &edition, true)),
        participant: Some(Participant {
            user_id: env.session.user_id,
            sport_id: SportId::new(),
            school_id: env.session.school_id,
            team_id: None,
            license: None,
            substitute: false,
            is_license_valid: false,
        }),
        ..RegistrationRecord::default()
    };
    let state = ready_state(
        &edition,
        Vec::new(),
        record,
        valid_form(ParticipationKind::Cameraman),
        &[],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| {
            assert_eq!(state.pending.count(MutationKind::Delete), 1);
            assert_eq!(state.pending.count(MutationKind::Update), 1);
            assert_eq!(state.pending.count(MutationKind::Create), 0);
        })
        .then_effects(|effects| {
            let Effect::Sequential(stages) = &effects[0] else {
                unreachable!("submission is sequential");
            };
            assert_eq!(stages.len(), 3);
            assertions::assert_request_count(effects, 3);
        })
        .run();
}

#[test]
fn test_registration_update_settles_pending() {
    let env = environment();
    let edition = running_edition();
    let updated = registration(&env, &edition, true);
    let mut state = OnboardingState::default();
    state.pending.begin(MutationKind::Update);

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::CompetitionUserUpdated {
            user: updated.clone(),
        })
        .then_state(move |state| {
            assert!(state.pending.is_idle());
            assert_eq!(state.record.competition_user, Some(updated));
        })
        .run();
}

#[test]
fn test_unchanged_registration_only_refreshes() {
    let env = environment();
    let edition = running_edition();
    let pass = variant(ProductId::new(), "Pass", true);
    let record = RegistrationRecord {
        competition_user: Some(registration(&env, &edition, false)),
        participant: None,
        purchases: vec![Purchase {
            product_variant_id: pass.id,
            quantity: 1,
        }],
        has_paid: false,
    };
    let state = ready_state(
        &edition,
        vec![pass.clone()],
        record,
        valid_form(ParticipationKind::Volunteer),
        &[&pass],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::Submit)
        .then_state(|state| assert_eq!(state.batch.map(|b| b.issued), Some(0)))
        .then_effects(|effects| assertions::assert_request_count(effects, 1))
        .run();
}

#[test]
fn test_second_submit_while_in_flight_is_ignored() {
    let edition = running_edition();
    let state = ready_state(
        &edition,
        Vec::new(),
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[],
    );

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_actions([OnboardingAction::Submit, OnboardingAction::Submit])
        .then_state(|state| assert_eq!(state.pending.count(MutationKind::Create), 1))
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 2);
            assert!(effects[1].is_none());
        })
        .run();
}

#[test]
fn test_partial_failure_reports_count_and_stays() {
    let env = environment();
    let edition = running_edition();
    let user = registration(&env, &edition, false);
    let mut state = ready_state(
        &edition,
        Vec::new(),
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[],
    );
    state.batch = Some(SubmissionBatch {
        issued: 3,
        failures: 0,
    });
    state.pending.begin(MutationKind::Delete);
    let refreshed = RegistrationRecord {
        competition_user: Some(user),
        ..RegistrationRecord::default()
    };

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_actions([
            OnboardingAction::MutationFailed {
                error: MutationError::new(
                    MutationKind::Delete,
                    MutationTarget::Purchase(crate::types::VariantId::new()),
                    ProviderError::Unavailable("timeout".to_string()),
                ),
            },
            OnboardingAction::RegistrationRefreshed {
                record: Box::new(refreshed),
            },
        ])
        .then_state(|state| {
            assert!(state.batch.is_none());
            assert!(state.pending.is_idle());
            let latest = state.notifications.latest().expect("summary notification");
            assert_eq!(latest.level, NotificationLevel::Error);
            assert!(latest.message.starts_with("1 of 3"));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_successful_batch_navigates_home() {
    let env = environment();
    let edition = running_edition();
    let user = registration(&env, &edition, false);
    let mut state = ready_state(
        &edition,
        Vec::new(),
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[],
    );
    state.batch = Some(SubmissionBatch {
        issued: 1,
        failures: 0,
    });

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::RegistrationRefreshed {
            record: Box::new(RegistrationRecord {
                competition_user: Some(user),
                ..RegistrationRecord::default()
            }),
        })
        .then_state(|state| {
            let latest = state.notifications.latest().expect("success notification");
            assert_eq!(latest.level, NotificationLevel::Success);
            assert_eq!(
                state.view,
                View::IncompleteRegistration(IncompleteReason::AwaitingValidationAndPayment)
            );
        })
        .then_effects(|effects| {
            assertions::assert_request_count(effects, 1);
            assert!(!has_delay(effects));
        })
        .run();
}

#[test]
fn test_failed_refetch_still_reports_batch() {
    let env = environment();
    let edition = running_edition();
    let drinks = counted(ProductId::new(), "Drinks", 200);
    let tshirt = variant(ProductId::new(), "T-shirt", false);
    let mut state = ready_state(
        &edition,
        vec![drinks.clone(), tshirt.clone()],
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[&drinks, &tshirt],
    );
    state.batch = Some(SubmissionBatch {
        issued: 2,
        failures: 1,
    });
    state.is_loading = true;
    state.record.purchases = vec![Purchase {
        product_variant_id: drinks.id,
        quantity: 1,
    }];

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::RefreshFailed {
            error: ProviderError::Unavailable("gateway restarting".to_string()),
        })
        .then_state(move |state| {
            assert!(!state.is_loading);
            assert!(state.batch.is_none());
            let latest = state.notifications.latest().expect("summary notification");
            assert_eq!(latest.level, NotificationLevel::Error);
            assert!(latest.message.starts_with("1 of 2"), "{}", latest.message);
            assert!(state.wizard.basket.contains(drinks.id));
            assert!(!state.wizard.basket.contains(tshirt.id));
        })
        .run();
}

#[test]
fn test_success_notification_expires_when_ttl_configured() {
    let env = environment_with(
        session(),
        OnboardingConfig {
            notification_ttl_ms: 5000,
            ..OnboardingConfig::default()
        },
    );
    let mut state = OnboardingState::default();
    state.edition = Some(running_edition());
    state.batch = Some(SubmissionBatch::default());

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::RegistrationRefreshed {
            record: Box::new(RegistrationRecord::default()),
        })
        .then_effects(|effects| assert!(has_delay(effects)))
        .run();
}

#[test]
fn test_refresh_rehydrates_basket_from_server() {
    let env = environment();
    let edition = running_edition();
    let drinks = counted(ProductId::new(), "Drinks", 200);
    let state = ready_state(
        &edition,
        vec![drinks.clone()],
        RegistrationRecord::default(),
        valid_form(ParticipationKind::Volunteer),
        &[&drinks],
    );
    let record = RegistrationRecord {
        competition_user: Some(registration(&env, &edition, false)),
        purchases: vec![Purchase {
            product_variant_id: drinks.id,
            quantity: 7,
        }],
        ..RegistrationRecord::default()
    };

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_action(OnboardingAction::RegistrationRefreshed {
            record: Box::new(record),
        })
        .then_state(move |state| {
            assert_eq!(state.wizard.basket.quantity_of(drinks.id), Some(7));
        })
        .run();
}

#[test]
fn test_manual_refresh_marks_loading_until_refetched() {
    let mut state = OnboardingState::default();
    state.edition = Some(running_edition());

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_actions([
            OnboardingAction::RefreshRegistration,
            OnboardingAction::RefreshRegistration,
        ])
        .then_state(|state| assert!(state.is_loading))
        .then_effects(|effects| assertions::assert_request_count(effects, 1))
        .run();
}

#[test]
fn test_refresh_without_edition_is_ignored() {
    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(OnboardingState::default())
        .when_action(OnboardingAction::RefreshRegistration)
        .then_state(|state| assert!(!state.is_loading))
        .then_effects(assertions::assert_no_effects)
        .run();
}

// ============================================================================
// Payment and notifications
// ============================================================================

#[test]
fn test_payment_requires_registration() {
    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(OnboardingState::default())
        .when_action(OnboardingAction::RequestPayment)
        .then_state(|state| assert!(!state.payment_pending))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_payment_request_then_redirect() {
    let env = environment();
    let edition = running_edition();
    let mut state = OnboardingState::default();
    state.record.competition_user = Some(registration(&env, &edition, false));

    ReducerTest::new(OnboardingReducer::new())
        .with_env(env)
        .given_state(state)
        .when_actions([
            OnboardingAction::RequestPayment,
            OnboardingAction::RequestPayment,
            OnboardingAction::PaymentUrlReceived {
                url: "https://pay.example.org/checkout".to_string(),
            },
        ])
        .then_state(|state| assert!(!state.payment_pending))
        .then_effects(|effects| assertions::assert_request_count(effects, 2))
        .run();
}

#[test]
fn test_dismiss_notification() {
    let mut state = OnboardingState::default();
    let id = state.notifications.push(NotificationLevel::Info, "hello");

    ReducerTest::new(OnboardingReducer::new())
        .with_env(environment())
        .given_state(state)
        .when_action(OnboardingAction::DismissNotification { id })
        .then_state(|state| assert!(state.notifications.is_empty()))
        .then_effects(assertions::assert_no_effects)
        .run();
}
