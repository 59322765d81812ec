//! Onboarding demo
//!
//! Walks one student through the whole onboarding flow against the in-memory
//! backend: gate redirect, wizard, submission, BDS validation, payment and
//! finally the dashboard.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=onboarding_registration=debug cargo run --bin onboarding-demo
//! ```

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use onboarding_core::environment::SystemClock;
use onboarding_registration::backend::{InMemoryBackend, TracingNavigator};
use onboarding_registration::onboarding::{
    OnboardingAction, OnboardingEnvironment, OnboardingReducer, OnboardingState,
};
use onboarding_registration::participation::{FormEdit, ParticipationKind};
use onboarding_registration::types::{
    Edition, EditionId, Money, ProductId, ProductSummary, ProductVariant, PublicType, SchoolId,
    SchoolType, SportCategory, SportId, UserId, VariantId,
};
use onboarding_registration::{OnboardingConfig, Providers, Session, UserProfile};
use onboarding_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type OnboardingStore =
    Store<OnboardingState, OnboardingAction, OnboardingEnvironment, OnboardingReducer>;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = OnboardingConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!(?config, "Configuration loaded");

    let session = Session::new(UserId::new(), SchoolId::new(), SchoolType::Others)
        .with_token("demo-session")
        .with_profile(UserProfile {
            first_name: "Camille".to_string(),
            last_name: "Martin".to_string(),
            email: "camille.martin@example.org".to_string(),
            phone: Some("06 12 34 56 78".to_string()),
        });

    let backend = Arc::new(InMemoryBackend::new(session.user_id));
    let now = Utc::now();
    backend.set_edition(Some(Edition {
        id: EditionId::new(),
        year: 2025,
        name: "Challenge 2025".to_string(),
        start_date: now - ChronoDuration::days(1),
        end_date: now + ChronoDuration::days(30),
        active: true,
    }));
    let catalog = demo_catalog();
    backend.add_variants(catalog.iter().cloned());

    let env = OnboardingEnvironment::new(
        session.clone(),
        config.clone(),
        Providers::from_backend(Arc::clone(&backend), Arc::new(TracingNavigator)),
        Arc::new(SystemClock),
    );
    let store = Store::new(
        OnboardingState::new(config.max_notifications),
        OnboardingReducer::new(),
        env,
    );

    // Gate
    store.send(OnboardingAction::Load).await?;
    settle(&store).await?;
    let view = store.state(|s| s.view).await;
    tracing::info!(?view, "Gate decided");

    // Wizard
    let [weekend_pass, _, tshirt, drinks, kit] = &catalog;
    let sport_id = SportId::new();
    let wizard = [
        OnboardingAction::ScrollNext,
        OnboardingAction::SetParticipation {
            kind: Some(ParticipationKind::Sport),
        },
        OnboardingAction::EditForm(FormEdit::AlsoVolunteer(true)),
        OnboardingAction::ScrollNext,
        OnboardingAction::EditForm(FormEdit::Sport(Some(sport_id))),
        OnboardingAction::EditForm(FormEdit::SportCategory(Some(SportCategory::Feminine))),
        OnboardingAction::EditForm(FormEdit::License(Some("FFSU-2025-0042".to_string()))),
        OnboardingAction::ScrollNext,
        toggle(weekend_pass),
        toggle(tshirt),
        toggle(drinks),
        toggle(kit),
        OnboardingAction::SetQuantity {
            variant_id: drinks.id,
            value: 4,
        },
        OnboardingAction::ScrollNext,
    ];
    for action in wizard {
        store.send(action).await?;
    }
    let total = store.state(|s| s.wizard.basket.total()).await;
    tracing::info!(%total, "Basket ready");

    // Submission
    store.send(OnboardingAction::Submit).await?;
    settle(&store).await?;
    let user_id = session.user_id;
    let record = serde_json::json!({
        "competition_user": backend.competition_user(user_id),
        "participant": backend.participant(user_id),
        "purchases": backend.purchases(user_id),
    });
    println!("{}", serde_json::to_string_pretty(&record)?);

    // BDS validation, then payment
    backend.validate_registration(user_id, true);
    store.send(OnboardingAction::RefreshRegistration).await?;
    settle(&store).await?;
    store.send(OnboardingAction::RequestPayment).await?;
    settle(&store).await?;
    backend.record_payment(user_id, total, Utc::now());
    store.send(OnboardingAction::RefreshRegistration).await?;
    settle(&store).await?;

    let view = store.state(|s| s.view).await;
    tracing::info!(?view, "Onboarding finished");
    store.state(|s| {
        for notification in s.notifications.iter() {
            println!("[{:?}] {}", notification.level, notification.message);
        }
    })
    .await;

    if let Err(error) = store.shutdown(Duration::from_secs(1)).await {
        // auto-dismiss timers may still be pending
        tracing::debug!(%error, "Shutdown left timers behind");
    }
    Ok(())
}

/// Wait until no load, mutation, refetch or payment request is in flight
async fn settle(store: &OnboardingStore) -> anyhow::Result<()> {
    tokio::time::timeout(SETTLE_TIMEOUT, async {
        loop {
            let idle = store
                .state(|s| {
                    !s.is_loading && s.pending.is_idle() && s.batch.is_none() && !s.payment_pending
                })
                .await;
            if idle {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("onboarding did not settle")
}

fn toggle(variant: &ProductVariant) -> OnboardingAction {
    OnboardingAction::ToggleVariant {
        product_id: variant.product_id,
        variant_id: variant.id,
    }
}

fn demo_catalog() -> [ProductVariant; 5] {
    let pass = ProductId::new();
    let variant = |product_id, product: &str, name: &str, cents, unique, required| ProductVariant {
        id: VariantId::new(),
        product_id,
        name: name.to_string(),
        price: Money::from_cents(cents),
        unique,
        enabled: true,
        school_type: SchoolType::Others,
        public_type: None,
        product: ProductSummary {
            name: product.to_string(),
            required,
        },
    };
    [
        variant(pass, "Pass", "Full weekend", 4500, true, true),
        variant(pass, "Pass", "Saturday only", 2500, true, true),
        variant(ProductId::new(), "T-shirt", "T-shirt M", 1200, true, false),
        variant(ProductId::new(), "Drink tokens", "Token", 200, false, false),
        ProductVariant {
            public_type: Some(PublicType::Athlete),
            ..variant(ProductId::new(), "Athlete kit", "Kit", 1500, true, false)
        },
    ]
}
