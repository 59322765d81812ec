//! Shared fixtures for the onboarding integration tests.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use chrono::Duration as ChronoDuration;
use onboarding_core::environment::Clock;
use onboarding_registration::backend::{InMemoryBackend, RecordingNavigator};
use onboarding_registration::onboarding::{
    OnboardingAction, OnboardingEnvironment, OnboardingReducer, OnboardingState,
};
use onboarding_registration::participation::{ParticipationKind, RegistrationForm};
use onboarding_registration::types::{
    Edition, EditionId, Money, ProductId, ProductSummary, ProductVariant, SchoolId, SchoolType,
    SportCategory, SportId, UserId, VariantId,
};
use onboarding_registration::{OnboardingConfig, Providers, Session, UserProfile};
use onboarding_runtime::Store;
use onboarding_testing::test_clock;
use std::sync::Arc;
use std::time::Duration;

pub type OnboardingStore =
    Store<OnboardingState, OnboardingAction, OnboardingEnvironment, OnboardingReducer>;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("onboarding_registration=debug,onboarding_runtime=debug")
        .try_init();
}

pub fn profile() -> UserProfile {
    UserProfile {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.org".to_string(),
        phone: Some("06 12 34 56 78".to_string()),
    }
}

pub fn session() -> Session {
    Session::new(UserId::new(), SchoolId::new(), SchoolType::Others)
        .with_token("session-token")
        .with_profile(profile())
}

pub fn config() -> OnboardingConfig {
    OnboardingConfig {
        notification_ttl_ms: 0,
        request_timeout_ms: 1000,
        ..OnboardingConfig::default()
    }
}

/// Edition running at the test clock
pub fn running_edition() -> Edition {
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

pub fn product_variant(
    product_id: ProductId,
    product_name: &str,
    required: bool,
    unique: bool,
    cents: u64,
) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(),
        product_id,
        name: format!("{product_name} variant"),
        price: Money::from_cents(cents),
        unique,
        enabled: true,
        school_type: SchoolType::Others,
        public_type: None,
        product: ProductSummary {
            name: product_name.to_string(),
            required,
        },
    }
}

/// Unique required variant, the competition pass
pub fn pass() -> ProductVariant {
    product_variant(ProductId::new(), "Pass", true, true, 4500)
}

/// Non-unique optional variant
pub fn drinks() -> ProductVariant {
    product_variant(ProductId::new(), "Drinks", false, false, 200)
}

pub fn valid_form(kind: ParticipationKind) -> RegistrationForm {
    let profile = profile();
    RegistrationForm {
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        phone: profile.phone,
        participation: Some(kind),
        ..RegistrationForm::default()
    }
}

pub fn valid_sport_form() -> RegistrationForm {
    RegistrationForm {
        sport_id: Some(SportId::new()),
        sport_category: Some(SportCategory::Feminine),
        ..valid_form(ParticipationKind::Sport)
    }
}

pub struct Harness {
    pub store: OnboardingStore,
    pub backend: Arc<InMemoryBackend>,
    pub navigator: Arc<RecordingNavigator>,
    pub session: Session,
    pub edition: Edition,
}

impl Harness {
    pub fn new(config: OnboardingConfig) -> Self {
        Self::with_backend(config, InMemoryBackend::new)
    }

    pub fn with_backend(
        config: OnboardingConfig,
        build: impl FnOnce(UserId) -> InMemoryBackend,
    ) -> Self {
        init_tracing();
        let session = session();
        let edition = running_edition();
        let backend = Arc::new(build(session.user_id));
        backend.set_edition(Some(edition.clone()));
        let navigator = Arc::new(RecordingNavigator::new());
        let env = OnboardingEnvironment::new(
            session.clone(),
            config.clone(),
            Providers::from_backend(Arc::clone(&backend), navigator.clone()),
            Arc::new(test_clock()),
        );
        let store = Store::new(
            OnboardingState::new(config.max_notifications),
            OnboardingReducer::new(),
            env,
        );
        Self {
            store,
            backend,
            navigator,
            session,
            edition,
        }
    }

    /// Send an action and wait for every effect it caused
    pub async fn dispatch(&self, action: OnboardingAction) {
        let mut handle = self.store.send(action).await.expect("store accepts actions");
        handle
            .wait_with_timeout(WAIT)
            .await
            .expect("effects settle in time");
    }

    pub async fn dispatch_all(&self, actions: impl IntoIterator<Item = OnboardingAction>) {
        for action in actions {
            self.dispatch(action).await;
        }
    }

    pub async fn state<T>(&self, f: impl FnOnce(&OnboardingState) -> T) -> T {
        self.store.state(f).await
    }
}
