//! # Onboarding Core
//!
//! Core traits and types shared by every onboarding feature.
//!
//! The onboarding client is written as a set of reducers: pure functions that
//! take the current state and an action, mutate the state, and return a list of
//! effect descriptions. The runtime executes those effects (backend calls,
//! navigation, timers) and feeds their results back as new actions.
//!
//! ## Core Concepts
//!
//! - **State**: Owned, cloneable snapshot of a feature (wizard, gate, basket)
//! - **Action**: Every input to a reducer (user intents and backend results)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of a side effect, executed later by the runtime
//! - **Environment**: Injected collaborators (providers, clock, navigator)
//!
//! ## Example
//!
//! ```
//! use onboarding_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct StepperState {
//!     current: usize,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum StepperAction {
//!     Next,
//!     Previous,
//! }
//!
//! struct StepperReducer;
//!
//! impl Reducer for StepperReducer {
//!     type State = StepperState;
//!     type Action = StepperAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut StepperState,
//!         action: StepperAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<StepperAction>; 4]> {
//!         match action {
//!             StepperAction::Next => state.current += 1,
//!             StepperAction::Previous => state.current = state.current.saturating_sub(1),
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut state = StepperState::default();
//! let effects = StepperReducer.reduce(&mut state, StepperAction::Next, &());
//! assert_eq!(state.current, 1);
//! assert!(effects.is_empty());
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Declarative helpers for building effects
pub mod effect_macros;

/// Reducer module - the trait every feature implements
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for client-side business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer owns
    /// - `Action`: The inputs it processes
    /// - `Environment`: The collaborators it may capture inside effects
    ///
    /// Reducers never perform I/O themselves. Anything that talks to the
    /// backend or the router is returned as an [`Effect`].
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// The state is updated in place; the returned effects are executed by
        /// the runtime after the state write completes, so every effect sees a
        /// consistent snapshot.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values. The reducer returns them and the runtime decides when
/// and how to execute them.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Boxed future produced by an effect
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Ordering
    ///
    /// - `Parallel` children carry no ordering guarantee relative to each other.
    /// - `Sequential` children run one after another; a child is considered
    ///   settled only once the action it produced (if any) has been reduced and
    ///   that action's own effects have settled too.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently and settle when all of them have settled
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(EffectFuture<Action>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns true if executing this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_none)
                },
                Effect::Delay { .. } | Effect::Future(_) => false,
            }
        }

        /// Number of futures reachable from this effect
        ///
        /// Each backend request is one future, so this is the number of
        /// requests the effect will issue.
        #[must_use]
        pub fn future_count(&self) -> usize {
            match self {
                Effect::Future(_) => 1,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().map(Effect::future_count).sum()
                },
                Effect::None | Effect::Delay { .. } => 0,
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// Collaborators are abstracted behind traits so reducers can be tested
/// against fixed time and in-memory backends.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// The edition gate compares `now` with the edition window, so tests pin
    /// the clock instead of depending on the calendar.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
