//! # Onboarding Runtime
//!
//! The Store that coordinates reducer execution and effect handling for the
//! onboarding client.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, reduces actions one at a time, executes effects
//! - **Effect Executor**: Runs effect descriptions and feeds their actions back
//! - **`EffectHandle`**: Lets callers wait until everything an action started
//!   has settled
//!
//! ## Example
//!
//! ```ignore
//! use onboarding_runtime::Store;
//!
//! let store = Store::new(OnboardingState::default(), OnboardingReducer::new(), env);
//!
//! let mut handle = store.send(OnboardingAction::Load).await?;
//! handle.wait().await;
//!
//! let view = store.state(|s| s.view.clone()).await;
//! ```

use onboarding_core::{effect::Effect, reducer::Reducer, SmallVec};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{watch, RwLock};

pub use error::StoreError;
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects or for a terminal action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

/// Handle for waiting on the effects started by one `send`
///
/// The handle settles once every effect returned for the action has settled,
/// including the effects of any actions those effects fed back.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(OnboardingAction::Submit).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // every purchase request and the refetch have completed
/// ```
#[derive(Clone, Debug)]
pub struct EffectHandle {
    completion: watch::Receiver<bool>,
}

impl EffectHandle {
    fn pending() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { completion: rx })
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(true);
        Self { completion: rx }
    }

    /// Returns true once all tracked effects have settled
    #[must_use]
    pub fn is_complete(&self) -> bool {
        *self.completion.borrow()
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while !*self.completion.borrow_and_update() {
            // Sender dropped means the executing task is gone
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl AtomicCounterGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, Duration, Effect, EffectHandle,
        Ordering, Reducer, RwLock, SmallVec, StoreError,
    };
    use futures::future::{join_all, BoxFuture, FutureExt};
    use tokio::sync::broadcast;

    struct Inner<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        action_broadcast: broadcast::Sender<A>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; only the reducer writes it)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected collaborators)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Actions are reduced one at a time under the write lock, so every reducer
    /// call sees the result of the previous one. Effects run outside the lock.
    ///
    /// Cloning a store is cheap and yields another handle to the same state.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<Inner<S, A, E, R>>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast keeps the last 16 fed-back actions for slow
        /// observers; use [`Store::with_broadcast_capacity`] to change that.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                inner: Arc::new(Inner {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    action_broadcast,
                }),
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Starts executing the returned effects in a background task
        ///
        /// `send` returns as soon as the state has been updated. Use the
        /// returned [`EffectHandle`] to wait for the effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!(?action, "Rejected action, store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            let effects = self.reduce(action).await;

            if effects.iter().all(Effect::is_none) {
                return Ok(EffectHandle::completed());
            }

            let (done, handle) = EffectHandle::pending();
            let guard = AtomicCounterGuard::enter(&self.inner.pending_effects);
            let execution = self.run_effects(effects);

            tokio::spawn(async move {
                let _guard = guard;
                execution.await;
                let _ = done.send(true);
            });

            Ok(handle)
        }

        /// Send an action and wait for a matching fed-back action
        ///
        /// Subscribes to the action broadcast before sending so no result is
        /// missed, then returns the first action satisfying `predicate`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before `timeout`
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.subscribe_actions();
            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        ///
        /// Only fed-back actions are broadcast, not the ones passed to `send`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.action_broadcast.subscribe()
        }

        /// Read state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.inner.state.read().await;
            f(&*state)
        }

        /// Number of `send` calls whose effects are still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.inner.pending_effects.load(Ordering::Acquire)
        }

        /// Stop accepting actions and wait for in-flight effects
        ///
        /// Results that arrive after shutdown started are discarded instead of
        /// being reduced.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.inner.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects();

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        async fn reduce(&self, action: A) -> SmallVec<[Effect<A>; 4]> {
            let mut state = self.inner.state.write().await;
            metrics::counter!("store.actions.processed").increment(1);
            self.inner
                .reducer
                .reduce(&mut state, action, &self.inner.environment)
        }

        fn run_effects(&self, effects: SmallVec<[Effect<A>; 4]>) -> BoxFuture<'static, ()> {
            let executions: Vec<_> = effects.into_iter().map(|e| self.execute(e)).collect();
            join_all(executions).map(|_| ()).boxed()
        }

        /// Reduce an action produced by an effect and run its effects
        fn feed_back(&self, action: A) -> BoxFuture<'static, ()> {
            let store = self.clone();

            async move {
                if store.inner.shutdown.load(Ordering::Acquire) {
                    tracing::debug!(?action, "Discarding effect result after shutdown");
                    metrics::counter!("store.actions.discarded").increment(1);
                    return;
                }

                let _ = store.inner.action_broadcast.send(action.clone());
                let effects = store.reduce(action).await;
                store.run_effects(effects).await;
            }
            .boxed()
        }

        /// Execute one effect
        ///
        /// The returned future settles once the effect and every effect it
        /// caused through the feedback loop have settled.
        fn execute(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();

            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                    futures::future::ready(()).boxed()
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        }
                    }
                    .boxed()
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!(?duration, "Executing Effect::Delay");
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    }
                    .boxed()
                },
                Effect::Parallel(effects) => {
                    tracing::trace!(count = effects.len(), "Executing Effect::Parallel");
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    let executions: Vec<_> =
                        effects.into_iter().map(|e| store.execute(e)).collect();
                    join_all(executions).map(|_| ()).boxed()
                },
                Effect::Sequential(effects) => {
                    tracing::trace!(count = effects.len(), "Executing Effect::Sequential");
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    async move {
                        for effect in effects {
                            store.execute(effect).await;
                        }
                    }
                    .boxed()
                },
            }
        }
    }
}
