//! # Pantry Runtime
//!
//! Runtime implementation for the Pantry list engine.
//!
//! This crate provides the [`Store`] that owns a screen's state, runs its
//! reducer, and executes the effects the reducer returns.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation Registry**: Tracks cancellable effects so a new query
//!   subscription or undo timer replaces the previous one
//! - **State Watch**: Publishes a clone of the state after every reduction so
//!   renderers always observe one coherent value
//!
//! ## Example
//!
//! ```ignore
//! use pantry_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use pantry_core::{effect::Effect, effect::EffectId, reducer::Reducer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Metric descriptions for the store and animation driver
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Effects did not finish before the wait timed out
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use pantry_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(2));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects spawned by
/// that action. Actions fed back by those effects are processed by their own
/// `send` and are not tracked by this handle.
///
/// A handle for an action that started a live query never completes on its
/// own; use [`EffectHandle::wait_with_timeout`] there.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of tracked effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// tracked effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs on completion, panic, and abort alike.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: abort handles of running cancellable effects, keyed by id
#[derive(Default)]
struct CancellationRegistry {
    next_task: AtomicU64,
    running: Mutex<HashMap<EffectId, Vec<(u64, tokio::task::AbortHandle)>>>,
}

impl CancellationRegistry {
    fn next_task(&self) -> u64 {
        self.next_task.fetch_add(1, Ordering::Relaxed)
    }

    fn register(&self, id: EffectId, task: u64, handle: tokio::task::AbortHandle) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        let tasks = running.entry(id).or_default();
        tasks.retain(|(_, handle)| !handle.is_finished());
        if !handle.is_finished() {
            tasks.push((task, handle));
        }
    }

    fn unregister(&self, id: EffectId, task: u64) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tasks) = running.get_mut(&id) {
            tasks.retain(|(candidate, _)| *candidate != task);
            if tasks.is_empty() {
                running.remove(&id);
            }
        }
    }

    fn cancel(&self, id: EffectId) -> usize {
        let tasks = {
            let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            running.remove(&id).unwrap_or_default()
        };
        let mut cancelled = 0;
        for (_, handle) in tasks {
            if !handle.is_finished() {
                handle.abort();
                cancelled += 1;
            }
        }
        cancelled
    }

    fn cancel_all(&self) -> usize {
        let ids: Vec<EffectId> = {
            let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
            running.keys().copied().collect()
        };
        ids.into_iter().map(|id| self.cancel(id)).sum()
    }

    fn in_flight(&self, id: EffectId) -> usize {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        running
            .get(&id)
            .map_or(0, |tasks| tasks.iter().filter(|(_, handle)| !handle.is_finished()).count())
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancellationRegistry, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectTracking, Ordering, Reducer, RwLock,
        StoreConfig, StoreError, watch,
    };
    use futures::StreamExt;
    use futures::future::BoxFuture;
    use tokio::sync::broadcast;

    struct StoreInner<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        state_watch: watch::Sender<S>,
        cancellations: CancellationRegistry,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is
        /// reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; every reduction holds the write lock)
    /// 2. Reducer (screen logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Cloning a store is cheap and yields a handle to the same runtime.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R> {
        inner: Arc<StoreInner<S, A, E, R>>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("config", &self.inner.config)
                .field(
                    "pending_effects",
                    &self.inner.pending_effects.load(Ordering::SeqCst),
                )
                .finish_non_exhaustive()
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Clone + Send + Sync + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (state_watch, _) = watch::channel(initial_state.clone());

            Self {
                inner: Arc::new(StoreInner {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    config,
                    state_watch,
                    cancellations: CancellationRegistry::default(),
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
        /// 3. Publishes the new state to watchers
        /// 4. Starts the returned effects
        ///
        /// Returns after starting effect execution, not completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.inner.state.write().await;

                let start = std::time::Instant::now();
                let effects = self
                    .inner
                    .reducer
                    .reduce(&mut *state, action, &self.inner.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                // Published under the write lock so watchers see reductions in order
                self.inner.state_watch.send_replace((*state).clone());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute(effect, &tracking);
            }

            Ok(handle)
        }

        /// Read current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.inner.state.read().await;
            f(&*state)
        }

        /// Subscribe to state changes
        ///
        /// The receiver holds the state as of the latest reduction; every
        /// reduction replaces it wholesale.
        #[must_use]
        pub fn subscribe_state(&self) -> watch::Receiver<S> {
            self.inner.state_watch.subscribe()
        }

        /// Subscribe to all actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.action_broadcast.subscribe()
        }

        /// Number of running effects registered under `id`
        #[must_use]
        pub fn in_flight(&self, id: EffectId) -> usize {
            self.inner.cancellations.in_flight(id)
        }

        /// Initiate graceful shutdown
        ///
        /// Rejects new actions, aborts every cancellable effect (live queries,
        /// timers), then waits for the remaining effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.inner.shutdown.store(true, Ordering::Release);

            let cancelled = self.inner.cancellations.cancel_all();
            tracing::debug!(cancelled, "Cancelled in-flight effects");

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.inner.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.inner.config.default_shutdown_timeout)
                .await
        }

        /// Start a top-level effect returned by the reducer
        fn execute(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Cancel(id) => self.cancel(id),
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => {
                    if cancel_in_flight {
                        self.cancel(id);
                    }
                    drop(self.spawn(Some(id), *effect, Some(tracking.clone())));
                },
                other => drop(self.spawn(None, other, Some(tracking.clone()))),
            }
        }

        fn cancel(&self, id: EffectId) {
            let cancelled = self.inner.cancellations.cancel(id);
            if cancelled > 0 {
                tracing::debug!(%id, cancelled, "Cancelled effects");
                metrics::counter!("store.effects.cancelled").increment(cancelled as u64);
            }
        }

        fn spawn(
            &self,
            id: Option<EffectId>,
            effect: Effect<A>,
            tracking: Option<EffectTracking>,
        ) -> tokio::task::JoinHandle<()> {
            let tracking_guard = tracking.map(|tracking| {
                tracking.increment();
                DecrementGuard(tracking)
            });
            self.inner.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.inner.pending_effects));

            let task = self.inner.cancellations.next_task();
            let store = self.clone();

            let join = tokio::spawn(async move {
                let _tracking_guard = tracking_guard;
                let _pending_guard = pending_guard;

                store.run(effect).await;

                if let Some(id) = id {
                    store.inner.cancellations.unregister(id, task);
                }
            });

            if let Some(id) = id {
                self.inner
                    .cancellations
                    .register(id, task, join.abort_handle());
            }

            join
        }

        /// Drive an effect to completion inside the current task
        fn run(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();

            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    },
                    Effect::Stream(mut stream) => {
                        metrics::counter!("store.effects.executed", "type" => "stream").increment(1);
                        while let Some(action) = stream.next().await {
                            store.feed_back(action).await;
                        }
                        tracing::trace!("Effect::Stream completed");
                    },
                    Effect::Cancellable {
                        id,
                        cancel_in_flight,
                        effect,
                    } => {
                        if cancel_in_flight {
                            store.cancel(id);
                        }
                        // An aborted child resolves the join with a cancellation error
                        let _ = store.spawn(Some(id), *effect, None).await;
                    },
                    Effect::Cancel(id) => store.cancel(id),
                }
            })
        }

        async fn feed_back(&self, action: A) {
            let _ = self.inner.action_broadcast.send(action.clone());

            if let Err(error) = self.send(action).await {
                tracing::debug!(%error, "Dropped action produced by effect");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pantry_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct Counter {
        value: i64,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CounterAction {
        Add(i64),
        AddLater(i64),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = Counter;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Counter,
            action: CounterAction,
            _env: &(),
        ) -> SmallVec<[Effect<CounterAction>; 4]> {
            match action {
                CounterAction::Add(n) => {
                    state.value += n;
                    smallvec![]
                },
                CounterAction::AddLater(n) => smallvec![Effect::Future(Box::pin(async move {
                    Some(CounterAction::Add(n))
                }))],
            }
        }
    }

    #[tokio::test]
    async fn send_reduces_and_publishes_state() {
        let store = Store::new(Counter::default(), CounterReducer, ());
        let watcher = store.subscribe_state();

        store.send(CounterAction::Add(3)).await.unwrap();

        assert_eq!(store.state(|s| s.value).await, 3);
        assert_eq!(watcher.borrow().value, 3);
    }

    #[tokio::test]
    async fn effect_handle_waits_for_feedback_effect() {
        let store = Store::new(Counter::default(), CounterReducer, ());

        let mut handle = store.send(CounterAction::AddLater(4)).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.state(|s| s.value).await, 4);
    }

    #[tokio::test]
    async fn feedback_actions_are_broadcast() {
        let store = Store::new(Counter::default(), CounterReducer, ());
        let mut actions = store.subscribe_actions();

        let mut handle = store.send(CounterAction::AddLater(2)).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

        assert_eq!(actions.recv().await.unwrap(), CounterAction::Add(2));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = Store::new(Counter::default(), CounterReducer, ());

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert!(matches!(
            store.send(CounterAction::Add(1)).await,
            Err(StoreError::ShutdownInProgress)
        ));
    }

    #[test]
    fn completed_handle_has_nothing_pending() {
        assert_eq!(EffectHandle::completed().pending(), 0);
    }
}
