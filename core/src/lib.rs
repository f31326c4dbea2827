//! # Pantry Core
//!
//! Core traits and types shared by the Pantry list engine.
//!
//! Every screen of the app is driven the same way: an owned **State**, a
//! closed set of **Actions** (user gestures, query emissions, timer
//! expirations), and a pure **Reducer** that turns
//! `(State, Action, Environment)` into the next state plus a list of
//! **Effects**. Effects are descriptions only; the runtime crate executes
//! them and feeds any resulting actions back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: Screen state (rows, selection, expansion, pending deletes)
//! - **Action**: All inputs to a reducer
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (store writes, query subscriptions, timers)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use pantry_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! let _ = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer composition utilities
pub mod composition;

mod effect_macros;

/// Reducer module - The core trait for screen logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold every state transition of a screen and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for screen logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions for the
        /// runtime. Most actions produce zero to two effects, hence the
        /// inline capacity of four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. They are composable and, when wrapped
/// in [`Effect::Cancellable`], cancellable by id.
pub mod effect {
    use futures::Stream;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier used to cancel or replace in-flight effects
    ///
    /// Identifiers are scoped to a single store.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Creates an effect identifier from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// Returns the identifier name
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Delayed action (undo windows, debounces)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Long-lived stream of actions (live query subscriptions)
        ///
        /// Every item is fed back into the reducer in order.
        Stream(Pin<Box<dyn Stream<Item = Action> + Send>>),

        /// Effect that can be cancelled by id
        Cancellable {
            /// Identifier to cancel by
            id: EffectId,
            /// Abort effects already running under `id` before starting this one
            cancel_in_flight: bool,
            /// Wrapped effect
            effect: Box<Effect<Action>>,
        },

        /// Abort every in-flight effect registered under the id
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future and Stream don't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Stream(_) => write!(f, "Effect::Stream(<stream>)"),
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("cancel_in_flight", cancel_in_flight)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap this effect so it can be cancelled by `id`
        ///
        /// With `cancel_in_flight` the new effect replaces whatever is still
        /// running under the same id.
        #[must_use]
        pub fn cancellable(self, id: EffectId, cancel_in_flight: bool) -> Effect<Action> {
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(self),
            }
        }

        /// Returns the id this effect is registered under, if any
        #[must_use]
        pub const fn cancellation_id(&self) -> Option<EffectId> {
            match self {
                Effect::Cancellable { id, .. } | Effect::Cancel(id) => Some(*id),
                _ => None,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// External dependencies are abstracted behind traits and injected via the
/// Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, EffectId};
    use std::time::Duration;

    const QUERY: EffectId = EffectId::new("query");

    #[test]
    fn cancellable_wraps_and_reports_id() {
        let effect: Effect<u8> = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(1),
        }
        .cancellable(QUERY, true);

        assert_eq!(effect.cancellation_id(), Some(QUERY));
        assert!(matches!(
            effect,
            Effect::Cancellable {
                cancel_in_flight: true,
                ..
            }
        ));
    }

    #[test]
    fn debug_output_hides_futures() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { Some(3) }));
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");

        let cancel: Effect<u8> = Effect::Cancel(QUERY);
        assert_eq!(format!("{cancel:?}"), "Effect::Cancel(EffectId(\"query\"))");
    }

    #[test]
    fn plain_effects_have_no_cancellation_id() {
        assert_eq!(Effect::<u8>::None.cancellation_id(), None);
    }
}
