//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use pantry_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Setup actions given with [`ReducerTest::given_actions`] are reduced first
/// and their effects discarded; effect assertions only see the effects of the
/// action under test.
///
/// # Example
///
/// ```ignore
/// use pantry_testing::ReducerTest;
///
/// ReducerTest::new(ListReducer::new())
///     .with_env(test_environment())
///     .given_state(ListState::new(ListVariant::Shopping))
///     .when_action(ListAction::ToggleExpanded(ItemId::new(7)))
///     .then_state(|state| {
///         assert_eq!(state.ui.expanded, Some(ItemId::new(7)));
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Actions reduced before the action under test (Given)
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.setup.extend(actions);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for setup in self.setup {
            let _ = self.reducer.reduce(&mut state, setup, &env);
        }

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use pantry_core::effect::{Effect, EffectId};

    fn flatten<A>(effects: &[Effect<A>]) -> Vec<&Effect<A>> {
        let mut flat = Vec::new();
        for effect in effects {
            match effect {
                Effect::Cancellable { effect: inner, .. } => {
                    flat.push(effect);
                    flat.extend(flatten(std::slice::from_ref(&**inner)));
                },
                other => flat.push(other),
            }
        }
        flat
    }

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            flatten(effects)
                .iter()
                .any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Stream effect
    ///
    /// # Panics
    ///
    /// Panics if no Stream effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_stream_effect<A>(effects: &[Effect<A>]) {
        assert!(
            flatten(effects)
                .iter()
                .any(|e| matches!(e, Effect::Stream(_))),
            "Expected at least one Stream effect, but none found"
        );
    }

    /// Assert that an effect is registered under `id` (or cancels it)
    ///
    /// # Panics
    ///
    /// Panics if no effect carries the id.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_touches_id<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            flatten(effects)
                .iter()
                .any(|e| e.cancellation_id() == Some(id)),
            "Expected an effect registered under {id}, but none found"
        );
    }

    /// Assert that effects cancel `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Effect::Cancel(id)` is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            flatten(effects)
                .iter()
                .any(|e| matches!(e, Effect::Cancel(candidate) if *candidate == id)),
            "Expected Effect::Cancel({id}), but none found"
        );
    }

    /// Returns the actions scheduled by `Effect::Delay`, with their durations
    #[must_use]
    pub fn delayed_actions<A: Clone>(effects: &[Effect<A>]) -> Vec<(std::time::Duration, A)> {
        flatten(effects)
            .into_iter()
            .filter_map(|e| match e {
                Effect::Delay { duration, action } => Some((*duration, action.as_ref().clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::effect::{Effect, EffectId};
    use pantry_core::{SmallVec, delay, smallvec};
    use std::time::Duration;

    const TICK: EffectId = EffectId::new("tick");

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Schedule,
        Stop,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TestAction::Schedule => smallvec![
                    delay! { duration: Duration::from_secs(1), action: TestAction::Increment }
                        .cancellable(TICK, true)
                ],
                TestAction::Stop => smallvec![Effect::Cancel(TICK)],
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn given_actions_run_before_action_under_test() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .given_actions([TestAction::Increment, TestAction::Increment])
            .when_action(TestAction::Increment)
            .then_state(|state| assert_eq!(state.count, 3))
            .run();
    }

    #[test]
    fn delayed_actions_are_found_inside_cancellable() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Schedule)
            .then_effects(|effects| {
                assertions::assert_touches_id(effects, TICK);
                assert_eq!(
                    assertions::delayed_actions(effects),
                    vec![(Duration::from_secs(1), TestAction::Increment)]
                );
            })
            .run();
    }

    #[test]
    fn cancel_assertion_matches_id() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Stop)
            .then_effects(|effects| assertions::assert_cancels(effects, TICK))
            .run();
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<TestAction>::None], 1);
        assertions::assert_effects_count::<TestAction>(&[], 0);
    }
}
