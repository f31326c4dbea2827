//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//!
//! A list screen combines a reducer scoped to its transient UI state
//! (selection, expansion) with the reducer owning rows and persistence, so
//! one action can update both halves inside a single reduction.
//!
//! # Example
//!
//! ```
//! use pantry_core::composition::{combine_reducers, scope_reducer};
//! use pantry_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Default)]
//! struct Screen {
//!     hits: u32,
//!     ui: Ui,
//! }
//!
//! #[derive(Clone, Default)]
//! struct Ui {
//!     expanded: Option<u64>,
//! }
//!
//! #[derive(Clone)]
//! enum Act {
//!     Toggle(u64),
//! }
//!
//! struct UiReducer;
//! struct HitReducer;
//!
//! impl Reducer for UiReducer {
//!     type State = Ui;
//!     type Action = Act;
//!     type Environment = ();
//!
//!     fn reduce(&self, ui: &mut Ui, action: Act, _env: &()) -> SmallVec<[Effect<Act>; 4]> {
//!         let Act::Toggle(id) = action;
//!         ui.expanded = if ui.expanded == Some(id) { None } else { Some(id) };
//!         smallvec![]
//!     }
//! }
//!
//! impl Reducer for HitReducer {
//!     type State = Screen;
//!     type Action = Act;
//!     type Environment = ();
//!
//!     fn reduce(&self, screen: &mut Screen, _action: Act, _env: &()) -> SmallVec<[Effect<Act>; 4]> {
//!         screen.hits += 1;
//!         smallvec![]
//!     }
//! }
//!
//! fn ui_of(screen: &Screen) -> &Ui {
//!     &screen.ui
//! }
//!
//! fn set_ui(screen: &mut Screen, ui: Ui) {
//!     screen.ui = ui;
//! }
//!
//! let combined = combine_reducers(vec![
//!     Box::new(scope_reducer(UiReducer, ui_of, set_ui)),
//!     Box::new(HitReducer),
//! ]);
//!
//! let mut screen = Screen::default();
//! let _ = combined.reduce(&mut screen, Act::Toggle(7), &());
//! assert_eq!(screen.ui.expanded, Some(7));
//! assert_eq!(screen.hits, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Boxed reducer usable inside a [`CombinedReducer`]
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> std::fmt::Debug for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("reducers", &self.reducers.len())
            .finish()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// The sub-state is cloned out, reduced, and written back, so the child
/// reducer never observes the parent.
#[must_use]
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A reducer focused on a sub-state of a larger state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn() -> (A, E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut sub_state = (self.get_state)(state).clone();
        let effects = self.reducer.reduce(&mut sub_state, action, env);
        (self.set_state)(state, sub_state);
        effects
    }
}
