//! Transient UI state of a list screen and the reducer that owns it.
//!
//! Expansion and the color picker are single-slot: assigning a new id
//! replaces the previous one, assigning the current id clears it. Nothing
//! here is persisted except the sort order, which the list reducer saves.

use crate::query::QueryFilters;
use crate::reducer::{ListAction, ListEnvironment};
use crate::types::{ItemId, SortOrder};
use pantry_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::collections::HashSet;

/// Selection, expansion and query key of one list screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    /// The expanded row, at most one
    pub expanded: Option<ItemId>,
    /// The row showing its color picker, at most one
    pub color_picker: Option<ItemId>,
    /// Multi-selection
    pub selected: HashSet<ItemId>,
    /// Active search, never blank
    pub search_query: Option<String>,
    /// Row order
    pub sort_order: SortOrder,
    /// Extra query filters
    pub filters: QueryFilters,
}

impl UiState {
    /// Whether the screen is in multi-select mode
    #[must_use]
    pub fn is_selecting(&self) -> bool {
        !self.selected.is_empty()
    }
}

/// Toggle a single-slot id: same id clears, another id replaces
fn toggle_slot(slot: &mut Option<ItemId>, id: ItemId) {
    *slot = if *slot == Some(id) { None } else { Some(id) };
}

fn toggle_member(set: &mut HashSet<ItemId>, id: ItemId) {
    if !set.remove(&id) {
        set.insert(id);
    }
}

/// Reducer for [`UiState`]
///
/// Runs after the data reducer inside the same reduction, so the data side
/// still sees the selection a `DeleteSelected` is about to clear.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiReducer;

impl Reducer for UiReducer {
    type State = UiState;
    type Action = ListAction;
    type Environment = ListEnvironment;

    fn reduce(
        &self,
        ui: &mut UiState,
        action: ListAction,
        _env: &ListEnvironment,
    ) -> SmallVec<[Effect<ListAction>; 4]> {
        match action {
            ListAction::ToggleExpanded(id) => {
                toggle_slot(&mut ui.expanded, id);
                tracing::debug!(item = %id, expanded = ?ui.expanded, "Expansion toggled");
            },
            ListAction::ToggleColorPicker(id) => {
                toggle_slot(&mut ui.color_picker, id);
            },
            ListAction::ItemClicked(id) => {
                // Plain clicks only extend an existing selection
                if ui.is_selecting() {
                    toggle_member(&mut ui.selected, id);
                }
            },
            ListAction::ItemLongClicked(id) => toggle_member(&mut ui.selected, id),
            ListAction::ClearSelection => ui.selected.clear(),
            ListAction::DeleteSelected => {
                if ui.expanded.is_some_and(|id| ui.selected.contains(&id)) {
                    ui.expanded = None;
                }
                if ui.color_picker.is_some_and(|id| ui.selected.contains(&id)) {
                    ui.color_picker = None;
                }
                ui.selected.clear();
            },
            ListAction::Swiped(id) => {
                if ui.expanded == Some(id) {
                    ui.expanded = None;
                }
                if ui.color_picker == Some(id) {
                    ui.color_picker = None;
                }
                ui.selected.remove(&id);
            },
            ListAction::SetColor { id, .. } => {
                if ui.color_picker == Some(id) {
                    ui.color_picker = None;
                }
            },
            _ => {},
        }
        smallvec![]
    }
}
