//! Immutable list snapshots.
//!
//! A [`Snapshot`] is rebuilt wholesale from the latest rows and the latest
//! UI state on every reduction and compared structurally by consumers.

use crate::types::{ItemId, ListItem};
use crate::ui_state::UiState;
use serde::Serialize;
use std::collections::HashSet;

/// Why a list shows no rows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The list itself is empty
    NoItems,
    /// Rows exist but none match the active search
    NoSearchResults,
}

/// Rows plus the UI state that applies to them
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Content {
    /// Ordered rows
    pub items: Vec<ListItem>,
    /// Selected ids, all present in `items`
    pub selected: HashSet<ItemId>,
    /// Expanded row, present in `items` when set
    pub expanded: Option<ItemId>,
    /// Row showing its color picker, present in `items` when set
    pub color_picker: Option<ItemId>,
}

impl Content {
    /// Whether `id` is one of the rows
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Position of `id` in display order
    #[must_use]
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// What a list screen renders
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Snapshot {
    /// No query emission yet
    Loading,
    /// Query returned nothing
    Empty {
        /// Which empty message to show
        reason: EmptyReason,
    },
    /// Rows to render
    Content(Content),
}

impl Snapshot {
    /// The content, if any rows are shown
    #[must_use]
    pub const fn content(&self) -> Option<&Content> {
        match self {
            Self::Content(content) => Some(content),
            _ => None,
        }
    }
}

/// Combine the latest rows with the latest UI state
///
/// UI ids that no longer match a row are reported as absent rather than
/// dangling.
#[must_use]
pub fn compose(rows: Option<&[ListItem]>, ui: &UiState) -> Snapshot {
    let Some(rows) = rows else {
        return Snapshot::Loading;
    };

    if rows.is_empty() {
        let reason = if ui.search_query.is_some() {
            EmptyReason::NoSearchResults
        } else {
            EmptyReason::NoItems
        };
        return Snapshot::Empty { reason };
    }

    let present: HashSet<ItemId> = rows.iter().map(|item| item.id).collect();
    let live = |id: Option<ItemId>| id.filter(|id| present.contains(id));

    Snapshot::Content(Content {
        items: rows.to_vec(),
        selected: ui.selected.intersection(&present).copied().collect(),
        expanded: live(ui.expanded),
        color_picker: live(ui.color_picker),
    })
}
