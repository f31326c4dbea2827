//! Reactive list state: rows, transient UI state and pending deletes.
//!
//! [`ListReducer`] combines two reducers over [`ListState`]:
//!
//! 1. the data reducer, owning the query subscription, persistence writes
//!    and the soft-delete / undo cycle
//! 2. [`UiReducer`] scoped to [`ListState::ui`], owning selection,
//!    expansion and the color picker
//!
//! Both run inside the same reduction, under the store's write lock, so a
//! snapshot can never combine rows and UI state from different moments.

use crate::query::{ItemQuery, QueryFilters, normalize_search};
use crate::repository::{ItemRepository, RepositoryError, TrashBatchId};
use crate::snapshot::{Snapshot, compose};
use crate::types::{ColorGroup, ItemId, ListItem, ListVariant, SortOrder};
use crate::ui_state::{UiReducer, UiState};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use pantry_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use pantry_core::effect::{Effect, EffectId};
use pantry_core::environment::Clock;
use pantry_core::reducer::Reducer;
use pantry_core::{SmallVec, async_effect, delay, smallvec};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Live query subscription of the screen
pub const QUERY: EffectId = EffectId::new("list.query");

/// Timer that commits the pending delete
pub const UNDO_WINDOW: EffectId = EffectId::new("list.undo_window");

/// "N items deleted" notice with its undo affordance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteNotice {
    /// Batch the undo restores
    pub batch: TrashBatchId,
    /// Items removed by the batch
    pub count: usize,
    /// When the store accepted the delete
    pub deleted_at: DateTime<Utc>,
}

impl DeleteNotice {
    /// Text shown to the user
    #[must_use]
    pub fn message(&self) -> String {
        if self.count == 1 {
            "1 item deleted".to_string()
        } else {
            format!("{} items deleted", self.count)
        }
    }
}

/// State of one list screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListState {
    /// Which list the screen shows
    pub variant: ListVariant,
    /// Latest query emission, `None` until the first one
    pub rows: Option<Vec<ListItem>>,
    /// Transient UI state
    pub ui: UiState,
    /// Generation of the live subscription; older emissions are dropped
    pub generation: u64,
    /// Pending soft delete that can still be undone
    pub notice: Option<DeleteNotice>,
}

impl ListState {
    /// Fresh state, nothing loaded
    #[must_use]
    pub fn new(variant: ListVariant) -> Self {
        Self {
            variant,
            rows: None,
            ui: UiState::default(),
            generation: 0,
            notice: None,
        }
    }

    /// Start with a sort order other than the default
    #[must_use]
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.ui.sort_order = sort_order;
        self
    }

    /// Current subscription key
    #[must_use]
    pub fn query(&self) -> ItemQuery {
        ItemQuery {
            variant: self.variant,
            sort_order: self.ui.sort_order,
            search: self.ui.search_query.clone(),
            filters: self.ui.filters,
        }
    }

    /// Compose the snapshot the screen renders
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        compose(self.rows.as_deref(), &self.ui)
    }
}

/// Everything a list screen can be told
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListAction {
    /// Restore the saved sort order and subscribe
    Start,
    /// (Re)start the live query for the current key
    Subscribe,
    /// Saved sort preference was loaded
    SortOrderRestored(SortOrder),
    /// Change and persist the sort order
    SetSortOrder(SortOrder),
    /// Change the search; blank clears it
    SetSearchQuery(Option<String>),
    /// Change the extra filters
    SetFilters(QueryFilters),
    /// Query emission
    RowsLoaded {
        /// Subscription that produced the rows
        generation: u64,
        /// Matching rows in display order
        rows: Vec<ListItem>,
    },
    /// Query error
    QueryFailed {
        /// Subscription that failed
        generation: u64,
        /// What went wrong
        error: RepositoryError,
    },
    /// Expand a row, or collapse it if expanded
    ToggleExpanded(ItemId),
    /// Show a row's color picker, or hide it if shown
    ToggleColorPicker(ItemId),
    /// Plain click
    ItemClicked(ItemId),
    /// Long click
    ItemLongClicked(ItemId),
    /// Select every row
    SelectAll,
    /// Leave multi-select mode
    ClearSelection,
    /// Swipe-to-delete
    Swiped(ItemId),
    /// Delete every selected row as one batch
    DeleteSelected,
    /// The store accepted a soft delete
    SoftDeleted {
        /// Batch to undo or commit
        batch: TrashBatchId,
        /// Items removed
        count: usize,
    },
    /// Undo the pending delete
    Undo,
    /// The undo window of a batch closed
    UndoWindowElapsed {
        /// Batch whose window closed
        batch: TrashBatchId,
    },
    /// Rename an item
    Rename {
        /// Target
        id: ItemId,
        /// New name
        name: String,
    },
    /// Edit the detail line
    SetExtraInfo {
        /// Target
        id: ItemId,
        /// New detail line
        extra_info: String,
    },
    /// Pick a color
    SetColor {
        /// Target
        id: ItemId,
        /// Picked color
        color: ColorGroup,
    },
    /// Change the amount on this screen's list
    SetAmount {
        /// Target
        id: ItemId,
        /// New amount
        amount: u32,
    },
    /// Check or uncheck (shopping list)
    ToggleChecked(ItemId),
    /// Enable or disable auto-add (inventory)
    ToggleAutoAdd(ItemId),
    /// Change the auto-add threshold (inventory)
    SetAutoAddThreshold {
        /// Target
        id: ItemId,
        /// New threshold
        threshold: u32,
    },
    /// Move checked items into the inventory (shopping list)
    Checkout,
    /// Uncheck everything (shopping list)
    ClearChecked,
}

/// Injected dependencies of a list screen
#[derive(Clone)]
pub struct ListEnvironment {
    /// Item persistence
    pub repository: Arc<dyn ItemRepository>,
    /// Time source for notices
    pub clock: Arc<dyn Clock>,
    /// How long a soft delete can be undone
    pub undo_window: Duration,
}

impl ListEnvironment {
    /// Create an environment
    #[must_use]
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        clock: Arc<dyn Clock>,
        undo_window: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            undo_window,
        }
    }
}

impl std::fmt::Debug for ListEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEnvironment")
            .field("undo_window", &self.undo_window)
            .finish_non_exhaustive()
    }
}

/// Fire-and-forget write; failures are logged and otherwise invisible
fn persist<T, F>(operation: &'static str, write: F) -> Effect<ListAction>
where
    F: Future<Output = Result<T, RepositoryError>> + Send + 'static,
{
    async_effect! {
        if let Err(error) = write.await {
            tracing::warn!(operation, %error, "List write failed");
        }
        None
    }
}

fn subscribe(state: &mut ListState, env: &ListEnvironment) -> Effect<ListAction> {
    state.generation += 1;
    let generation = state.generation;
    let query = state.query();
    tracing::debug!(generation, ?query, "Subscribing to list query");

    let rows = env.repository.watch_items(query).map(move |result| match result {
        Ok(rows) => ListAction::RowsLoaded { generation, rows },
        Err(error) => ListAction::QueryFailed { generation, error },
    });
    Effect::Stream(Box::pin(rows)).cancellable(QUERY, true)
}

fn soft_delete(env: &ListEnvironment, ids: Vec<ItemId>, variant: ListVariant) -> Effect<ListAction> {
    let repo = Arc::clone(&env.repository);
    async_effect! {
        match repo.soft_delete(ids, variant).await {
            Ok(batch) => Some(ListAction::SoftDeleted {
                batch: batch.id,
                count: batch.count,
            }),
            Err(error) => {
                tracing::warn!(%error, "Soft delete failed");
                None
            },
        }
    }
}

fn empty_trash(env: &ListEnvironment, batch: TrashBatchId) -> Effect<ListAction> {
    let repo = Arc::clone(&env.repository);
    persist("empty_trash", async move { repo.empty_trash(batch).await })
}

/// Rows, persistence and the delete/undo cycle
#[derive(Clone, Copy, Debug, Default)]
struct ListDataReducer;

impl Reducer for ListDataReducer {
    type State = ListState;
    type Action = ListAction;
    type Environment = ListEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut ListState,
        action: ListAction,
        env: &ListEnvironment,
    ) -> SmallVec<[Effect<ListAction>; 4]> {
        let repo = Arc::clone(&env.repository);
        let variant = state.variant;

        match action {
            ListAction::Start => {
                let restore = async_effect! {
                    match repo.sort_order(variant).await {
                        Ok(order) => order.map(ListAction::SortOrderRestored),
                        Err(error) => {
                            tracing::warn!(%error, "Could not load sort preference");
                            None
                        },
                    }
                };
                smallvec![subscribe(state, env), restore]
            },

            ListAction::Subscribe => smallvec![subscribe(state, env)],

            ListAction::SortOrderRestored(order) => {
                if state.ui.sort_order == order {
                    return smallvec![];
                }
                state.ui.sort_order = order;
                smallvec![subscribe(state, env)]
            },

            ListAction::SetSortOrder(order) => {
                if state.ui.sort_order == order {
                    return smallvec![];
                }
                state.ui.sort_order = order;
                smallvec![
                    subscribe(state, env),
                    persist("save_sort_order", async move {
                        repo.save_sort_order(variant, order).await
                    }),
                ]
            },

            ListAction::SetSearchQuery(search) => {
                let search = normalize_search(search);
                if state.ui.search_query == search {
                    return smallvec![];
                }
                state.ui.search_query = search;
                smallvec![subscribe(state, env)]
            },

            ListAction::SetFilters(filters) => {
                if state.ui.filters == filters {
                    return smallvec![];
                }
                state.ui.filters = filters;
                smallvec![subscribe(state, env)]
            },

            ListAction::RowsLoaded { generation, rows } => {
                if generation != state.generation {
                    tracing::debug!(generation, current = state.generation, "Dropping stale rows");
                    return smallvec![];
                }
                let present: HashSet<ItemId> = rows.iter().map(|item| item.id).collect();
                state.ui.selected.retain(|id| present.contains(id));
                tracing::debug!(generation, rows = rows.len(), "Rows loaded");
                state.rows = Some(rows);
                smallvec![]
            },

            ListAction::QueryFailed { generation, error } => {
                if generation == state.generation {
                    tracing::warn!(generation, %error, "List query failed; keeping last rows");
                }
                smallvec![]
            },

            ListAction::SelectAll => {
                if let Some(rows) = &state.rows {
                    state.ui.selected = rows.iter().map(|item| item.id).collect();
                }
                smallvec![]
            },

            ListAction::Swiped(id) => {
                let shown = state
                    .rows
                    .as_ref()
                    .is_some_and(|rows| rows.iter().any(|item| item.id == id));
                if !shown {
                    tracing::debug!(item = %id, "Ignoring swipe on a row that is not shown");
                    return smallvec![];
                }
                tracing::debug!(item = %id, %variant, "Swiped");
                smallvec![soft_delete(env, vec![id], variant)]
            },

            ListAction::DeleteSelected => {
                if state.ui.selected.is_empty() {
                    return smallvec![];
                }
                let mut ids: Vec<ItemId> = state.ui.selected.iter().copied().collect();
                ids.sort_unstable();
                smallvec![soft_delete(env, ids, variant)]
            },

            ListAction::SoftDeleted { batch, count } => {
                // Nothing was deleted; the pending notice keeps its window
                if count == 0 {
                    return smallvec![empty_trash(env, batch)];
                }

                let mut effects: SmallVec<[Effect<ListAction>; 4]> = smallvec![];

                // A newer delete commits the one still waiting for undo
                if let Some(previous) = state.notice.take() {
                    tracing::debug!(batch = %previous.batch, "Committing superseded delete");
                    effects.push(empty_trash(env, previous.batch));
                }

                state.notice = Some(DeleteNotice {
                    batch,
                    count,
                    deleted_at: env.clock.now(),
                });
                effects.push(
                    delay! {
                        duration: env.undo_window,
                        action: ListAction::UndoWindowElapsed { batch }
                    }
                    .cancellable(UNDO_WINDOW, true),
                );
                effects
            },

            ListAction::Undo => {
                let Some(notice) = state.notice.take() else {
                    tracing::debug!("Nothing to undo");
                    return smallvec![];
                };
                tracing::debug!(batch = %notice.batch, "Undoing delete");
                smallvec![
                    Effect::Cancel(UNDO_WINDOW),
                    persist("undo_delete", async move { repo.undo_delete(notice.batch).await }),
                ]
            },

            ListAction::UndoWindowElapsed { batch } => {
                if state.notice.as_ref().is_none_or(|notice| notice.batch != batch) {
                    return smallvec![];
                }
                state.notice = None;
                smallvec![empty_trash(env, batch)]
            },

            ListAction::Rename { id, name } => {
                smallvec![persist("set_name", async move { repo.set_name(id, name).await })]
            },

            ListAction::SetExtraInfo { id, extra_info } => smallvec![persist(
                "set_extra_info",
                async move { repo.set_extra_info(id, extra_info).await }
            )],

            ListAction::SetColor { id, color } => smallvec![persist(
                "set_color_group",
                async move { repo.set_color_group(id, color).await }
            )],

            ListAction::SetAmount { id, amount } => smallvec![persist(
                "set_amount",
                async move { repo.set_amount(id, variant, amount).await }
            )],

            ListAction::ToggleChecked(id) if variant == ListVariant::Shopping => {
                smallvec![persist("toggle_checked", async move { repo.toggle_checked(id).await })]
            },

            ListAction::ToggleAutoAdd(id) if variant == ListVariant::Inventory => {
                smallvec![persist("toggle_auto_add", async move { repo.toggle_auto_add(id).await })]
            },

            ListAction::SetAutoAddThreshold { id, threshold }
                if variant == ListVariant::Inventory =>
            {
                smallvec![persist("set_auto_add_threshold", async move {
                    repo.set_auto_add_threshold(id, threshold).await
                })]
            },

            ListAction::Checkout if variant == ListVariant::Shopping => {
                smallvec![persist("checkout", async move { repo.checkout().await })]
            },

            ListAction::ClearChecked if variant == ListVariant::Shopping => {
                smallvec![persist("clear_checked", async move { repo.clear_checked().await })]
            },

            ListAction::ToggleChecked(_)
            | ListAction::ToggleAutoAdd(_)
            | ListAction::SetAutoAddThreshold { .. }
            | ListAction::Checkout
            | ListAction::ClearChecked => {
                tracing::debug!(?action, %variant, "Action does not apply to this list");
                smallvec![]
            },

            // Handled by the UI reducer
            ListAction::ToggleExpanded(_)
            | ListAction::ToggleColorPicker(_)
            | ListAction::ItemClicked(_)
            | ListAction::ItemLongClicked(_)
            | ListAction::ClearSelection => smallvec![],
        }
    }
}

fn ui_of(state: &ListState) -> &UiState {
    &state.ui
}

fn set_ui(state: &mut ListState, ui: UiState) {
    state.ui = ui;
}

/// Reducer of a list screen
pub struct ListReducer {
    inner: CombinedReducer<ListState, ListAction, ListEnvironment>,
}

impl ListReducer {
    /// Data reducer first, then the scoped UI reducer
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: combine_reducers(vec![
                Box::new(ListDataReducer),
                Box::new(scope_reducer(UiReducer, ui_of, set_ui)),
            ]),
        }
    }
}

impl Default for ListReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ListReducer").field(&self.inner).finish()
    }
}

impl Reducer for ListReducer {
    type State = ListState;
    type Action = ListAction;
    type Environment = ListEnvironment;

    fn reduce(
        &self,
        state: &mut ListState,
        action: ListAction,
        env: &ListEnvironment,
    ) -> SmallVec<[Effect<ListAction>; 4]> {
        self.inner.reduce(state, action, env)
    }
}
