//! Per-screen view-models and gesture routing.
//!
//! A rendering surface reports every user gesture with the target item id
//! first. [`Gesture::into_action`] decides, per list variant, whether the
//! gesture becomes a data mutation, a UI-state toggle, or nothing.

use crate::reducer::{DeleteNotice, ListAction, ListEnvironment, ListReducer, ListState};
use crate::snapshot::Snapshot;
use crate::types::{ColorGroup, ItemId, ListVariant};
use futures::Stream;
use pantry_runtime::{StoreError, store::Store};
use std::future::Future;

/// Store type behind a list screen
pub type ListStore = Store<ListState, ListAction, ListEnvironment, ListReducer>;

/// A user gesture on one row
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Plain click
    Click,
    /// Long click
    LongClick,
    /// Swipe-to-delete
    Swipe,
    /// Color button: show or hide the picker
    ColorButton,
    /// A color was picked
    ColorPicked(ColorGroup),
    /// Name edited
    Renamed(String),
    /// Detail line edited
    ExtraInfoEdited(String),
    /// Amount stepper changed
    AmountChanged(u32),
    /// Edit button: expand or collapse
    EditButton,
    /// Checkbox (shopping list)
    Checkbox,
    /// Auto-add checkbox (inventory)
    AutoAddToggled,
    /// Auto-add amount changed (inventory)
    AutoAddThresholdChanged(u32),
}

impl Gesture {
    /// Route a gesture on `id` to the action it means on `variant`
    ///
    /// Gestures a variant does not offer map to `None`.
    #[must_use]
    pub fn into_action(self, id: ItemId, variant: ListVariant) -> Option<ListAction> {
        let action = match (self, variant) {
            (Self::Click, _) => ListAction::ItemClicked(id),
            (Self::LongClick, _) => ListAction::ItemLongClicked(id),
            (Self::Swipe, _) => ListAction::Swiped(id),
            (Self::ColorButton, _) => ListAction::ToggleColorPicker(id),
            (Self::ColorPicked(color), _) => ListAction::SetColor { id, color },
            (Self::Renamed(name), _) => ListAction::Rename { id, name },
            (Self::ExtraInfoEdited(extra_info), _) => ListAction::SetExtraInfo { id, extra_info },
            (Self::AmountChanged(amount), _) => ListAction::SetAmount { id, amount },
            (Self::EditButton, _) => ListAction::ToggleExpanded(id),
            (Self::Checkbox, ListVariant::Shopping) => ListAction::ToggleChecked(id),
            (Self::AutoAddToggled, ListVariant::Inventory) => ListAction::ToggleAutoAdd(id),
            (Self::AutoAddThresholdChanged(threshold), ListVariant::Inventory) => {
                ListAction::SetAutoAddThreshold { id, threshold }
            },
            (Self::Checkbox | Self::AutoAddToggled | Self::AutoAddThresholdChanged(_), _) => {
                return None;
            },
        };
        Some(action)
    }
}

/// One callback per row gesture, each taking the item id first
pub trait ItemCallbacks {
    /// Plain click
    fn on_click(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Long click
    fn on_long_click(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Swipe-to-delete
    fn on_swipe(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Color button
    fn on_color_button(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Color picked
    fn on_color_picked(
        &self,
        id: ItemId,
        color: ColorGroup,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Name edited
    fn on_rename(
        &self,
        id: ItemId,
        name: String,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Detail line edited
    fn on_extra_info(
        &self,
        id: ItemId,
        extra_info: String,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Amount changed
    fn on_amount(&self, id: ItemId, amount: u32)
    -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Edit button
    fn on_edit_button(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Checkbox
    fn on_checkbox(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Auto-add checkbox
    fn on_auto_add(&self, id: ItemId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Auto-add amount
    fn on_auto_add_threshold(
        &self,
        id: ItemId,
        threshold: u32,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// View-model of a shopping-list or inventory screen
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Debug)]
pub struct ListViewModel {
    variant: ListVariant,
    store: ListStore,
}

impl ListViewModel {
    /// Create a view-model around a fresh store
    ///
    /// Call [`Self::start`] to load the saved sort order and subscribe.
    #[must_use]
    pub fn new(state: ListState, env: ListEnvironment) -> Self {
        let variant = state.variant;
        Self {
            variant,
            store: Store::new(state, ListReducer::new(), env),
        }
    }

    /// Which list this screen shows
    #[must_use]
    pub const fn variant(&self) -> ListVariant {
        self.variant
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &ListStore {
        &self.store
    }

    /// Restore preferences and start the live query
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn start(&self) -> Result<(), StoreError> {
        self.send(ListAction::Start).await
    }

    /// Send an action, ignoring effect completion
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn send(&self, action: ListAction) -> Result<(), StoreError> {
        self.store.send(action).await.map(|_| ())
    }

    /// Route a gesture on `id`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    #[tracing::instrument(skip(self), fields(variant = %self.variant))]
    pub async fn dispatch(&self, id: ItemId, gesture: Gesture) -> Result<(), StoreError> {
        match gesture.into_action(id, self.variant) {
            Some(action) => self.send(action).await,
            None => {
                tracing::debug!("Gesture not offered on this list");
                Ok(())
            },
        }
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.store.state(ListState::snapshot).await
    }

    /// Pending delete notice, if any
    pub async fn notice(&self) -> Option<DeleteNotice> {
        self.store.state(|state| state.notice.clone()).await
    }

    /// Stream of distinct snapshots, starting with the current one
    ///
    /// Reductions that leave the snapshot unchanged emit nothing.
    pub fn snapshots(&self) -> impl Stream<Item = Snapshot> + Send + 'static {
        let mut states = self.store.subscribe_state();

        async_stream::stream! {
            let mut last: Option<Snapshot> = None;
            loop {
                let snapshot = states.borrow_and_update().snapshot();
                if last.as_ref() != Some(&snapshot) {
                    last = Some(snapshot.clone());
                    yield snapshot;
                }
                if states.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

impl ItemCallbacks for ListViewModel {
    async fn on_click(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::Click).await
    }

    async fn on_long_click(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::LongClick).await
    }

    async fn on_swipe(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::Swipe).await
    }

    async fn on_color_button(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::ColorButton).await
    }

    async fn on_color_picked(&self, id: ItemId, color: ColorGroup) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::ColorPicked(color)).await
    }

    async fn on_rename(&self, id: ItemId, name: String) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::Renamed(name)).await
    }

    async fn on_extra_info(&self, id: ItemId, extra_info: String) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::ExtraInfoEdited(extra_info)).await
    }

    async fn on_amount(&self, id: ItemId, amount: u32) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::AmountChanged(amount)).await
    }

    async fn on_edit_button(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::EditButton).await
    }

    async fn on_checkbox(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::Checkbox).await
    }

    async fn on_auto_add(&self, id: ItemId) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::AutoAddToggled).await
    }

    async fn on_auto_add_threshold(&self, id: ItemId, threshold: u32) -> Result<(), StoreError> {
        self.dispatch(id, Gesture::AutoAddThresholdChanged(threshold))
            .await
    }
}
