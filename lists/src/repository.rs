//! Persistence boundary for list items and groups.
//!
//! The list reducer never touches storage directly: it returns effects that
//! capture an `Arc<dyn ItemRepository>` and call into it. Writes are
//! optimistic; their only guarantee is that the next query emission
//! reflects them.
//!
//! # Implementations
//!
//! - [`InMemoryRepository`](crate::memory::InMemoryRepository): the
//!   reference implementation used by the app and the tests

use crate::query::ItemQuery;
use crate::types::{ColorGroup, GroupId, ItemGroup, ItemId, ListItem, ListVariant, SortOrder};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by item repositories
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No item with this id
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// No group with this id
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    /// The batch was already restored or its trash emptied
    #[error("Nothing to undo for {0}")]
    NothingToUndo(TrashBatchId),

    /// Backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result alias for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Boxed future returned by repository operations
pub type RepositoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Live row stream: one emission per store change
pub type RowStream = Pin<Box<dyn Stream<Item = Result<Vec<ListItem>>> + Send>>;

/// Identifier of one soft-delete operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrashBatchId(u64);

impl TrashBatchId {
    /// Creates a batch id from its raw value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for TrashBatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

/// Receipt of a soft delete
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashBatch {
    /// Batch to undo or commit
    pub id: TrashBatchId,
    /// Items actually removed from the list
    pub count: usize,
}

/// A new item as entered by the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Owning group
    pub group_id: GroupId,
    /// Display name
    pub name: String,
    /// Detail line
    pub extra_info: String,
    /// Color category
    pub color: ColorGroup,
    /// List the item is added to
    pub variant: ListVariant,
    /// Initial amount on that list
    pub amount: u32,
}

/// Item and group persistence
///
/// Implementations must be `Send + Sync`; reducers capture them in effects
/// that run on the tokio runtime.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the trait
/// can be used as `Arc<dyn ItemRepository>`.
pub trait ItemRepository: Send + Sync {
    /// Live query: emits the matching rows now and after every change
    ///
    /// Only items of selected groups are returned. The stream does not end on
    /// its own; dropping it unsubscribes.
    fn watch_items(&self, query: ItemQuery) -> RowStream;

    /// One-shot query with the same semantics as [`Self::watch_items`]
    fn items(&self, query: ItemQuery) -> RepositoryFuture<'_, Vec<ListItem>>;

    /// Load one item
    fn item(&self, id: ItemId) -> RepositoryFuture<'_, ListItem>;

    /// Insert an item, or link it to an existing one
    ///
    /// An existing live item with the same name and extra info in the same
    /// group receives the amount instead of a new row being created.
    fn add_item(&self, item: NewItem) -> RepositoryFuture<'_, ItemId>;

    /// Rename an item
    fn set_name(&self, id: ItemId, name: String) -> RepositoryFuture<'_, ()>;

    /// Replace the detail line
    fn set_extra_info(&self, id: ItemId, extra_info: String) -> RepositoryFuture<'_, ()>;

    /// Change the color category
    fn set_color_group(&self, id: ItemId, color: ColorGroup) -> RepositoryFuture<'_, ()>;

    /// Set the amount on one list
    ///
    /// Lowering the inventory amount may put the item back on the shopping
    /// list through its auto-add threshold.
    fn set_amount(&self, id: ItemId, variant: ListVariant, amount: u32)
    -> RepositoryFuture<'_, ()>;

    /// Flip the checked flag of a shopping-list item
    fn toggle_checked(&self, id: ItemId) -> RepositoryFuture<'_, ()>;

    /// Flip auto-add of an inventory item
    fn toggle_auto_add(&self, id: ItemId) -> RepositoryFuture<'_, ()>;

    /// Change the auto-add threshold of an inventory item
    fn set_auto_add_threshold(&self, id: ItemId, threshold: u32) -> RepositoryFuture<'_, ()>;

    /// Remove items from one list, keeping enough to undo
    fn soft_delete(&self, ids: Vec<ItemId>, variant: ListVariant)
    -> RepositoryFuture<'_, TrashBatch>;

    /// Restore a soft-deleted batch exactly; returns the restored count
    fn undo_delete(&self, batch: TrashBatchId) -> RepositoryFuture<'_, usize>;

    /// Commit a batch; items deleted from both lists are purged
    fn empty_trash(&self, batch: TrashBatchId) -> RepositoryFuture<'_, usize>;

    /// Move checked shopping-list items into the inventory
    fn checkout(&self) -> RepositoryFuture<'_, usize>;

    /// Uncheck every checked shopping-list item
    fn clear_checked(&self) -> RepositoryFuture<'_, usize>;

    /// All groups with derived counts
    fn groups(&self) -> RepositoryFuture<'_, Vec<ItemGroup>>;

    /// Create a selected group
    fn add_group(&self, name: String) -> RepositoryFuture<'_, GroupId>;

    /// Rename a group
    fn rename_group(&self, id: GroupId, name: String) -> RepositoryFuture<'_, ()>;

    /// Show or hide a group's items
    fn set_group_selected(&self, id: GroupId, selected: bool) -> RepositoryFuture<'_, ()>;

    /// Delete a group with all of its items
    fn delete_group(&self, id: GroupId) -> RepositoryFuture<'_, ()>;

    /// Persist the sort preference of a list
    fn save_sort_order(&self, variant: ListVariant, order: SortOrder) -> RepositoryFuture<'_, ()>;

    /// Stored sort preference of a list, if any
    fn sort_order(&self, variant: ListVariant) -> RepositoryFuture<'_, Option<SortOrder>>;
}
