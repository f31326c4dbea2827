//! In-memory item repository with live queries.
//!
//! Every write bumps a revision published on a `watch` channel; live
//! queries re-run on each revision, so a subscriber always receives the
//! rows as of the latest write (intermediate revisions may be skipped).

use crate::query::ItemQuery;
use crate::repository::{
    ItemRepository, NewItem, RepositoryError, RepositoryFuture, Result, RowStream, TrashBatch,
    TrashBatchId,
};
use crate::types::{ColorGroup, GroupId, ItemGroup, ItemId, ListItem, ListVariant, SortOrder};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, watch};

/// What a soft delete took away from one item
#[derive(Clone, Debug)]
struct TrashEntry {
    id: ItemId,
    amount: Option<u32>,
    is_checked: bool,
}

#[derive(Clone, Debug)]
struct Trash {
    variant: ListVariant,
    entries: Vec<TrashEntry>,
}

#[derive(Debug)]
struct Data {
    items: BTreeMap<ItemId, ListItem>,
    groups: BTreeMap<GroupId, ItemGroup>,
    trash: HashMap<TrashBatchId, Trash>,
    sort_orders: HashMap<ListVariant, SortOrder>,
    next_item: u64,
    next_group: u64,
    next_batch: u64,
}

impl Data {
    fn item_mut(&mut self, id: ItemId) -> Result<&mut ListItem> {
        self.items
            .get_mut(&id)
            .ok_or(RepositoryError::ItemNotFound(id))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut ItemGroup> {
        self.groups
            .get_mut(&id)
            .ok_or(RepositoryError::GroupNotFound(id))
    }

    fn query(&self, query: &ItemQuery) -> Vec<ListItem> {
        let visible = self.items.values().filter(|item| {
            self.groups
                .get(&item.group_id)
                .is_some_and(|group| group.is_selected)
        });
        query.apply(visible)
    }

    /// Whether the item sits in a trash batch that has not been committed yet
    fn is_trashed(&self, id: ItemId) -> bool {
        self.trash
            .values()
            .any(|trash| trash.entries.iter().any(|entry| entry.id == id))
    }
}

/// Puts a low-running inventory item back on the shopping list
fn apply_auto_add(item: &mut ListItem) {
    let Some(stock) = item.inventory_amount else {
        return;
    };
    if item.auto_add_to_shopping_list
        && stock <= item.auto_add_threshold
        && item.shopping_list_amount.is_none()
    {
        tracing::debug!(item = %item.id, stock, threshold = item.auto_add_threshold, "Auto-adding to shopping list");
        item.shopping_list_amount = Some(1);
        item.is_checked = false;
    }
}

#[derive(Debug)]
struct Inner {
    data: RwLock<Data>,
    revision: watch::Sender<u64>,
    failing: AtomicBool,
}

/// Item repository held in memory
///
/// Clones share the same data.
///
/// # Example
///
/// ```
/// use pantry_lists::memory::InMemoryRepository;
/// use pantry_lists::repository::{ItemRepository, NewItem};
/// use pantry_lists::types::{ColorGroup, ListVariant};
/// use pantry_lists::query::ItemQuery;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = InMemoryRepository::new();
/// let group = repo.add_group("Home".to_string()).await?;
/// repo.add_item(NewItem {
///     group_id: group,
///     name: "Milk".to_string(),
///     extra_info: String::new(),
///     color: ColorGroup::Blue,
///     variant: ListVariant::Shopping,
///     amount: 2,
/// })
/// .await?;
///
/// let rows = repo.items(ItemQuery::all(ListVariant::Shopping)).await?;
/// assert_eq!(rows.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryRepository {
    inner: Arc<Inner>,
}

impl InMemoryRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(Data {
                    items: BTreeMap::new(),
                    groups: BTreeMap::new(),
                    trash: HashMap::new(),
                    sort_orders: HashMap::new(),
                    next_item: 1,
                    next_group: 1,
                    next_batch: 1,
                }),
                revision,
                failing: AtomicBool::new(false),
            }),
        }
    }

    /// Make every following operation fail with [`RepositoryError::Storage`]
    ///
    /// Live queries emit the error on their next revision.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
        self.bump();
    }

    /// Number of stored rows, including ones waiting in the trash
    pub async fn len(&self) -> usize {
        self.inner.data.read().await.items.len()
    }

    /// Whether no rows are stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of soft-delete batches not yet undone or committed
    pub async fn pending_batches(&self) -> usize {
        self.inner.data.read().await.trash.len()
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn check(&self) -> Result<()> {
        if self.inner.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Storage("backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    /// Run a write under the lock and notify live queries on success
    async fn write<T>(&self, f: impl FnOnce(&mut Data) -> Result<T>) -> Result<T> {
        self.check()?;
        let result = {
            let mut data = self.inner.data.write().await;
            f(&mut *data)?
        };
        self.bump();
        Ok(result)
    }

    async fn update_item(&self, id: ItemId, f: impl FnOnce(&mut ListItem)) -> Result<()> {
        self.write(|data| {
            let item = data.item_mut(id)?;
            f(item);
            Ok(())
        })
        .await
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRepository for InMemoryRepository {
    fn watch_items(&self, query: ItemQuery) -> RowStream {
        let inner = Arc::clone(&self.inner);
        let mut revisions = self.inner.revision.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                if inner.failing.load(Ordering::SeqCst) {
                    yield Err(RepositoryError::Storage("backend unavailable".to_string()));
                } else {
                    let rows = inner.data.read().await.query(&query);
                    yield Ok(rows);
                }
                if revisions.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn items(&self, query: ItemQuery) -> RepositoryFuture<'_, Vec<ListItem>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.inner.data.read().await.query(&query))
        })
    }

    fn item(&self, id: ItemId) -> RepositoryFuture<'_, ListItem> {
        Box::pin(async move {
            self.check()?;
            self.inner
                .data
                .read()
                .await
                .items
                .get(&id)
                .cloned()
                .ok_or(RepositoryError::ItemNotFound(id))
        })
    }

    fn add_item(&self, new: NewItem) -> RepositoryFuture<'_, ItemId> {
        Box::pin(self.write(move |data| {
            if !data.groups.contains_key(&new.group_id) {
                return Err(RepositoryError::GroupNotFound(new.group_id));
            }

            let existing = data
                .items
                .values()
                .find(|item| {
                    item.group_id == new.group_id
                        && !item.is_deleted()
                        && item.name.eq_ignore_ascii_case(&new.name)
                        && item.extra_info == new.extra_info
                })
                .map(|item| item.id);

            if let Some(id) = existing {
                let item = data.item_mut(id)?;
                let slot = item.amount_mut(new.variant);
                *slot = Some(slot.unwrap_or(0).saturating_add(new.amount));
                tracing::debug!(item = %id, variant = %new.variant, "Linked to existing item");
                return Ok(id);
            }

            let id = ItemId::new(data.next_item);
            data.next_item += 1;
            let mut item = ListItem::new(id, new.group_id, new.name);
            item.extra_info = new.extra_info;
            item.color = new.color;
            *item.amount_mut(new.variant) = Some(new.amount);
            data.items.insert(id, item);
            Ok(id)
        }))
    }

    fn set_name(&self, id: ItemId, name: String) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, move |item| item.name = name))
    }

    fn set_extra_info(&self, id: ItemId, extra_info: String) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, move |item| item.extra_info = extra_info))
    }

    fn set_color_group(&self, id: ItemId, color: ColorGroup) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, move |item| item.color = color))
    }

    fn set_amount(
        &self,
        id: ItemId,
        variant: ListVariant,
        amount: u32,
    ) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, move |item| {
            *item.amount_mut(variant) = Some(amount);
            if variant == ListVariant::Inventory {
                apply_auto_add(item);
            }
        }))
    }

    fn toggle_checked(&self, id: ItemId) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, |item| {
            if item.is_on(ListVariant::Shopping) {
                item.is_checked = !item.is_checked;
            }
        }))
    }

    fn toggle_auto_add(&self, id: ItemId) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, |item| {
            item.auto_add_to_shopping_list = !item.auto_add_to_shopping_list;
            apply_auto_add(item);
        }))
    }

    fn set_auto_add_threshold(&self, id: ItemId, threshold: u32) -> RepositoryFuture<'_, ()> {
        Box::pin(self.update_item(id, move |item| {
            item.auto_add_threshold = threshold;
            apply_auto_add(item);
        }))
    }

    fn soft_delete(
        &self,
        ids: Vec<ItemId>,
        variant: ListVariant,
    ) -> RepositoryFuture<'_, TrashBatch> {
        Box::pin(self.write(move |data| {
            let mut entries = Vec::with_capacity(ids.len());
            for id in ids {
                let Some(item) = data.items.get_mut(&id) else {
                    tracing::warn!(item = %id, "Soft delete of unknown item skipped");
                    continue;
                };
                if !item.is_on(variant) {
                    continue;
                }
                entries.push(TrashEntry {
                    id,
                    amount: item.amount(variant),
                    is_checked: item.is_checked,
                });
                *item.amount_mut(variant) = None;
                if variant == ListVariant::Shopping {
                    item.is_checked = false;
                }
            }

            let id = TrashBatchId::new(data.next_batch);
            data.next_batch += 1;
            let count = entries.len();
            data.trash.insert(id, Trash { variant, entries });
            Ok(TrashBatch { id, count })
        }))
    }

    fn undo_delete(&self, batch: TrashBatchId) -> RepositoryFuture<'_, usize> {
        Box::pin(self.write(move |data| {
            let trash = data
                .trash
                .remove(&batch)
                .ok_or(RepositoryError::NothingToUndo(batch))?;

            let mut restored = 0;
            for entry in trash.entries {
                if let Some(item) = data.items.get_mut(&entry.id) {
                    *item.amount_mut(trash.variant) = entry.amount;
                    item.is_checked = entry.is_checked;
                    restored += 1;
                }
            }
            Ok(restored)
        }))
    }

    fn empty_trash(&self, batch: TrashBatchId) -> RepositoryFuture<'_, usize> {
        Box::pin(self.write(move |data| {
            let trash = data
                .trash
                .remove(&batch)
                .ok_or(RepositoryError::NothingToUndo(batch))?;

            let mut purged = 0;
            for entry in trash.entries {
                let gone = data
                    .items
                    .get(&entry.id)
                    .is_some_and(ListItem::is_deleted);
                if gone && !data.is_trashed(entry.id) {
                    data.items.remove(&entry.id);
                    purged += 1;
                }
            }
            Ok(purged)
        }))
    }

    fn checkout(&self) -> RepositoryFuture<'_, usize> {
        Box::pin(self.write(|data| {
            let mut moved = 0;
            for item in data.items.values_mut() {
                let Some(bought) = item.shopping_list_amount else {
                    continue;
                };
                if !item.is_checked {
                    continue;
                }
                let stock = item.inventory_amount.unwrap_or(0);
                item.inventory_amount = Some(stock.saturating_add(bought));
                item.shopping_list_amount = None;
                item.is_checked = false;
                moved += 1;
            }
            Ok(moved)
        }))
    }

    fn clear_checked(&self) -> RepositoryFuture<'_, usize> {
        Box::pin(self.write(|data| {
            let mut cleared = 0;
            for item in data.items.values_mut().filter(|item| item.is_checked) {
                item.is_checked = false;
                cleared += 1;
            }
            Ok(cleared)
        }))
    }

    fn groups(&self) -> RepositoryFuture<'_, Vec<ItemGroup>> {
        Box::pin(async move {
            self.check()?;
            let data = self.inner.data.read().await;
            let groups = data
                .groups
                .values()
                .map(|group| {
                    let members = || data.items.values().filter(|item| item.group_id == group.id);
                    ItemGroup {
                        shopping_list_item_count: members()
                            .filter(|item| item.is_on(ListVariant::Shopping))
                            .count(),
                        inventory_item_count: members()
                            .filter(|item| item.is_on(ListVariant::Inventory))
                            .count(),
                        ..group.clone()
                    }
                })
                .collect();
            Ok(groups)
        })
    }

    fn add_group(&self, name: String) -> RepositoryFuture<'_, GroupId> {
        Box::pin(self.write(move |data| {
            let id = GroupId::new(data.next_group);
            data.next_group += 1;
            data.groups.insert(
                id,
                ItemGroup {
                    id,
                    name,
                    is_selected: true,
                    shopping_list_item_count: 0,
                    inventory_item_count: 0,
                },
            );
            Ok(id)
        }))
    }

    fn rename_group(&self, id: GroupId, name: String) -> RepositoryFuture<'_, ()> {
        Box::pin(self.write(move |data| {
            data.group_mut(id)?.name = name;
            Ok(())
        }))
    }

    fn set_group_selected(&self, id: GroupId, selected: bool) -> RepositoryFuture<'_, ()> {
        Box::pin(self.write(move |data| {
            data.group_mut(id)?.is_selected = selected;
            Ok(())
        }))
    }

    fn delete_group(&self, id: GroupId) -> RepositoryFuture<'_, ()> {
        Box::pin(self.write(move |data| {
            data.groups
                .remove(&id)
                .ok_or(RepositoryError::GroupNotFound(id))?;
            data.items.retain(|_, item| item.group_id != id);
            Ok(())
        }))
    }

    fn save_sort_order(&self, variant: ListVariant, order: SortOrder) -> RepositoryFuture<'_, ()> {
        Box::pin(self.write(move |data| {
            data.sort_orders.insert(variant, order);
            Ok(())
        }))
    }

    fn sort_order(&self, variant: ListVariant) -> RepositoryFuture<'_, Option<SortOrder>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.inner.data.read().await.sort_orders.get(&variant).copied())
        })
    }
}
