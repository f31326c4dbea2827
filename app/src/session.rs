//! Scripted demo session.
//!
//! Opens a shopping-list and an inventory screen over one in-memory store,
//! then plays a short script through the same callbacks a rendering surface
//! would use: expand a row, press edit again while it animates, swipe and
//! undo, check an item off and check out.

use crate::adapter::{Bind, RowAdapter};
use crate::config::Config;
use futures::{FutureExt, Stream, StreamExt};
use pantry_core::environment::SystemClock;
use pantry_lists::repository::RepositoryError;
use pantry_lists::{
    ColorGroup, DeleteNotice, GroupId, InMemoryRepository, ItemCallbacks, ItemId, ItemRepository,
    ListAction, ListEnvironment, ListState, ListVariant, ListViewModel, NewItem, Snapshot,
};
use pantry_motion::Press;
use pantry_runtime::StoreError;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Time between animation frames
pub const FRAME: Duration = Duration::from_millis(16);

/// How long to wait for a snapshot before giving up
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors that end a session early
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Store rejected an action
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Seeding failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// A screen never reached the expected state
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    /// A screen's snapshot stream ended
    #[error("snapshot stream of the {0} screen ended")]
    Closed(ListVariant),
}

/// What the session did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Animation frames rendered
    pub frames: usize,
    /// Queued edit presses replayed after an animation
    pub replayed: usize,
    /// A swiped row came back through undo
    pub undone: bool,
    /// Items moved into the inventory by checkout
    pub checked_out: usize,
    /// Rows left on the shopping list
    pub shopping_rows: usize,
    /// Rows in the inventory
    pub inventory_rows: usize,
}

/// Fill the store with a small household
///
/// # Errors
///
/// Propagates repository failures.
pub async fn seed(repo: &dyn ItemRepository) -> Result<GroupId, RepositoryError> {
    let home = repo.add_group("Home".to_string()).await?;
    let entries = [
        ("Milk", "1.5%", ColorGroup::Blue, ListVariant::Shopping, 2),
        ("Apples", "", ColorGroup::Green, ListVariant::Shopping, 6),
        ("Coffee beans", "whole", ColorGroup::Orange, ListVariant::Shopping, 1),
        ("Eggs", "", ColorGroup::Yellow, ListVariant::Shopping, 12),
        ("Eggs", "", ColorGroup::Yellow, ListVariant::Inventory, 4),
        ("Rice", "basmati", ColorGroup::None, ListVariant::Inventory, 3),
        ("Olive oil", "", ColorGroup::Green, ListVariant::Inventory, 1),
    ];
    for (name, extra_info, color, variant, amount) in entries {
        repo.add_item(NewItem {
            group_id: home,
            name: name.to_string(),
            extra_info: extra_info.to_string(),
            color,
            variant,
            amount,
        })
        .await?;
    }
    tracing::info!(group = %home.get(), "Seeded demo items");
    Ok(home)
}

/// One open list screen: view-model, bound rows and their snapshot feed
pub struct Screen {
    vm: ListViewModel,
    adapter: RowAdapter,
    snapshots: Pin<Box<dyn Stream<Item = Snapshot> + Send>>,
    frames: usize,
    replayed: usize,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("variant", &self.vm.variant())
            .field("rows", &self.adapter.rows().len())
            .finish_non_exhaustive()
    }
}

impl Screen {
    /// Open a screen and start its live query
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the store is shutting down.
    pub async fn open(
        variant: ListVariant,
        config: &Config,
        env: ListEnvironment,
    ) -> Result<Self, SessionError> {
        let state = ListState::new(variant).with_sort_order(config.default_sort);
        let vm = ListViewModel::new(state, env);
        let snapshots = Box::pin(vm.snapshots());
        vm.start().await?;
        Ok(Self {
            vm,
            adapter: RowAdapter::new(variant, config.animation),
            snapshots,
            frames: 0,
            replayed: 0,
        })
    }

    /// The screen's view-model
    #[must_use]
    pub const fn vm(&self) -> &ListViewModel {
        &self.vm
    }

    /// The screen's bound rows
    #[must_use]
    pub const fn adapter(&self) -> &RowAdapter {
        &self.adapter
    }

    fn bind(&mut self, snapshot: &Snapshot) -> Bind {
        let bind = self.adapter.bind(snapshot, Instant::now().into_std());
        for command in &bind.commands {
            tracing::debug!(?command, "Host command");
        }
        bind
    }

    /// Bind snapshots until one satisfies `done`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Timeout`] naming `what` if no such snapshot
    /// arrives in time.
    pub async fn settle(
        &mut self,
        what: &'static str,
        done: impl Fn(&Snapshot) -> bool,
    ) -> Result<Snapshot, SessionError> {
        let variant = self.vm.variant();
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        loop {
            let snapshot = tokio::time::timeout_at(deadline, self.snapshots.next())
                .await
                .map_err(|_| SessionError::Timeout(what))?
                .ok_or(SessionError::Closed(variant))?;
            self.bind(&snapshot);
            if done(&snapshot) {
                return Ok(snapshot);
            }
        }
    }

    /// Bind whatever snapshots are already waiting
    fn drain(&mut self) {
        loop {
            let next = self.snapshots.next().now_or_never();
            let Some(Some(snapshot)) = next else {
                break;
            };
            self.bind(&snapshot);
        }
    }

    /// Wait for the delete notice of a swipe
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Timeout`] if no notice is raised in time.
    pub async fn notice(&self) -> Result<DeleteNotice, SessionError> {
        let mut states = self.vm.store().subscribe_state();
        let state = tokio::time::timeout(
            SETTLE_TIMEOUT,
            states.wait_for(|state| state.notice.is_some()),
        )
        .await
        .map_err(|_| SessionError::Timeout("delete notice"))?
        .map_err(|_| SessionError::Closed(self.vm.variant()))?;
        state
            .notice
            .clone()
            .ok_or(SessionError::Timeout("delete notice"))
    }

    /// Press the edit button of `item` through the replay gate
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the store is shutting down.
    pub async fn press_edit(&mut self, item: ItemId) -> Result<Press, SessionError> {
        let press = self.adapter.edit_pressed(item, Instant::now().into_std());
        if press == Press::Execute {
            self.vm.on_edit_button(item).await?;
            self.drain();
        } else {
            tracing::info!(%item, "Edit press queued while animating");
        }
        Ok(press)
    }

    /// Render one frame, replaying queued presses that are due
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the store is shutting down.
    pub async fn frame(&mut self) -> Result<(), SessionError> {
        tokio::time::sleep(FRAME).await;
        self.drain();
        let tick = self.adapter.tick(Instant::now().into_std());
        self.frames += 1;
        for item in tick.replays {
            tracing::info!(%item, "Replaying queued edit press");
            self.replayed += 1;
            self.vm.on_edit_button(item).await?;
            self.drain();
        }
        Ok(())
    }

    /// Render frames until nothing moves
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the store is shutting down.
    pub async fn run_animations(&mut self) -> Result<(), SessionError> {
        while self.adapter.is_animating() {
            self.frame().await?;
        }
        Ok(())
    }
}

fn shows(snapshot: &Snapshot, item: ItemId) -> bool {
    snapshot
        .content()
        .is_some_and(|content| content.contains(item))
}

/// Play the demo script
///
/// # Errors
///
/// Returns a [`SessionError`] if seeding fails, a store shuts down early, or
/// a screen never reaches an expected state.
pub async fn run(config: &Config) -> Result<SessionReport, SessionError> {
    let repo = InMemoryRepository::new();
    if config.seed_demo {
        seed(&repo).await?;
    }

    let env = ListEnvironment::new(Arc::new(repo.clone()), Arc::new(SystemClock), config.undo_window);
    let mut shopping = Screen::open(ListVariant::Shopping, config, env.clone()).await?;
    let mut inventory = Screen::open(ListVariant::Inventory, config, env).await?;

    let first = shopping
        .settle("shopping rows", |snapshot| *snapshot != Snapshot::Loading)
        .await?;
    inventory
        .settle("inventory rows", |snapshot| *snapshot != Snapshot::Loading)
        .await?;

    let mut report = SessionReport::default();
    let Some(content) = first.content() else {
        tracing::info!("Nothing on the shopping list");
        return Ok(report);
    };
    let rows: Vec<ItemId> = content.items.iter().map(|item| item.id).collect();
    tracing::info!(rows = rows.len(), "Shopping list loaded");

    // Expand, then press again late enough in the animation to be replayed
    let expand = content
        .items
        .iter()
        .find(|item| item.is_linked())
        .map(|item| item.id)
        .or_else(|| rows.first().copied());
    if let Some(row) = expand {
        shopping.press_edit(row).await?;
        let late = config.animation.duration * 2 / 3;
        let started = Instant::now();
        while started.elapsed() <= late && shopping.adapter.is_animating() {
            shopping.frame().await?;
        }
        shopping.press_edit(row).await?;
        shopping.run_animations().await?;
        tracing::info!(%row, "Expand and collapse finished");
    }

    // Swipe away, then take it back
    if let Some(&row) = rows.get(1) {
        shopping.vm.on_swipe(row).await?;
        let notice = shopping.notice().await?;
        tracing::info!(message = %notice.message(), "Delete notice shown");
        shopping.vm.send(ListAction::Undo).await?;
        shopping
            .settle("undo", |snapshot| shows(snapshot, row))
            .await?;
        report.undone = true;
        tracing::info!(%row, "Delete undone");
    }

    // Check off the last row and check out
    if let Some(&row) = rows.last() {
        shopping.vm.on_checkbox(row).await?;
        shopping
            .settle("check", |snapshot| {
                snapshot.content().is_some_and(|content| {
                    content
                        .items
                        .iter()
                        .any(|item| item.id == row && item.is_checked)
                })
            })
            .await?;
        shopping.vm.send(ListAction::Checkout).await?;
        shopping
            .settle("checkout", |snapshot| !shows(snapshot, row))
            .await?;
        inventory
            .settle("restock", |snapshot| shows(snapshot, row))
            .await?;
        report.checked_out = 1;
        tracing::info!(%row, "Checked out");
    }

    shopping.run_animations().await?;
    report.frames = shopping.frames + inventory.frames;
    report.replayed = shopping.replayed + inventory.replayed;
    report.shopping_rows = shopping.adapter.rows().len();
    report.inventory_rows = inventory.adapter.rows().len();

    for screen in [&shopping, &inventory] {
        if let Err(error) = screen.vm.store().shutdown_default().await {
            tracing::warn!(%error, variant = %screen.vm.variant(), "Screen did not shut down cleanly");
        }
    }

    Ok(report)
}
