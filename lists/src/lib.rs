//! # Pantry Lists
//!
//! Reactive list state for the shopping-list and inventory screens.
//!
//! A screen is a [`Store`](pantry_runtime::Store) running the
//! [`ListReducer`]: a live query subscription feeds rows in, gestures feed
//! UI toggles and writes in, and every reduction publishes one coherent
//! [`Snapshot`].
//!
//! ```text
//! repository ──rows──▶ ListReducer ◀──gestures── ListViewModel
//!      ▲                   │
//!      └──── writes ───────┤
//!                          ▼
//!                 Snapshot ──▶ diff_rows / rebind ──▶ row views
//! ```
//!
//! ## Modules
//!
//! - [`types`]: items, groups, colors, list variants, sort orders
//! - [`query`]: query keys and the filtering/sorting they describe
//! - [`repository`]: the persistence boundary
//! - [`memory`]: in-memory repository with live queries
//! - [`ui_state`]: selection, expansion and color picker state
//! - [`snapshot`]: snapshot composition
//! - [`reducer`]: the list reducer and its actions
//! - [`view_model`]: gesture routing and the per-screen view-model
//! - [`diff`]: structural row diff and rebind commands

pub mod diff;
pub mod memory;
pub mod query;
pub mod reducer;
pub mod repository;
pub mod snapshot;
pub mod types;
pub mod ui_state;
pub mod view_model;

pub use diff::{ChangedFields, RowChange, RowModel, ViewUpdate, diff_rows, rebind};
pub use memory::InMemoryRepository;
pub use query::{ItemQuery, QueryFilters};
pub use reducer::{DeleteNotice, ListAction, ListEnvironment, ListReducer, ListState};
pub use repository::{ItemRepository, NewItem, RepositoryError, TrashBatchId};
pub use snapshot::{Content, EmptyReason, Snapshot};
pub use types::{ColorGroup, GroupId, ItemGroup, ItemId, ListItem, ListVariant, SortOrder};
pub use ui_state::UiState;
pub use view_model::{Gesture, ItemCallbacks, ListViewModel};
