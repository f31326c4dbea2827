//! Measured row geometry from one layout pass.

use crate::intent::{Child, ViewId};
use pantry_lists::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Geometry of one bound row view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowLayout {
    /// View identity
    pub view: ViewId,
    /// Item currently bound to the view
    pub item: ItemId,
    /// Index in the backing list
    pub position: usize,
    /// Top edge in list coordinates
    pub top: f32,
    /// Measured height
    pub height: f32,
    /// Children currently shown
    pub children: BTreeSet<Child>,
    /// Width of the name field
    pub name_width: f32,
    /// Right edge of the name field
    pub name_right: f32,
    /// Whether the row holds input focus
    pub focused: bool,
}

impl RowLayout {
    /// Whether `child` is shown
    #[must_use]
    pub fn shows(&self, child: Child) -> bool {
        self.children.contains(&child)
    }
}

/// Every bound row of one layout pass
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPass {
    rows: Vec<RowLayout>,
}

impl LayoutPass {
    /// Collect rows, ordered by backing-list position
    #[must_use]
    pub fn new(mut rows: Vec<RowLayout>) -> Self {
        rows.sort_by_key(|row| row.position);
        Self { rows }
    }

    /// Rows in backing-list order
    #[must_use]
    pub fn rows(&self) -> &[RowLayout] {
        &self.rows
    }

    /// Row bound to `view`
    #[must_use]
    pub fn row(&self, view: ViewId) -> Option<&RowLayout> {
        self.rows.iter().find(|row| row.view == view)
    }

    /// Row showing `item`
    #[must_use]
    pub fn row_for(&self, item: ItemId) -> Option<&RowLayout> {
        self.rows.iter().find(|row| row.item == item)
    }

    /// Total height of all rows
    #[must_use]
    pub fn content_height(&self) -> f32 {
        self.rows.iter().map(|row| row.height).sum()
    }
}
