//! Domain types for shopping-list and inventory items.
//!
//! A single [`ListItem`] row carries both its shopping-list amount and its
//! inventory amount. An absent amount (`None`) is the store's "-1, not on
//! this list" marker; a row absent from both lists is logically deleted.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier of a list item
///
/// Allocated by the store, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    /// Creates an `ItemId` from its raw value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Identifier of an item group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(u64);

impl GroupId {
    /// Creates a `GroupId` from its raw value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// Fixed color palette used to categorise items
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorGroup {
    /// No color assigned
    #[default]
    None,
    /// Red
    Red,
    /// Orange
    Orange,
    /// Yellow
    Yellow,
    /// Green
    Green,
    /// Blue
    Blue,
    /// Purple
    Purple,
    /// Pink
    Pink,
}

impl ColorGroup {
    /// Every palette entry in display order
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
        Self::Pink,
    ];
}

/// Which of the two lists a screen shows
///
/// Drives the amount a row displays and which controls it offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListVariant {
    /// Shopping list: amounts to buy, checkboxes, checkout
    Shopping,
    /// Inventory: amounts at hand, auto-add thresholds
    Inventory,
}

impl ListVariant {
    /// The other list
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Shopping => Self::Inventory,
            Self::Inventory => Self::Shopping,
        }
    }
}

impl std::fmt::Display for ListVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shopping => f.write_str("shopping list"),
            Self::Inventory => f.write_str("inventory"),
        }
    }
}

/// Sort order of a list screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// By color group, then name
    #[default]
    Color,
    /// By name, A to Z
    NameAsc,
    /// By name, Z to A
    NameDesc,
    /// By the list's amount, smallest first
    AmountAsc,
    /// By the list's amount, largest first
    AmountDesc,
}

/// Unknown sort order name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort order: {0}")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "color" => Ok(Self::Color),
            "name_asc" | "name" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            "amount_asc" | "amount" => Ok(Self::AmountAsc),
            "amount_desc" => Ok(Self::AmountDesc),
            other => Err(ParseSortOrderError(other.to_string())),
        }
    }
}

/// A single shopping-list and/or inventory entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Stable identifier
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Free-form detail shown under the name
    pub extra_info: String,
    /// Color category
    pub color: ColorGroup,
    /// Amount on the shopping list, `None` when not on it
    pub shopping_list_amount: Option<u32>,
    /// Amount in the inventory, `None` when not in it
    pub inventory_amount: Option<u32>,
    /// Checked off on the shopping list
    pub is_checked: bool,
    /// Re-add to the shopping list when the inventory runs low
    pub auto_add_to_shopping_list: bool,
    /// Inventory amount at or below which the item is re-added
    pub auto_add_threshold: u32,
    /// Owning group
    pub group_id: GroupId,
}

impl ListItem {
    /// Creates an item present in neither list yet
    #[must_use]
    pub fn new(id: ItemId, group_id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra_info: String::new(),
            color: ColorGroup::None,
            shopping_list_amount: None,
            inventory_amount: None,
            is_checked: false,
            auto_add_to_shopping_list: false,
            auto_add_threshold: 0,
            group_id,
        }
    }

    /// Amount on the given list
    #[must_use]
    pub const fn amount(&self, variant: ListVariant) -> Option<u32> {
        match variant {
            ListVariant::Shopping => self.shopping_list_amount,
            ListVariant::Inventory => self.inventory_amount,
        }
    }

    /// Mutable amount slot of the given list
    pub const fn amount_mut(&mut self, variant: ListVariant) -> &mut Option<u32> {
        match variant {
            ListVariant::Shopping => &mut self.shopping_list_amount,
            ListVariant::Inventory => &mut self.inventory_amount,
        }
    }

    /// Whether the item appears on the given list
    #[must_use]
    pub const fn is_on(&self, variant: ListVariant) -> bool {
        self.amount(variant).is_some()
    }

    /// Present on both lists at once
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.shopping_list_amount.is_some() && self.inventory_amount.is_some()
    }

    /// Present on neither list
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.shopping_list_amount.is_none() && self.inventory_amount.is_none()
    }
}

/// A named shopping context
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    /// Identifier
    pub id: GroupId,
    /// Display name
    pub name: String,
    /// Items of selected groups are visible
    pub is_selected: bool,
    /// Items of this group on the shopping list
    pub shopping_list_item_count: usize,
    /// Items of this group in the inventory
    pub inventory_item_count: usize,
}
