//! Query keys and the pure filtering/sorting they describe.
//!
//! A list screen subscribes with an [`ItemQuery`]; whenever any component
//! of the key changes the subscription is replaced.

use crate::types::{ListItem, ListVariant, SortOrder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Extra boolean filters a screen can apply on top of the search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFilters {
    /// Only checked shopping-list items
    pub only_checked: bool,
    /// Only items present on both lists
    pub only_linked: bool,
    /// Only inventory items with auto-add enabled
    pub only_auto_add: bool,
}

/// Complete key of a list query subscription
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemQuery {
    /// List the rows belong to
    pub variant: ListVariant,
    /// Row order
    pub sort_order: SortOrder,
    /// Case-insensitive substring over name and extra info
    pub search: Option<String>,
    /// Extra filters
    pub filters: QueryFilters,
}

impl ItemQuery {
    /// Query for every row of a list in default order
    #[must_use]
    pub fn all(variant: ListVariant) -> Self {
        Self {
            variant,
            sort_order: SortOrder::default(),
            search: None,
            filters: QueryFilters::default(),
        }
    }

    /// Whether `item` belongs to the result set
    ///
    /// Group visibility is resolved by the store, not here.
    #[must_use]
    pub fn matches(&self, item: &ListItem) -> bool {
        if !item.is_on(self.variant) {
            return false;
        }
        if self.filters.only_checked && !item.is_checked {
            return false;
        }
        if self.filters.only_linked && !item.is_linked() {
            return false;
        }
        if self.filters.only_auto_add && !item.auto_add_to_shopping_list {
            return false;
        }
        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                item.name.to_lowercase().contains(&needle)
                    || item.extra_info.to_lowercase().contains(&needle)
            },
            None => true,
        }
    }

    /// Filter and order `items`
    #[must_use]
    pub fn apply<'a>(&self, items: impl IntoIterator<Item = &'a ListItem>) -> Vec<ListItem> {
        let mut rows: Vec<ListItem> = items
            .into_iter()
            .filter(|item| self.matches(item))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare(self.sort_order, self.variant, a, b));
        rows
    }
}

/// Blank searches mean "no search"
#[must_use]
pub fn normalize_search(search: Option<String>) -> Option<String> {
    search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn by_name(a: &ListItem, b: &ListItem) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.extra_info.cmp(&b.extra_info))
}

/// Total order for rows; ties fall back to the item id so emissions are stable
fn compare(order: SortOrder, variant: ListVariant, a: &ListItem, b: &ListItem) -> Ordering {
    let primary = match order {
        SortOrder::Color => a.color.cmp(&b.color).then_with(|| by_name(a, b)),
        SortOrder::NameAsc => by_name(a, b),
        SortOrder::NameDesc => by_name(b, a),
        SortOrder::AmountAsc => a.amount(variant).cmp(&b.amount(variant)).then_with(|| by_name(a, b)),
        SortOrder::AmountDesc => b.amount(variant).cmp(&a.amount(variant)).then_with(|| by_name(a, b)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorGroup, GroupId, ItemId};

    fn item(id: u64, name: &str, shopping: Option<u32>, inventory: Option<u32>) -> ListItem {
        let mut item = ListItem::new(ItemId::new(id), GroupId::new(1), name);
        item.shopping_list_amount = shopping;
        item.inventory_amount = inventory;
        item
    }

    fn names(rows: &[ListItem]) -> Vec<&str> {
        rows.iter().map(|row| row.name.as_str()).collect()
    }

    #[test]
    fn only_rows_on_the_variant_match() {
        let rows = [
            item(1, "Milk", Some(1), None),
            item(2, "Eggs", None, Some(6)),
            item(3, "Bread", Some(2), Some(1)),
        ];

        let shopping = ItemQuery::all(ListVariant::Shopping).apply(&rows);
        let inventory = ItemQuery::all(ListVariant::Inventory).apply(&rows);

        assert_eq!(names(&shopping), vec!["Bread", "Milk"]);
        assert_eq!(names(&inventory), vec!["Bread", "Eggs"]);
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_extra_info() {
        let mut oat = item(1, "Oat drink", Some(1), None);
        oat.extra_info = "instead of MILK".to_string();
        let rows = [oat, item(2, "Milk", Some(1), None), item(3, "Tea", Some(1), None)];

        let mut query = ItemQuery::all(ListVariant::Shopping);
        query.search = Some("milk".to_string());

        assert_eq!(names(&query.apply(&rows)), vec!["Milk", "Oat drink"]);
    }

    #[test]
    fn sort_orders() {
        let mut tea = item(1, "tea", Some(5), None);
        tea.color = ColorGroup::Red;
        let mut apples = item(2, "Apples", Some(1), None);
        apples.color = ColorGroup::Blue;
        let rows = [tea, apples, item(3, "coffee", Some(3), None)];

        let mut query = ItemQuery::all(ListVariant::Shopping);
        assert_eq!(names(&query.apply(&rows)), vec!["coffee", "tea", "Apples"]);

        query.sort_order = SortOrder::NameAsc;
        assert_eq!(names(&query.apply(&rows)), vec!["Apples", "coffee", "tea"]);

        query.sort_order = SortOrder::NameDesc;
        assert_eq!(names(&query.apply(&rows)), vec!["tea", "coffee", "Apples"]);

        query.sort_order = SortOrder::AmountDesc;
        assert_eq!(names(&query.apply(&rows)), vec!["tea", "coffee", "Apples"]);

        query.sort_order = SortOrder::AmountAsc;
        assert_eq!(names(&query.apply(&rows)), vec!["Apples", "coffee", "tea"]);
    }

    #[test]
    fn filters_narrow_results() {
        let mut checked = item(1, "Milk", Some(1), Some(1));
        checked.is_checked = true;
        let rows = [checked, item(2, "Eggs", Some(1), None)];

        let mut query = ItemQuery::all(ListVariant::Shopping);
        query.filters.only_checked = true;
        assert_eq!(names(&query.apply(&rows)), vec!["Milk"]);

        query.filters = QueryFilters {
            only_linked: true,
            ..QueryFilters::default()
        };
        assert_eq!(names(&query.apply(&rows)), vec!["Milk"]);
    }

    #[test]
    fn blank_search_is_no_search() {
        assert_eq!(normalize_search(Some("   ".to_string())), None);
        assert_eq!(normalize_search(Some(" milk ".to_string())), Some("milk".to_string()));
        assert_eq!(normalize_search(None), None);
    }
}
