//! Structural row diff and rebind commands.
//!
//! Two consecutive [`Content`] snapshots are flattened into [`RowModel`]s and
//! compared by item id. For rows present in both, a [`ChangedFields`] record
//! says what to rebind; [`rebind`] turns it into view commands without
//! touching any UI.

use crate::snapshot::{Content, Snapshot};
use crate::types::{ColorGroup, ItemId, ListVariant};
use serde::Serialize;
use std::collections::HashMap;

/// Everything a row view displays
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowModel {
    /// Item identity
    pub id: ItemId,
    /// Name
    pub name: String,
    /// Detail line
    pub extra_info: String,
    /// Color category
    pub color: ColorGroup,
    /// Amount on the screen's list
    pub amount: Option<u32>,
    /// Checked (shopping list)
    pub checked: bool,
    /// Auto-add enabled (inventory)
    pub auto_add: bool,
    /// Auto-add threshold (inventory)
    pub auto_add_threshold: u32,
    /// Present on both lists
    pub linked: bool,
    /// Part of the multi-selection
    pub selected: bool,
    /// Expanded for editing
    pub expanded: bool,
    /// Showing its color picker
    pub color_picker_open: bool,
}

/// Flatten a snapshot into row models, in display order
#[must_use]
pub fn rows_of(snapshot: &Snapshot, variant: ListVariant) -> Vec<RowModel> {
    snapshot
        .content()
        .map(|content| content_rows(content, variant))
        .unwrap_or_default()
}

fn content_rows(content: &Content, variant: ListVariant) -> Vec<RowModel> {
    content
        .items
        .iter()
        .map(|item| RowModel {
            id: item.id,
            name: item.name.clone(),
            extra_info: item.extra_info.clone(),
            color: item.color,
            amount: item.amount(variant),
            checked: item.is_checked,
            auto_add: item.auto_add_to_shopping_list,
            auto_add_threshold: item.auto_add_threshold,
            linked: item.is_linked(),
            selected: content.selected.contains(&item.id),
            expanded: content.expanded == Some(item.id),
            color_picker_open: content.color_picker == Some(item.id),
        })
        .collect()
}

/// Which displayed fields of a row differ
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)] // One flag per rebindable field
pub struct ChangedFields {
    /// Name text
    pub name: bool,
    /// Detail text
    pub extra_info: bool,
    /// Color swatch
    pub color: bool,
    /// Amount stepper
    pub amount: bool,
    /// Checkbox
    pub checked: bool,
    /// Auto-add controls
    pub auto_add: bool,
    /// Linked badge
    pub linked: bool,
    /// Selection highlight
    pub selected: bool,
    /// Expanded layout
    pub expanded: bool,
    /// Color picker
    pub color_picker: bool,
}

impl ChangedFields {
    /// Every field, for a full bind
    pub const ALL: Self = Self {
        name: true,
        extra_info: true,
        color: true,
        amount: true,
        checked: true,
        auto_add: true,
        linked: true,
        selected: true,
        expanded: true,
        color_picker: true,
    };

    /// Compare two models of the same row
    #[must_use]
    pub fn between(old: &RowModel, new: &RowModel) -> Self {
        Self {
            name: old.name != new.name,
            extra_info: old.extra_info != new.extra_info,
            color: old.color != new.color,
            amount: old.amount != new.amount,
            checked: old.checked != new.checked,
            auto_add: old.auto_add != new.auto_add
                || old.auto_add_threshold != new.auto_add_threshold,
            linked: old.linked != new.linked,
            selected: old.selected != new.selected,
            expanded: old.expanded != new.expanded,
            color_picker: old.color_picker_open != new.color_picker_open,
        }
    }

    /// Nothing changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One structural difference between two row lists
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RowChange {
    /// Row appeared at `index` of the new list
    Inserted {
        /// Row identity
        id: ItemId,
        /// Position in the new list
        index: usize,
    },
    /// Row left; `index` is its position in the old list
    Removed {
        /// Row identity
        id: ItemId,
        /// Position in the old list
        index: usize,
    },
    /// Row changed its relative order
    Moved {
        /// Row identity
        id: ItemId,
        /// Position in the old list
        from: usize,
        /// Position in the new list
        to: usize,
    },
    /// Row content changed in place
    Changed {
        /// Row identity
        id: ItemId,
        /// Position in the new list
        index: usize,
        /// What to rebind
        changed: ChangedFields,
    },
}

/// Indices (into `seq`) of one longest strictly increasing subsequence
fn longest_increasing(seq: &[usize]) -> Vec<usize> {
    // tails[k]: index into seq of the smallest tail of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&t| seq[t] < value);
        parent[i] = slot.checked_sub(1).map(|prev| tails[prev]);
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(i);
        cursor = parent[i];
    }
    run.reverse();
    run
}

/// Diff two row lists keyed by item id
///
/// Removals come first (old order), then insertions and moves (new order),
/// then in-place changes. Rows kept in their relative order are never
/// reported as moved.
#[must_use]
pub fn diff_rows(old: &[RowModel], new: &[RowModel]) -> Vec<RowChange> {
    let old_index: HashMap<ItemId, usize> =
        old.iter().enumerate().map(|(i, row)| (row.id, i)).collect();
    let new_index: HashMap<ItemId, usize> =
        new.iter().enumerate().map(|(i, row)| (row.id, i)).collect();

    let mut changes = Vec::new();

    for (index, row) in old.iter().enumerate() {
        if !new_index.contains_key(&row.id) {
            changes.push(RowChange::Removed { id: row.id, index });
        }
    }

    // Old positions of surviving rows, in new order
    let survivors: Vec<(usize, usize)> = new
        .iter()
        .enumerate()
        .filter_map(|(to, row)| old_index.get(&row.id).map(|&from| (from, to)))
        .collect();
    let froms: Vec<usize> = survivors.iter().map(|&(from, _)| from).collect();
    let mut stays = vec![false; survivors.len()];
    for i in longest_increasing(&froms) {
        stays[i] = true;
    }

    let mut survivor = 0;
    for (index, row) in new.iter().enumerate() {
        if old_index.contains_key(&row.id) {
            let (from, to) = survivors[survivor];
            if !stays[survivor] {
                changes.push(RowChange::Moved { id: row.id, from, to });
            }
            survivor += 1;
        } else {
            changes.push(RowChange::Inserted { id: row.id, index });
        }
    }

    for (index, row) in new.iter().enumerate() {
        if let Some(&from) = old_index.get(&row.id) {
            let changed = ChangedFields::between(&old[from], row);
            if !changed.is_empty() {
                changes.push(RowChange::Changed {
                    id: row.id,
                    index,
                    changed,
                });
            }
        }
    }

    changes
}

/// Rows whose expansion flipped
///
/// These are the rows an expand/collapse animation has to run for.
#[must_use]
pub fn expansion_toggles(changes: &[RowChange]) -> Vec<ItemId> {
    changes
        .iter()
        .filter_map(|change| match change {
            RowChange::Changed { id, changed, .. } if changed.expanded => Some(*id),
            _ => None,
        })
        .collect()
}

/// A command for a bound row view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ViewUpdate {
    /// Name text
    SetName(String),
    /// Detail text; hidden when empty and collapsed
    SetExtraInfo {
        /// Text
        text: String,
        /// Whether the field is shown
        visible: bool,
    },
    /// Color swatch
    SetColor(ColorGroup),
    /// Amount stepper value
    SetAmount {
        /// New amount
        amount: Option<u32>,
        /// Direction for the stepper animation
        increased: bool,
    },
    /// Checkbox state
    SetChecked(bool),
    /// Auto-add controls
    SetAutoAdd {
        /// Enabled
        enabled: bool,
        /// Threshold
        threshold: u32,
    },
    /// Linked badge visibility
    SetLinkedBadge(bool),
    /// Selection highlight
    SetSelected(bool),
    /// Expanded layout
    SetExpanded(bool),
    /// Color picker visibility
    ShowColorPicker(bool),
}

/// Map changed fields of a row to view commands
///
/// `old` is the previously bound model; pass `new` again with
/// [`ChangedFields::ALL`] for a first bind.
#[must_use]
pub fn rebind(old: &RowModel, new: &RowModel, changed: &ChangedFields) -> Vec<ViewUpdate> {
    let mut updates = Vec::new();

    if changed.name {
        updates.push(ViewUpdate::SetName(new.name.clone()));
    }
    // Extra info visibility also depends on expansion
    if changed.extra_info || changed.expanded {
        updates.push(ViewUpdate::SetExtraInfo {
            text: new.extra_info.clone(),
            visible: new.expanded || !new.extra_info.is_empty(),
        });
    }
    if changed.color {
        updates.push(ViewUpdate::SetColor(new.color));
    }
    if changed.amount {
        updates.push(ViewUpdate::SetAmount {
            amount: new.amount,
            increased: new.amount > old.amount,
        });
    }
    if changed.checked {
        updates.push(ViewUpdate::SetChecked(new.checked));
    }
    if changed.auto_add {
        updates.push(ViewUpdate::SetAutoAdd {
            enabled: new.auto_add,
            threshold: new.auto_add_threshold,
        });
    }
    if changed.linked {
        updates.push(ViewUpdate::SetLinkedBadge(new.linked));
    }
    if changed.selected {
        updates.push(ViewUpdate::SetSelected(new.selected));
    }
    if changed.expanded {
        updates.push(ViewUpdate::SetExpanded(new.expanded));
    }
    if changed.color_picker {
        updates.push(ViewUpdate::ShowColorPicker(new.color_picker_open));
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: u64) -> RowModel {
        RowModel {
            id: ItemId::new(id),
            name: format!("item {id}"),
            extra_info: String::new(),
            color: ColorGroup::None,
            amount: Some(1),
            checked: false,
            auto_add: false,
            auto_add_threshold: 0,
            linked: false,
            selected: false,
            expanded: false,
            color_picker_open: false,
        }
    }

    fn models(ids: &[u64]) -> Vec<RowModel> {
        ids.iter().copied().map(model).collect()
    }

    #[test]
    fn identical_lists_have_no_changes() {
        assert!(diff_rows(&models(&[1, 2, 3]), &models(&[1, 2, 3])).is_empty());
    }

    #[test]
    fn insert_and_remove_by_id() {
        let changes = diff_rows(&models(&[1, 2, 3]), &models(&[1, 3, 4]));
        assert_eq!(
            changes,
            vec![
                RowChange::Removed {
                    id: ItemId::new(2),
                    index: 1
                },
                RowChange::Inserted {
                    id: ItemId::new(4),
                    index: 2
                },
            ]
        );
    }

    #[test]
    fn only_rows_out_of_order_are_moved() {
        let changes = diff_rows(&models(&[1, 2, 3, 4]), &models(&[4, 1, 2, 3]));
        assert_eq!(
            changes,
            vec![RowChange::Moved {
                id: ItemId::new(4),
                from: 3,
                to: 0
            }]
        );
    }

    #[test]
    fn expansion_change_is_reported_and_rebound() {
        let old = models(&[1, 2]);
        let mut new = old.clone();
        new[1].expanded = true;

        let changes = diff_rows(&old, &new);
        assert_eq!(expansion_toggles(&changes), vec![ItemId::new(2)]);

        let RowChange::Changed { changed, .. } = &changes[0] else {
            panic!("expected a change, got {changes:?}");
        };
        assert_eq!(
            rebind(&old[1], &new[1], changed),
            vec![
                ViewUpdate::SetExtraInfo {
                    text: String::new(),
                    visible: true
                },
                ViewUpdate::SetExpanded(true),
            ]
        );
    }

    #[test]
    fn amount_direction_follows_old_value() {
        let old = model(1);
        let mut new = old.clone();
        new.amount = Some(3);
        new.linked = true;

        let changed = ChangedFields::between(&old, &new);
        assert_eq!(
            rebind(&old, &new, &changed),
            vec![
                ViewUpdate::SetAmount {
                    amount: Some(3),
                    increased: true
                },
                ViewUpdate::SetLinkedBadge(true),
            ]
        );
    }

    #[test]
    fn first_bind_sets_everything() {
        let row = model(1);
        assert_eq!(rebind(&row, &row, &ChangedFields::ALL).len(), 10);
    }

    #[test]
    fn rows_of_non_content_is_empty() {
        assert!(rows_of(&Snapshot::Loading, ListVariant::Shopping).is_empty());
    }
}
