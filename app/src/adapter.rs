//! Row adapter: binds snapshots to row views and animates expansion.
//!
//! The adapter stands in for a recycling list view. Every snapshot is
//! flattened into row models and diffed against the bound rows; inserted
//! rows get a view, removed rows give theirs back (abandoning any animation
//! on it), and changed rows get rebind commands. When a row's expansion
//! flips, the adapter measures the rows before and after and hands the two
//! layout passes to the animator.

use pantry_lists::diff::{expansion_toggles, rows_of};
use pantry_lists::{
    ChangedFields, ItemId, ListVariant, RowChange, RowModel, Snapshot, ViewUpdate, diff_rows,
    rebind,
};
use pantry_motion::{
    AnimationConfig, Child, Completion, EditButtonGate, ExpandCollapseAnimator, Frame,
    FrameValue, HostCommand, LayoutPass, Press, RowLayout, ViewId, plan,
};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

/// Height of a collapsed row
pub const ROW_HEIGHT: f32 = 56.0;
/// Height of the detail line
pub const EXTRA_INFO_HEIGHT: f32 = 24.0;
/// Height of the auto-add controls
pub const AUTO_ADD_HEIGHT: f32 = 48.0;
/// Height of the linked badge
pub const LINKED_BADGE_HEIGHT: f32 = 20.0;
/// Name field width next to the collapsed stepper
pub const NAME_WIDTH: f32 = 240.0;
/// Name field width next to the expanded stepper
pub const NAME_WIDTH_EXPANDED: f32 = 192.0;
/// Left inset of the name field
const NAME_LEFT: f32 = 16.0;

/// Result of binding one snapshot
#[derive(Debug, Default)]
pub struct Bind {
    /// Structural changes against the previous rows
    pub changes: Vec<RowChange>,
    /// View commands per row
    pub updates: Vec<(ItemId, Vec<ViewUpdate>)>,
    /// Start values of the animation this bind started
    pub latched: Vec<FrameValue>,
    /// Focus and keyboard commands
    pub commands: Vec<HostCommand>,
}

/// Result of one animation frame
#[derive(Debug, Default)]
pub struct Tick {
    /// Interpolated values
    pub frame: Frame,
    /// Rows whose queued edit press should now be executed
    pub replays: Vec<ItemId>,
}

/// Binds one list screen's snapshots to row views
#[derive(Debug)]
pub struct RowAdapter {
    variant: ListVariant,
    rows: Vec<RowModel>,
    views: HashMap<ItemId, ViewId>,
    next_view: u64,
    focused: Option<ItemId>,
    animator: ExpandCollapseAnimator,
    gate: EditButtonGate,
}

impl RowAdapter {
    /// Create an adapter with no rows bound
    #[must_use]
    pub fn new(variant: ListVariant, animation: AnimationConfig) -> Self {
        Self {
            variant,
            rows: Vec::new(),
            views: HashMap::new(),
            next_view: 1,
            focused: None,
            animator: ExpandCollapseAnimator::new(animation),
            gate: EditButtonGate::new(&animation),
        }
    }

    /// Bound rows in display order
    #[must_use]
    pub fn rows(&self) -> &[RowModel] {
        &self.rows
    }

    /// View bound to `item`
    #[must_use]
    pub fn view_of(&self, item: ItemId) -> Option<ViewId> {
        self.views.get(&item).copied()
    }

    /// Row holding input focus
    #[must_use]
    pub const fn focused(&self) -> Option<ItemId> {
        self.focused
    }

    /// Give input focus to a row, or clear it
    pub fn focus(&mut self, item: Option<ItemId>) {
        self.focused = item;
    }

    /// Current geometry of the bound rows
    #[must_use]
    pub fn layout(&self) -> LayoutPass {
        self.measure(&self.rows)
    }

    fn measure(&self, rows: &[RowModel]) -> LayoutPass {
        let mut top = 0.0;
        let layouts = rows
            .iter()
            .enumerate()
            .filter_map(|(position, row)| {
                let view = self.view_of(row.id)?;
                let layout = self.measure_row(view, position, top, row);
                top += layout.height;
                Some(layout)
            })
            .collect();
        LayoutPass::new(layouts)
    }

    fn measure_row(&self, view: ViewId, position: usize, top: f32, row: &RowModel) -> RowLayout {
        let mut children = BTreeSet::from([Child::NameField]);
        let mut height = ROW_HEIGHT;

        if row.amount.is_some() {
            children.insert(Child::AmountStepper);
        }
        if row.expanded || !row.extra_info.is_empty() {
            children.insert(Child::ExtraInfo);
            height += EXTRA_INFO_HEIGHT;
        }
        if row.expanded && self.variant == ListVariant::Inventory {
            children.insert(Child::AutoAddControls);
            height += AUTO_ADD_HEIGHT;
        }
        // The badge is part of the expanded layout only
        if row.expanded && row.linked {
            children.insert(Child::LinkedBadge);
            height += LINKED_BADGE_HEIGHT;
        }

        let name_width = if row.expanded {
            NAME_WIDTH_EXPANDED
        } else {
            NAME_WIDTH
        };

        RowLayout {
            view,
            item: row.id,
            position,
            top,
            height,
            children,
            name_width,
            name_right: NAME_LEFT + name_width,
            focused: self.focused == Some(row.id),
        }
    }

    /// Bind a new snapshot at `now`
    pub fn bind(&mut self, snapshot: &Snapshot, now: Instant) -> Bind {
        let rows = rows_of(snapshot, self.variant);
        let changes = diff_rows(&self.rows, &rows);
        let pre = self.layout();
        let mut bind = Bind::default();

        let mut removed = Vec::new();
        {
            let old: HashMap<ItemId, &RowModel> = self.rows.iter().map(|row| (row.id, row)).collect();
            let new: HashMap<ItemId, &RowModel> = rows.iter().map(|row| (row.id, row)).collect();

            for change in &changes {
                match *change {
                    RowChange::Removed { id, .. } => removed.push(id),
                    RowChange::Inserted { id, .. } => {
                        self.views.insert(id, ViewId::new(self.next_view));
                        self.next_view += 1;
                        if let Some(row) = new.get(&id) {
                            bind.updates.push((id, rebind(row, row, &ChangedFields::ALL)));
                        }
                    },
                    RowChange::Changed { id, changed, .. } => {
                        if let (Some(before), Some(after)) = (old.get(&id), new.get(&id)) {
                            bind.updates.push((id, rebind(before, after, &changed)));
                        }
                    },
                    RowChange::Moved { .. } => {},
                }
            }
        }

        let toggled = !expansion_toggles(&changes).is_empty();
        self.rows = rows;
        for id in removed {
            self.unbind(id);
        }

        if toggled {
            let plan = plan(&pre, &self.layout());
            for command in &plan.commands {
                if let HostCommand::ClearFocus(view) = *command {
                    if self.focused.and_then(|item| self.view_of(item)) == Some(view) {
                        self.focused = None;
                    }
                }
            }
            bind.commands.clone_from(&plan.commands);
            bind.latched = self.animator.prepare(plan);
            self.animator.start(now);
        }

        bind.changes = changes;
        bind
    }

    fn unbind(&mut self, item: ItemId) {
        if self.focused == Some(item) {
            self.focused = None;
        }
        if let Some(view) = self.views.remove(&item) {
            if let Some(abandoned) = self.animator.recycle(view) {
                self.gate.abandon(abandoned);
            }
        }
    }

    /// Route an edit-button press through the replay gate
    ///
    /// [`Press::Execute`] means the caller should toggle the row now.
    /// Presses on rows that are not bound are never queued.
    pub fn edit_pressed(&mut self, item: ItemId, now: Instant) -> Press {
        let Some(position) = self.rows.iter().position(|row| row.id == item) else {
            return Press::Execute;
        };
        let animating = self.animator.is_item_animating(item);
        self.gate.press(item, position, now, animating)
    }

    /// Advance animations to `now`
    pub fn tick(&mut self, now: Instant) -> Tick {
        let frame = self.animator.tick(now);
        let replays = frame
            .finished
            .iter()
            .filter_map(|&item| self.gate.complete(item, now))
            .map(|press| press.item)
            .collect();
        Tick { frame, replays }
    }

    /// Future resolving when `item` stops animating
    pub fn completion(&mut self, item: ItemId) -> Completion {
        self.animator.completion(item)
    }

    /// Right edge the name field of `item` keeps mid-animation
    #[must_use]
    pub fn locked_right_edge(&self, item: ItemId) -> Option<f32> {
        self.view_of(item)
            .and_then(|view| self.animator.locked_right_edge(view))
    }

    /// Whether any row is still moving
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.animator.is_idle()
    }

    /// Whether an edit press is waiting on `item`
    #[must_use]
    pub fn has_queued_press(&self, item: ItemId) -> bool {
        self.gate.is_queued(item)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pantry_lists::{Content, GroupId, ListItem};
    use pantry_motion::{Outcome, Property, Target};
    use std::collections::HashSet;
    use std::time::Duration;

    const D: Duration = Duration::from_millis(300);

    fn item(id: u64, name: &str) -> ListItem {
        let mut item = ListItem::new(ItemId::new(id), GroupId::new(1), name);
        item.shopping_list_amount = Some(1);
        item
    }

    fn snapshot(items: &[ListItem], expanded: Option<u64>) -> Snapshot {
        Snapshot::Content(Content {
            items: items.to_vec(),
            selected: HashSet::new(),
            expanded: expanded.map(ItemId::new),
            color_picker: None,
        })
    }

    fn adapter() -> RowAdapter {
        RowAdapter::new(
            ListVariant::Shopping,
            AnimationConfig::new(D, pantry_motion::Interpolator::Linear),
        )
    }

    fn items() -> Vec<ListItem> {
        vec![item(1, "Apples"), item(2, "Bread"), item(3, "Coffee")]
    }

    #[test]
    fn first_bind_assigns_views_without_animating() {
        let mut adapter = adapter();
        let bind = adapter.bind(&snapshot(&items(), None), Instant::now());

        assert_eq!(bind.changes.len(), 3);
        assert_eq!(bind.updates.len(), 3);
        assert!(bind.latched.is_empty());
        assert!(!adapter.is_animating());
        assert_eq!(adapter.view_of(ItemId::new(2)), Some(ViewId::new(2)));
    }

    #[test]
    fn expanding_a_row_animates_it_and_the_rows_below() {
        let mut adapter = adapter();
        let t0 = Instant::now();
        adapter.bind(&snapshot(&items(), None), t0);

        let bind = adapter.bind(&snapshot(&items(), Some(2)), t0);

        let bread = ViewId::new(2);
        assert!(bind.latched.contains(&FrameValue {
            target: Target::Row(bread),
            property: Property::Height,
            value: ROW_HEIGHT,
        }));
        assert!(bind.latched.contains(&FrameValue {
            target: Target::Row(ViewId::new(3)),
            property: Property::TranslationY,
            value: -EXTRA_INFO_HEIGHT,
        }));
        assert_eq!(
            adapter.locked_right_edge(ItemId::new(2)),
            Some(NAME_LEFT + NAME_WIDTH)
        );

        let tick = adapter.tick(t0 + D);
        assert_eq!(tick.frame.finished, vec![ItemId::new(2)]);
        assert!(!adapter.is_animating());
        assert_eq!(adapter.locked_right_edge(ItemId::new(2)), None);
    }

    #[test]
    fn collapsing_focused_row_clears_focus() {
        let mut adapter = adapter();
        let t0 = Instant::now();
        adapter.bind(&snapshot(&items(), Some(1)), t0);
        adapter.focus(Some(ItemId::new(1)));

        let bind = adapter.bind(&snapshot(&items(), None), t0);

        assert_eq!(
            bind.commands,
            vec![
                HostCommand::ClearFocus(ViewId::new(1)),
                HostCommand::HideKeyboard
            ]
        );
        assert_eq!(adapter.focused(), None);
    }

    #[test]
    fn edit_press_mid_animation_replays_on_completion() {
        let mut adapter = adapter();
        let t0 = Instant::now();
        adapter.bind(&snapshot(&items(), None), t0);
        let bread = ItemId::new(2);

        assert_eq!(adapter.edit_pressed(bread, t0), Press::Execute);
        adapter.bind(&snapshot(&items(), Some(2)), t0);

        assert_eq!(adapter.edit_pressed(bread, t0 + D * 2 / 3), Press::Queued);
        assert!(adapter.has_queued_press(bread));

        let tick = adapter.tick(t0 + D);
        assert_eq!(tick.replays, vec![bread]);
    }

    #[test]
    fn early_edit_press_is_dropped() {
        let mut adapter = adapter();
        let t0 = Instant::now();
        adapter.bind(&snapshot(&items(), None), t0);
        let bread = ItemId::new(2);
        adapter.bind(&snapshot(&items(), Some(2)), t0);

        adapter.edit_pressed(bread, t0 + D / 10);
        let tick = adapter.tick(t0 + D);

        assert!(tick.replays.is_empty());
        assert!(!adapter.has_queued_press(bread));
    }

    #[test]
    fn press_on_unbound_row_is_not_queued() {
        let mut adapter = adapter();
        let t0 = Instant::now();
        adapter.bind(&snapshot(&items(), None), t0);
        adapter.bind(&snapshot(&items(), Some(2)), t0);
        let stranger = ItemId::new(99);

        assert_eq!(adapter.edit_pressed(stranger, t0 + D * 2 / 3), Press::Execute);
        assert!(!adapter.has_queued_press(stranger));
    }

    #[test]
    fn removed_row_abandons_its_animation() {
        use futures::FutureExt;

        let mut adapter = adapter();
        let t0 = Instant::now();
        adapter.bind(&snapshot(&items(), None), t0);
        adapter.bind(&snapshot(&items(), Some(2)), t0);
        let completion = adapter.completion(ItemId::new(2));
        adapter.edit_pressed(ItemId::new(2), t0 + D * 2 / 3);

        let remaining = vec![item(1, "Apples"), item(3, "Coffee")];
        let bind = adapter.bind(&snapshot(&remaining, None), t0 + D / 2);

        assert!(bind.changes.contains(&RowChange::Removed {
            id: ItemId::new(2),
            index: 1
        }));
        assert_eq!(completion.now_or_never(), Some(Outcome::Abandoned));
        assert!(!adapter.has_queued_press(ItemId::new(2)));
        assert_eq!(adapter.view_of(ItemId::new(2)), None);
    }
}
