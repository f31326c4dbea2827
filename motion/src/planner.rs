//! Turn two consecutive layout passes into a transition plan.
//!
//! A row animates when the same view, still bound to the same item, was
//! measured at a different height. Everything else in the plan follows from
//! the set of animating rows:
//!
//! - each animating row gets a height intent plus fades for children that
//!   appear or disappear, and a width intent if its name field resized;
//! - every row after an animating row in backing-list order is translated
//!   back by the summed height deltas above it and slides to zero;
//! - the name field of each animating row is locked at its old right edge;
//! - a collapsing row with focus asks the host to drop focus and the
//!   keyboard first.

use crate::intent::{AnimationIntent, Child, Property, Target, ViewId};
use crate::layout::{LayoutPass, RowLayout};
use pantry_lists::ItemId;
use serde::{Deserialize, Serialize};

/// Distance the detail line slides while fading
pub const EXTRA_INFO_SLIDE: f32 = 24.0;

/// Direction of a height change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Row grew
    Expand,
    /// Row shrank
    Collapse,
}

/// Side effects the host performs before the animation starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Remove input focus from the row
    ClearFocus(ViewId),
    /// Dismiss the soft keyboard
    HideKeyboard,
}

/// Planned animation of one row whose height changed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionPlan {
    /// Animating view
    pub view: ViewId,
    /// Item bound to it
    pub item: ItemId,
    /// Grow or shrink
    pub direction: Direction,
    /// Height, child and width intents
    pub intents: Vec<AnimationIntent>,
    /// Right edge the name field keeps until the transition ends
    pub locked_right_edge: f32,
}

impl TransitionPlan {
    /// Height change (positive when expanding)
    #[must_use]
    pub fn delta(&self) -> f32 {
        self.intents
            .iter()
            .find(|intent| intent.property == Property::Height)
            .map_or(0.0, |intent| intent.to - intent.from)
    }
}

/// Everything needed to animate from one layout pass to the next
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// One per animating row
    pub transitions: Vec<TransitionPlan>,
    /// Translation intents for rows below animating rows
    pub compensations: Vec<AnimationIntent>,
    /// Focus and keyboard commands
    pub commands: Vec<HostCommand>,
}

impl Plan {
    /// Nothing to animate
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Compensation for `view`, if it moves
    #[must_use]
    pub fn compensation(&self, view: ViewId) -> Option<&AnimationIntent> {
        self.compensations
            .iter()
            .find(|intent| intent.target == Target::Row(view))
    }
}

/// Plan the transition from `pre` to `post`
#[must_use]
pub fn plan(pre: &LayoutPass, post: &LayoutPass) -> Plan {
    let mut result = Plan::default();

    for after in post.rows() {
        let Some(before) = pre.row(after.view) else {
            continue;
        };
        // Rebound views are new content, not a transition
        if before.item != after.item || (before.height - after.height).abs() < f32::EPSILON {
            continue;
        }

        let transition = transition(before, after);
        if transition.direction == Direction::Collapse && (before.focused || after.focused) {
            result.commands.push(HostCommand::ClearFocus(after.view));
            if !result.commands.contains(&HostCommand::HideKeyboard) {
                result.commands.push(HostCommand::HideKeyboard);
            }
        }
        result.transitions.push(transition);
    }

    let mut shift: f32 = 0.0;
    for row in post.rows() {
        if shift.abs() >= f32::EPSILON {
            result.compensations.push(AnimationIntent::new(
                Target::Row(row.view),
                Property::TranslationY,
                -shift,
                0.0,
            ));
        }
        if let Some(transition) = result.transitions.iter().find(|t| t.view == row.view) {
            shift += transition.delta();
        }
    }

    result
}

fn transition(before: &RowLayout, after: &RowLayout) -> TransitionPlan {
    let view = after.view;
    let direction = if after.height > before.height {
        Direction::Expand
    } else {
        Direction::Collapse
    };

    let mut intents = vec![AnimationIntent::new(
        Target::Row(view),
        Property::Height,
        before.height,
        after.height,
    )];

    for child in [
        Child::ExtraInfo,
        Child::AutoAddControls,
        Child::LinkedBadge,
        Child::AmountStepper,
    ] {
        let (from, to) = match (before.shows(child), after.shows(child)) {
            (false, true) => (0.0, 1.0),
            (true, false) => (1.0, 0.0),
            _ => continue,
        };
        let target = Target::Child(view, child);
        intents.push(AnimationIntent::new(target, Property::Alpha, from, to));
        if child == Child::ExtraInfo {
            let (from, to) = if to > from {
                (-EXTRA_INFO_SLIDE, 0.0)
            } else {
                (0.0, -EXTRA_INFO_SLIDE)
            };
            intents.push(AnimationIntent::new(target, Property::TranslationY, from, to));
        }
    }

    if (before.name_width - after.name_width).abs() >= f32::EPSILON {
        intents.push(AnimationIntent::new(
            Target::Child(view, Child::NameField),
            Property::Width,
            before.name_width,
            after.name_width,
        ));
    }

    TransitionPlan {
        view,
        item: after.item,
        direction,
        intents,
        locked_right_edge: before.name_right,
    }
}
