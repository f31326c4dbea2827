//! Declarative animation intents.
//!
//! A transition is a list of `{target, property, from, to}` descriptors; the
//! driver owns timing, so intents carry no duration of their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a recyclable row view
///
/// Distinct from the item it currently shows: a view scrolled off-screen may
/// be rebound to another item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(u64);

impl ViewId {
    /// Wrap a raw view id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Row children that appear, disappear or resize on expansion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Child {
    /// Editable name
    NameField,
    /// Detail line under the name
    ExtraInfo,
    /// Auto-add checkbox and threshold (inventory)
    AutoAddControls,
    /// "Also on the other list" badge
    LinkedBadge,
    /// Amount stepper
    AmountStepper,
}

/// What an intent animates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Target {
    /// The whole row
    Row(ViewId),
    /// One child of a row
    Child(ViewId, Child),
}

impl Target {
    /// View the target belongs to
    #[must_use]
    pub const fn view(self) -> ViewId {
        match self {
            Self::Row(view) | Self::Child(view, _) => view,
        }
    }
}

/// Animated property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Property {
    /// Laid-out height
    Height,
    /// Vertical offset from the laid-out position
    TranslationY,
    /// Opacity
    Alpha,
    /// Laid-out width
    Width,
}

/// One sub-animation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationIntent {
    /// What moves
    pub target: Target,
    /// Which property
    pub property: Property,
    /// Value at progress 0
    pub from: f32,
    /// Value at progress 1
    pub to: f32,
}

impl AnimationIntent {
    /// Create an intent
    #[must_use]
    pub const fn new(target: Target, property: Property, from: f32, to: f32) -> Self {
        Self {
            target,
            property,
            from,
            to,
        }
    }

    /// Key identifying the animated slot
    #[must_use]
    pub const fn slot(&self) -> (Target, Property) {
        (self.target, self.property)
    }

    /// Value at an interpolated `progress`
    #[must_use]
    pub fn value_at(&self, progress: f32) -> f32 {
        self.from + (self.to - self.from) * progress
    }
}

/// One interpolated value for the host to apply this frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameValue {
    /// What moves
    pub target: Target,
    /// Which property
    pub property: Property,
    /// Value to apply
    pub value: f32,
}
