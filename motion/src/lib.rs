//! # Pantry Motion
//!
//! Expand/collapse animation for list rows.
//!
//! When a row's measured height changes between two layout passes because it
//! expanded or collapsed, [`plan`] compares the passes and produces a
//! declarative [`Plan`]: height, child fade and width intents for the row,
//! translation intents for the rows below it, a width lock for its name
//! field, and focus commands for the host. An [`ExpandCollapseAnimator`]
//! runs plans with one shared [`AnimationConfig`], so every sub-animation
//! starts and ends together, and reports completion as a future.
//!
//! [`EditButtonGate`] holds back edit-button presses that land on a row that
//! is still animating.
//!
//! ```
//! use pantry_motion::{AnimationConfig, ExpandCollapseAnimator, LayoutPass, plan};
//! use std::time::Instant;
//!
//! let pre = LayoutPass::default();
//! let post = LayoutPass::default();
//!
//! let mut animator = ExpandCollapseAnimator::new(AnimationConfig::default());
//! animator.prepare(plan(&pre, &post));
//! assert_eq!(animator.start(Instant::now()), 0);
//! ```

pub mod config;
pub mod driver;
pub mod intent;
pub mod layout;
pub mod planner;
pub mod replay;

pub use config::{AnimationConfig, Interpolator, ParseInterpolatorError};
pub use driver::{Completion, ExpandCollapseAnimator, Frame, Outcome};
pub use intent::{AnimationIntent, Child, FrameValue, Property, Target, ViewId};
pub use layout::{LayoutPass, RowLayout};
pub use planner::{Direction, HostCommand, Plan, TransitionPlan, plan};
pub use replay::{EditButtonGate, Press, QueuedPress};
