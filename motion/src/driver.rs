//! The expand/collapse driver.
//!
//! Per view, a transition moves `Pending -> Running -> Done`:
//!
//! - [`ExpandCollapseAnimator::prepare`] latches start values so the host can
//!   apply them before the first frame;
//! - [`ExpandCollapseAnimator::start`] starts everything pending at the same
//!   instant, so transitions prepared together finish together;
//! - [`ExpandCollapseAnimator::tick`] interpolates, and finishes transitions
//!   whose duration has elapsed.
//!
//! The driver never suspends. Completion is exposed as a future resolved
//! from `tick` (or `recycle`) so callers can await a row settling without
//! nesting listeners.

use crate::config::AnimationConfig;
use crate::intent::{AnimationIntent, FrameValue, Property, Target, ViewId};
use crate::planner::{Direction, Plan};
use pantry_lists::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::oneshot;

/// How a transition ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Reached its end values
    Finished,
    /// Its view was recycled first
    Abandoned,
}

/// Lifecycle phase of a prepared animation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Start values latched, not started
    Pending,
    /// Interpolating since `started`
    Running {
        /// Shared start instant
        started: Instant,
    },
}

struct Transition {
    item: ItemId,
    direction: Direction,
    intents: Vec<AnimationIntent>,
    locked_right_edge: f32,
    phase: Phase,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

struct Compensation {
    intent: AnimationIntent,
    phase: Phase,
}

/// Values to apply for one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Interpolated values
    pub values: Vec<FrameValue>,
    /// Items whose transition finished on this frame
    pub finished: Vec<ItemId>,
}

impl Frame {
    /// Value for a slot, if it animated this frame
    #[must_use]
    pub fn value(&self, target: Target, property: Property) -> Option<f32> {
        self.values
            .iter()
            .find(|value| value.target == target && value.property == property)
            .map(|value| value.value)
    }
}

type Listener = Box<dyn FnMut(ItemId, Outcome) + Send>;

/// Runs expand/collapse transitions for the rows of one list
pub struct ExpandCollapseAnimator {
    config: AnimationConfig,
    transitions: HashMap<ViewId, Transition>,
    compensations: HashMap<ViewId, Compensation>,
    current: HashMap<(Target, Property), f32>,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for ExpandCollapseAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpandCollapseAnimator")
            .field("config", &self.config)
            .field("transitions", &self.transitions.len())
            .field("compensations", &self.compensations.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl ExpandCollapseAnimator {
    /// Create an idle animator
    #[must_use]
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            transitions: HashMap::new(),
            compensations: HashMap::new(),
            current: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Shared timing
    #[must_use]
    pub const fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Call `listener` whenever a transition finishes or is abandoned
    pub fn add_listener(&mut self, listener: impl FnMut(ItemId, Outcome) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Latch a plan's start values; returns them for the host to apply
    ///
    /// A view that is already animating is retargeted: its intents start
    /// from the values last produced for it, and whoever awaits its
    /// completion now awaits the new transition.
    pub fn prepare(&mut self, plan: Plan) -> Vec<FrameValue> {
        let mut latched = Vec::new();

        for transition in plan.transitions {
            let mut intents = transition.intents;
            for intent in &mut intents {
                if let Some(&value) = self.current.get(&intent.slot()) {
                    intent.from = value;
                }
            }

            let waiters = match self.transitions.remove(&transition.view) {
                Some(previous) => {
                    tracing::debug!(view = %transition.view, item = %previous.item, "Retargeting transition");
                    // Slots the new plan no longer animates keep no stale value
                    for stale in &previous.intents {
                        if !intents.iter().any(|intent| intent.slot() == stale.slot()) {
                            self.current.remove(&stale.slot());
                        }
                    }
                    previous.waiters
                },
                None => Vec::new(),
            };

            tracing::debug!(
                view = %transition.view,
                item = %transition.item,
                direction = ?transition.direction,
                intents = intents.len(),
                "Transition pending"
            );

            latched.extend(intents.iter().map(|intent| self.latch(intent)));
            self.transitions.insert(
                transition.view,
                Transition {
                    item: transition.item,
                    direction: transition.direction,
                    intents,
                    locked_right_edge: transition.locked_right_edge,
                    phase: Phase::Pending,
                    waiters,
                },
            );
        }

        for mut intent in plan.compensations {
            // A row still sliding keeps its visual offset
            if let Some(&value) = self.current.get(&intent.slot()) {
                intent.from += value;
            }
            latched.push(self.latch(&intent));
            self.compensations.insert(
                intent.target.view(),
                Compensation {
                    intent,
                    phase: Phase::Pending,
                },
            );
        }

        latched
    }

    fn latch(&mut self, intent: &AnimationIntent) -> FrameValue {
        self.current.insert(intent.slot(), intent.from);
        FrameValue {
            target: intent.target,
            property: intent.property,
            value: intent.from,
        }
    }

    /// Start everything pending at `now`; returns the number of transitions started
    pub fn start(&mut self, now: Instant) -> usize {
        let mut started = 0;
        for transition in self.transitions.values_mut() {
            if transition.phase == Phase::Pending {
                transition.phase = Phase::Running { started: now };
                started += 1;
            }
        }
        for compensation in self.compensations.values_mut() {
            if compensation.phase == Phase::Pending {
                compensation.phase = Phase::Running { started: now };
            }
        }

        if started > 0 {
            tracing::debug!(started, "Transitions running");
            metrics::counter!("motion.transitions.started").increment(started as u64);
        }
        started
    }

    /// Interpolate every running animation at `now`
    pub fn tick(&mut self, now: Instant) -> Frame {
        let mut frame = Frame::default();
        let config = self.config;

        let mut done = Vec::new();
        for (&view, transition) in &self.transitions {
            let Phase::Running { started } = transition.phase else {
                continue;
            };
            let elapsed = now.saturating_duration_since(started);
            let progress = config.progress(elapsed);
            for intent in &transition.intents {
                let value = intent.value_at(progress);
                self.current.insert(intent.slot(), value);
                frame.values.push(FrameValue {
                    target: intent.target,
                    property: intent.property,
                    value,
                });
            }
            if config.fraction(elapsed) >= 1.0 {
                done.push(view);
            }
        }

        let mut settled = Vec::new();
        for (&view, compensation) in &self.compensations {
            let Phase::Running { started } = compensation.phase else {
                continue;
            };
            let elapsed = now.saturating_duration_since(started);
            let value = compensation.intent.value_at(config.progress(elapsed));
            self.current.insert(compensation.intent.slot(), value);
            frame.values.push(FrameValue {
                target: compensation.intent.target,
                property: compensation.intent.property,
                value,
            });
            if config.fraction(elapsed) >= 1.0 {
                settled.push(view);
            }
        }

        for view in settled {
            if let Some(compensation) = self.compensations.remove(&view) {
                self.current.remove(&compensation.intent.slot());
            }
        }

        for view in done {
            if let Some(transition) = self.transitions.remove(&view) {
                tracing::debug!(%view, item = %transition.item, direction = ?transition.direction, "Transition finished");
                frame.finished.push(transition.item);
                self.settle(transition, Outcome::Finished);
            }
        }

        tracing::trace!(
            values = frame.values.len(),
            finished = frame.finished.len(),
            "Animation tick"
        );
        frame
    }

    /// Abandon everything targeting `view`
    ///
    /// Returns the item whose transition was abandoned, if any.
    pub fn recycle(&mut self, view: ViewId) -> Option<ItemId> {
        self.compensations.remove(&view);
        self.current.retain(|(target, _), _| target.view() != view);

        let transition = self.transitions.remove(&view)?;
        let item = transition.item;
        tracing::debug!(%view, %item, "View recycled mid-animation");
        self.settle(transition, Outcome::Abandoned);
        Some(item)
    }

    fn settle(&mut self, transition: Transition, outcome: Outcome) {
        for intent in &transition.intents {
            self.current.remove(&intent.slot());
        }
        for waiter in transition.waiters {
            // Receiver may have been dropped
            let _ = waiter.send(outcome);
        }
        for listener in &mut self.listeners {
            listener(transition.item, outcome);
        }
        match outcome {
            Outcome::Finished => metrics::counter!("motion.transitions.finished").increment(1),
            Outcome::Abandoned => metrics::counter!("motion.transitions.abandoned").increment(1),
        }
    }

    /// Future resolving when `item`'s transition ends
    ///
    /// Resolves immediately with [`Outcome::Finished`] if the item is not
    /// animating.
    pub fn completion(&mut self, item: ItemId) -> Completion {
        match self
            .transitions
            .values_mut()
            .find(|transition| transition.item == item)
        {
            Some(transition) => {
                let (tx, rx) = oneshot::channel();
                transition.waiters.push(tx);
                Completion {
                    state: CompletionState::Waiting(rx),
                }
            },
            None => Completion {
                state: CompletionState::Ready(Outcome::Finished),
            },
        }
    }

    /// Right edge the name field of `view` must keep during relayouts
    #[must_use]
    pub fn locked_right_edge(&self, view: ViewId) -> Option<f32> {
        self.transitions
            .get(&view)
            .map(|transition| transition.locked_right_edge)
    }

    /// Whether anything targeting `view` is pending or running
    #[must_use]
    pub fn is_animating(&self, view: ViewId) -> bool {
        self.transitions.contains_key(&view) || self.compensations.contains_key(&view)
    }

    /// Whether `item` has a pending or running transition
    #[must_use]
    pub fn is_item_animating(&self, item: ItemId) -> bool {
        self.transitions
            .values()
            .any(|transition| transition.item == item)
    }

    /// Whether anything at all is animating
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.transitions.is_empty() && self.compensations.is_empty()
    }
}

/// Completion of one item's transition
#[derive(Debug)]
pub struct Completion {
    state: CompletionState,
}

#[derive(Debug)]
enum CompletionState {
    Ready(Outcome),
    Waiting(oneshot::Receiver<Outcome>),
}

impl Future for Completion {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            CompletionState::Ready(outcome) => Poll::Ready(*outcome),
            // A dropped animator never finishes the transition
            CompletionState::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|result| result.unwrap_or(Outcome::Abandoned)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Interpolator;
    use crate::intent::Child;
    use crate::layout::LayoutPass;
    use crate::layout::fixtures::stacked;
    use crate::planner::plan;
    use futures::FutureExt;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const D: Duration = Duration::from_millis(300);

    fn animator() -> ExpandCollapseAnimator {
        ExpandCollapseAnimator::new(AnimationConfig::new(D, Interpolator::Linear))
    }

    fn height(frame: &Frame, view: u64) -> Option<f32> {
        frame.value(Target::Row(ViewId::new(view)), Property::Height)
    }

    fn translation(frame: &Frame, view: u64) -> Option<f32> {
        frame.value(Target::Row(ViewId::new(view)), Property::TranslationY)
    }

    fn expand_second_row() -> Plan {
        plan(&stacked(&[56.0, 56.0, 56.0]), &stacked(&[56.0, 120.0, 56.0]))
    }

    fn close(a: Option<f32>, b: f32) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-3)
    }

    #[test]
    fn prepare_latches_start_values_without_running() {
        let mut animator = animator();
        let latched = animator.prepare(expand_second_row());

        assert!(latched.contains(&FrameValue {
            target: Target::Row(ViewId::new(2)),
            property: Property::Height,
            value: 56.0,
        }));
        assert!(latched.contains(&FrameValue {
            target: Target::Row(ViewId::new(3)),
            property: Property::TranslationY,
            value: -64.0,
        }));
        assert!(animator.is_animating(ViewId::new(2)));

        // Pending transitions do not move before start
        let frame = animator.tick(Instant::now() + D);
        assert!(frame.values.is_empty());
        assert!(frame.finished.is_empty());
    }

    #[test]
    fn running_transition_interpolates_in_lockstep() {
        let mut animator = animator();
        animator.prepare(expand_second_row());
        let t0 = Instant::now();
        assert_eq!(animator.start(t0), 1);

        let frame = animator.tick(t0 + D / 2);
        assert!(close(height(&frame, 2), 88.0));
        assert!(close(translation(&frame, 3), -32.0));
        assert_eq!(translation(&frame, 1), None);

        let frame = animator.tick(t0 + D);
        assert!(close(height(&frame, 2), 120.0));
        assert!(close(translation(&frame, 3), 0.0));
        assert_eq!(frame.finished, vec![ItemId::new(20)]);
        assert!(animator.is_idle());
    }

    #[test]
    fn width_lock_held_until_done() {
        let mut animator = animator();
        animator.prepare(expand_second_row());
        assert_eq!(animator.locked_right_edge(ViewId::new(2)), Some(216.0));

        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + D / 3);
        assert_eq!(animator.locked_right_edge(ViewId::new(2)), Some(216.0));

        animator.tick(t0 + D);
        assert_eq!(animator.locked_right_edge(ViewId::new(2)), None);
    }

    #[test]
    fn completion_resolves_on_finish() {
        let mut animator = animator();
        animator.prepare(expand_second_row());
        let mut completion = animator.completion(ItemId::new(20));
        let t0 = Instant::now();
        animator.start(t0);

        animator.tick(t0 + D / 2);
        assert_eq!((&mut completion).now_or_never(), None);

        animator.tick(t0 + D);
        assert_eq!(completion.now_or_never(), Some(Outcome::Finished));
    }

    #[test]
    fn completion_of_idle_item_is_ready() {
        let mut animator = animator();
        assert_eq!(
            animator.completion(ItemId::new(1)).now_or_never(),
            Some(Outcome::Finished)
        );
    }

    #[test]
    fn recycle_abandons_without_error() {
        let mut animator = animator();
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&outcomes);
        animator.add_listener(move |item, outcome| seen.lock().unwrap().push((item, outcome)));

        animator.prepare(expand_second_row());
        let completion = animator.completion(ItemId::new(20));
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + D / 4);

        assert_eq!(animator.recycle(ViewId::new(2)), Some(ItemId::new(20)));
        assert_eq!(completion.now_or_never(), Some(Outcome::Abandoned));
        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![(ItemId::new(20), Outcome::Abandoned)]
        );
        assert_eq!(animator.locked_right_edge(ViewId::new(2)), None);

        // Recycling again, or a sibling, is harmless
        assert_eq!(animator.recycle(ViewId::new(2)), None);
        assert_eq!(animator.recycle(ViewId::new(3)), None);
        let frame = animator.tick(t0 + D);
        assert!(frame.finished.is_empty());
        assert!(animator.is_idle());
    }

    #[test]
    fn listeners_hear_finished_transitions() {
        let mut animator = animator();
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&outcomes);
        animator.add_listener(move |item, outcome| seen.lock().unwrap().push((item, outcome)));

        animator.prepare(expand_second_row());
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + D);

        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![(ItemId::new(20), Outcome::Finished)]
        );
    }

    #[test]
    fn retoggle_mid_flight_retargets_from_current_height() {
        let mut animator = animator();
        animator.prepare(expand_second_row());
        let completion = animator.completion(ItemId::new(20));
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + D / 2);

        // Collapse back, measured from the expanded layout
        let collapse = plan(&stacked(&[56.0, 120.0, 56.0]), &stacked(&[56.0, 56.0, 56.0]));
        let latched = animator.prepare(collapse);
        assert!(latched.contains(&FrameValue {
            target: Target::Row(ViewId::new(2)),
            property: Property::Height,
            value: 88.0,
        }));
        // Row 3 was at -32 and its layout moves up by 64
        assert!(latched.contains(&FrameValue {
            target: Target::Row(ViewId::new(3)),
            property: Property::TranslationY,
            value: 32.0,
        }));

        let t1 = t0 + D / 2;
        animator.start(t1);
        let frame = animator.tick(t1 + D);
        assert!(close(height(&frame, 2), 56.0));
        assert_eq!(completion.now_or_never(), Some(Outcome::Finished));
    }

    #[test]
    fn retarget_drops_slots_the_new_plan_leaves_out() {
        let badge = (Target::Child(ViewId::new(1), Child::LinkedBadge), Property::Alpha);
        let with_badge = || {
            let mut rows = stacked(&[120.0]).rows().to_vec();
            rows[0].children.insert(Child::LinkedBadge);
            LayoutPass::new(rows)
        };

        let mut animator = animator();
        animator.prepare(plan(&stacked(&[56.0]), &with_badge()));
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + D / 2);
        assert!(animator.current.contains_key(&badge));

        // Unlinked mid-flight: the collapse no longer fades a badge
        animator.prepare(plan(&stacked(&[120.0]), &stacked(&[56.0])));
        assert!(!animator.current.contains_key(&badge));
        let t1 = t0 + D / 2;
        animator.start(t1);
        animator.tick(t1 + D);
        assert!(animator.is_idle());

        let latched = animator.prepare(plan(&stacked(&[56.0]), &with_badge()));
        assert!(latched.contains(&FrameValue {
            target: badge.0,
            property: Property::Alpha,
            value: 0.0,
        }));
    }

    #[test]
    fn expanding_one_row_while_another_collapses_tracks_both() {
        let mut animator = animator();
        let swap = plan(&stacked(&[120.0, 56.0, 56.0]), &stacked(&[56.0, 56.0, 140.0]));
        animator.prepare(swap);
        let t0 = Instant::now();
        assert_eq!(animator.start(t0), 2);

        let frame = animator.tick(t0 + D);
        let mut finished = frame.finished;
        finished.sort();
        assert_eq!(finished, vec![ItemId::new(10), ItemId::new(30)]);
    }

    #[test]
    fn child_fades_share_the_curve() {
        let pre = stacked(&[56.0]);
        let mut rows = stacked(&[120.0]).rows().to_vec();
        rows[0].children.insert(Child::LinkedBadge);
        let post = LayoutPass::new(rows);

        let mut animator = animator();
        animator.prepare(plan(&pre, &post));
        let t0 = Instant::now();
        animator.start(t0);
        let frame = animator.tick(t0 + D / 2);

        assert!(close(
            frame.value(Target::Child(ViewId::new(1), Child::LinkedBadge), Property::Alpha),
            0.5
        ));
    }
}
