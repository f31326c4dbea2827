//! Integration tests for effect execution in the Store runtime
//!
//! Covers streams fed back into the reducer, cancellable effects replacing
//! each other, explicit cancellation, and delayed actions.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use futures::stream;
use pantry_core::effect::{Effect, EffectId};
use pantry_core::{SmallVec, delay, reducer::Reducer, smallvec};
use pantry_runtime::Store;
use std::time::Duration;

const FEED: EffectId = EffectId::new("feed");
const TIMER: EffectId = EffectId::new("timer");

#[derive(Clone, Debug, Default, PartialEq)]
struct FeedState {
    received: Vec<(char, u32)>,
    timer_fired: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum FeedAction {
    Subscribe { tag: char },
    Unsubscribe,
    Received { tag: char, value: u32 },
    Finite { values: Vec<u32> },
    StartTimer { after: Duration },
    StopTimer,
    TimerFired,
}

struct FeedReducer;

fn ticking(tag: char) -> Effect<FeedAction> {
    Effect::Stream(Box::pin(stream::unfold(0_u32, move |value| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Some((FeedAction::Received { tag, value }, value + 1))
    })))
}

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut FeedState,
        action: FeedAction,
        _env: &(),
    ) -> SmallVec<[Effect<FeedAction>; 4]> {
        match action {
            FeedAction::Subscribe { tag } => smallvec![ticking(tag).cancellable(FEED, true)],
            FeedAction::Unsubscribe => smallvec![Effect::Cancel(FEED)],
            FeedAction::Received { tag, value } => {
                state.received.push((tag, value));
                smallvec![]
            },
            FeedAction::Finite { values } => smallvec![Effect::Stream(Box::pin(stream::iter(
                values
                    .into_iter()
                    .map(|value| FeedAction::Received { tag: 'f', value }),
            )))],
            FeedAction::StartTimer { after } => smallvec![
                delay! { duration: after, action: FeedAction::TimerFired }.cancellable(TIMER, true)
            ],
            FeedAction::StopTimer => smallvec![Effect::Cancel(TIMER)],
            FeedAction::TimerFired => {
                state.timer_fired = true;
                smallvec![]
            },
        }
    }
}

#[tokio::test]
async fn finite_stream_items_are_reduced_in_order() {
    let store = Store::new(FeedState::default(), FeedReducer, ());

    let mut handle = store
        .send(FeedAction::Finite {
            values: vec![1, 2, 3],
        })
        .await
        .unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    let received = store.state(|s| s.received.clone()).await;
    assert_eq!(received, vec![('f', 1), ('f', 2), ('f', 3)]);
}

#[tokio::test(start_paused = true)]
async fn new_subscription_replaces_previous_one() {
    let store = Store::new(FeedState::default(), FeedReducer, ());

    store.send(FeedAction::Subscribe { tag: 'a' }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(35)).await;

    store.send(FeedAction::Subscribe { tag: 'b' }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(35)).await;

    let received = store.state(|s| s.received.clone()).await;
    let switch = received
        .iter()
        .position(|(tag, _)| *tag == 'b')
        .expect("second subscription emitted");

    assert!(switch > 0, "first subscription emitted before the switch");
    assert!(
        received[switch..].iter().all(|(tag, _)| *tag == 'b'),
        "first subscription kept emitting after replacement: {received:?}"
    );
    assert_eq!(store.in_flight(FEED), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_subscription() {
    let store = Store::new(FeedState::default(), FeedReducer, ());

    store.send(FeedAction::Subscribe { tag: 'a' }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    store.send(FeedAction::Unsubscribe).await.unwrap();

    let before = store.state(|s| s.received.len()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after = store.state(|s| s.received.len()).await;

    assert_eq!(before, after);
    assert_eq!(store.in_flight(FEED), 0);
}

#[tokio::test(start_paused = true)]
async fn delayed_action_fires_unless_cancelled() {
    let store = Store::new(FeedState::default(), FeedReducer, ());

    store
        .send(FeedAction::StartTimer {
            after: Duration::from_millis(100),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.send(FeedAction::StopTimer).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!store.state(|s| s.timer_fired).await);

    store
        .send(FeedAction::StartTimer {
            after: Duration::from_millis(100),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(store.state(|s| s.timer_fired).await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_live_subscriptions() {
    let store = Store::new(FeedState::default(), FeedReducer, ());

    store.send(FeedAction::Subscribe { tag: 'a' }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(15)).await;

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.in_flight(FEED), 0);
}
