// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn at() -> HubEvent {
    HubEvent::StateChanged { reason: "test".into(), at: Utc::now() }
}

#[test]
fn subscriber_receives_published_events_in_order() {
    let bus = EventBus::default();
    let sub = bus.subscribe();
    bus.publish(HubEvent::StateChanged { reason: "one".into(), at: Utc::now() });
    bus.publish(HubEvent::StateChanged { reason: "two".into(), at: Utc::now() });

    let (events, lagged) = sub.drain();
    assert!(!lagged);
    assert_eq!(events.len(), 2);
    match &events[0] {
        HubEvent::StateChanged { reason, .. } => assert_eq!(reason, "one"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn full_queue_drops_oldest_and_reports_lagged() {
    let bus = EventBus::with_capacity(2);
    let sub = bus.subscribe();
    for _ in 0..5 {
        bus.publish(at());
    }
    let (events, lagged) = sub.drain();
    assert!(lagged);
    assert_eq!(events.len(), 2);
}

#[test]
fn dropping_subscription_removes_it_from_the_bus() {
    let bus = EventBus::default();
    let sub = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);
    drop(sub);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn independent_subscribers_each_get_their_own_queue() {
    let bus = EventBus::default();
    let sub_a = bus.subscribe();
    let sub_b = bus.subscribe();
    bus.publish(at());

    let (events_a, _) = sub_a.drain();
    assert_eq!(events_a.len(), 1);
    let (events_b, _) = sub_b.drain();
    assert_eq!(events_b.len(), 1);

    // draining doesn't affect the other subscriber's independently tracked queue
    bus.publish(at());
    let (events_a_again, _) = sub_a.drain();
    assert_eq!(events_a_again.len(), 1);
}
