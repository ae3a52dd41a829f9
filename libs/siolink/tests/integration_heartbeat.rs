//! Heartbeat cadence and shutdown tests, driven under paused tokio time.

use siolink::core::heartbeat::{heartbeat_interval, spawn_heartbeat};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn pings_arrive_on_the_margin_interval() {
    // heartbeatInterval = 10s gives a 9s cadence.
    let (handle, stop, mut frame_rx) = spawn_heartbeat(heartbeat_interval(10));

    // Let the task register its timer before touching the clock.
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    // Nothing before ~9s.
    tokio::time::advance(Duration::from_millis(8900)).await;
    assert!(frame_rx.try_recv().is_err());

    // The first ping fires at the 9s mark.
    let frame = tokio::time::timeout(Duration::from_secs(2), frame_rx.recv())
        .await
        .expect("ping within the interval")
        .expect("heartbeat channel open");
    assert_eq!(frame.encode(), "2");

    // No early second ping...
    assert!(
        tokio::time::timeout(Duration::from_secs(5), frame_rx.recv())
            .await
            .is_err()
    );
    // ...but it does arrive one full interval after the first.
    let frame = tokio::time::timeout(Duration::from_secs(6), frame_rx.recv())
        .await
        .expect("second ping")
        .expect("heartbeat channel open");
    assert_eq!(frame.encode(), "2");

    stop.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_is_observable_and_final() {
    let (handle, stop, mut frame_rx) = spawn_heartbeat(heartbeat_interval(10));
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    stop.send(()).unwrap();
    // Joining the handle proves the periodic task fully exited.
    handle.await.unwrap();

    // Zero frames after the stop is acknowledged, no matter how much time
    // passes.
    tokio::time::advance(Duration::from_secs(120)).await;
    assert!(frame_rx.recv().await.is_none());
}
