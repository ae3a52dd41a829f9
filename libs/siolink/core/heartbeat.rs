//! Heartbeat keep-alive for an upgraded session.
//!
//! A dedicated tokio task ticks at 90% of the server-announced interval and
//! pushes a PING frame into a channel consumed by the connection task, which
//! owns the transport sink. The task itself never touches the socket, so it
//! can be stopped and joined without ordering hazards: the stop signal is a
//! oneshot selected against the ticker, and the join handle is awaited by
//! the teardown context, never by the heartbeat itself.

use crate::codec::frame::Frame;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Margin under the server's timeout window.
const HEARTBEAT_MARGIN: f64 = 0.9;

/// Ping cadence for a server-announced interval in seconds.
pub fn heartbeat_interval(heartbeat_secs: u64) -> Duration {
    let secs = (heartbeat_secs as f64 * HEARTBEAT_MARGIN).round() as u64;
    // tokio::time::interval rejects a zero period
    Duration::from_secs(secs.max(1))
}

/// Periodic ping task. Runs until the stop signal fires or the frame
/// channel closes (connection task gone).
pub async fn heartbeat_task(
    interval: Duration,
    frame_tx: mpsc::UnboundedSender<Frame>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; consume it so the first ping
    // goes out a full interval after connecting.
    ticker.tick().await;
    // Skip missed ticks rather than bursting to catch up.
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!(?interval, "heartbeat task started");

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!("heartbeat task received stop signal");
                break;
            }
            _ = ticker.tick() => {
                debug!("heartbeat tick, sending ping");
                if frame_tx.send(Frame::ping()).is_err() {
                    debug!("heartbeat channel closed, stopping");
                    break;
                }
            }
        }
    }

    debug!("heartbeat task exiting");
}

/// Spawn the heartbeat task.
///
/// Returns the join handle for deterministic teardown, the stop signal,
/// and the channel the connection task drains for outbound pings.
pub fn spawn_heartbeat(
    interval: Duration,
) -> (
    tokio::task::JoinHandle<()>,
    oneshot::Sender<()>,
    mpsc::UnboundedReceiver<Frame>,
) {
    let (stop_tx, stop_rx) = oneshot::channel();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(heartbeat_task(interval, frame_tx, stop_rx));
    (handle, stop_tx, frame_rx)
}
