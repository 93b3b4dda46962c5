use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::blackboard::{Blackboard, SensorFrame, latch_estop, raise_fault};
use crate::sim::SharedBoard;

pub const OBSTACLE_FAULT: &str = "obstacle inside stop distance";

/// A frame calls for an emergency stop when the measured distance is inside
/// `stop_distance_cm`. Frames without an echo never do.
pub fn obstacle_too_close(frame: &SensorFrame, stop_distance_cm: u32) -> bool {
    matches!(frame.distance_cm, Some(cm) if cm < stop_distance_cm)
}

/// Stop every motor, once, as soon as a frame reports an obstacle inside the stop distance.
pub async fn watchdog(
    board: SharedBoard,
    bb: Blackboard,
    mut frames: broadcast::Receiver<Arc<SensorFrame>>,
    stop_distance_cm: u32,
) -> anyhow::Result<()> {
    info!(stop_distance_cm, "Watchdog task started.");
    loop {
        match frames.recv().await {
            Ok(frame) => {
                if obstacle_too_close(&frame, stop_distance_cm) && latch_estop(&bb) {
                    warn!(
                        distance_cm = ?frame.distance_cm,
                        stop_distance_cm,
                        "Obstacle inside stop distance! Triggering E-stop."
                    );
                    let board = board.clone();
                    tokio::task::spawn_blocking(move || board.lock().stop_all_motors()).await??;
                    raise_fault(&bb, OBSTACLE_FAULT);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Watchdog lagging behind sensor frames.");
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Sensor topic closed, watchdog exiting.");
                return Ok(());
            }
        }
    }
}
