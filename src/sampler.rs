use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;
use tracing::{debug, error, info};

use robotboard_driver::BoardError;

use crate::blackboard::{Blackboard, SensorFrame, raise_fault, record_frame};
use crate::bus::Topic;
use crate::sim::{SharedBoard, SharedBoardState, SimError};

/// Read every sensor once. An ultrasonic timeout becomes `distance_cm: None`.
pub fn sample(board: &SharedBoard) -> Result<SensorFrame, BoardError<SimError>> {
    let mut board = board.lock();
    let line = board.read_line_sensors()?;
    let distance_cm = match board.read_ultrasonic_distance_cm() {
        Ok(cm) => Some(cm),
        Err(BoardError::HardwareTimeout) => None,
        Err(e) => return Err(e),
    };
    Ok(SensorFrame {
        line,
        distance_cm,
        taken_at: Instant::now(),
    })
}

/// Spawn the sampling thread. Each pass advances the simulated world, samples the board
/// and publishes the frame, until `shutdown` is set.
pub fn spawn_sampler(
    board: SharedBoard,
    state: SharedBoardState,
    bb: Blackboard,
    frames: Topic<SensorFrame>,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new().name("sampler".into()).spawn(move || {
        info!("Sampler thread started.");
        let sleeper = SpinSleeper::new(100_000);
        let mut last = Instant::now();
        while !shutdown.load(Ordering::Relaxed) {
            let now = Instant::now();
            state.lock().advance(now - last);
            last = now;

            match sample(&board) {
                Ok(frame) => {
                    debug!(line = ?frame.line, distance_cm = ?frame.distance_cm, "Sensor frame");
                    record_frame(&bb, frame);
                    frames.publish(frame);
                }
                Err(e) => {
                    error!("Sensor sampling failed: {}", e);
                    raise_fault(&bb, "sensor sampling failed");
                }
            }
            sleeper.sleep(period);
        }
        info!("Sampler thread stopped.");
    })
}
