mod blackboard; // latest sensor frame, e-stop latch and faults
mod bus;        // broadcast topics between the bench tasks
mod config;     // bench configuration
mod sampler;    // sensor sampling thread
mod sim;        // simulated carrier board
mod watchdog;   // obstacle e-stop

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use robotboard_driver::Board;

use blackboard::{Blackboard, SensorFrame, snapshot};
use bus::Topic;
use crate::config::{BenchConfig, DEFAULT_CONFIG_PATH, DriveStep, load_config};
use sim::{BoardState, SharedBoard, SimPlatform};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)?;
    config.validate()?;

    info!("Robot board bench started. Running against the simulated board...");
    run(config).await
}

async fn run(config: BenchConfig) -> anyhow::Result<()> {
    let state = BoardState::shared(&config.world);
    let board: SharedBoard = Arc::new(Mutex::new(Board::with_timeout_policy(
        SimPlatform::new(state.clone()),
        config.sonar.timeout_policy,
    )));
    let bb: Blackboard = Arc::default();
    let frames: Topic<SensorFrame> = Topic::new(16);
    let frame_rx = frames.subscribe();
    let shutdown = Arc::new(AtomicBool::new(false));

    info!("Spawning sampler thread...");
    let sampler = sampler::spawn_sampler(
        board.clone(),
        state.clone(),
        bb.clone(),
        frames.clone(),
        Duration::from_millis(config.bench.sample_period_ms),
        shutdown.clone(),
    )?;

    let outcome = tokio::select! {
        res = async_runtime(board.clone(), bb.clone(), frame_rx, &config) => res,
        _ = time::sleep(Duration::from_millis(config.bench.duration_ms)) => {
            info!(duration_ms = config.bench.duration_ms, "Bench duration elapsed.");
            Ok(())
        }
    };

    shutdown.store(true, Ordering::Relaxed);
    tokio::task::spawn_blocking(move || sampler.join())
        .await?
        .map_err(|_| anyhow!("sampler thread panicked"))?;

    let final_board = board.clone();
    tokio::task::spawn_blocking(move || final_board.lock().stop_all_motors()).await??;

    let summary = snapshot(&bb);
    info!(
        frames = summary.frames,
        estopped = summary.estopped,
        faults = ?summary.faults,
        last_frame = ?summary.last_frame,
        obstacle_cm = state.lock().obstacle_cm(),
        "Bench finished, all motors stopped."
    );
    outcome
}

async fn async_runtime(
    board: SharedBoard,
    bb: Blackboard,
    frame_rx: broadcast::Receiver<Arc<SensorFrame>>,
    config: &BenchConfig,
) -> anyhow::Result<()> {
    info!("Async runtime started.");
    tokio::try_join!(
        drive_task(board.clone(), bb.clone(), config.drive.clone()),
        watchdog::watchdog(board, bb, frame_rx, config.bench.stop_distance_cm),
    )?;
    info!("Async runtime finished.");
    Ok(())
}

/// Play the drive script, then stop every motor. Abandons the script once the e-stop has
/// latched; the watchdog has already stopped the motors by then.
async fn drive_task(board: SharedBoard, bb: Blackboard, steps: Vec<DriveStep>) -> anyhow::Result<()> {
    info!(steps = steps.len(), "Drive task started.");
    for (i, step) in steps.iter().enumerate() {
        let (channel, direction, speed) = step.resolve()?;

        let board = board.clone();
        let bb = bb.clone();
        let applied = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
            let mut board = board.lock();
            if snapshot(&bb).estopped {
                return Ok(false);
            }
            board.drive_motor(channel, direction, speed)?;
            Ok(true)
        })
        .await??;

        if !applied {
            warn!(step = i + 1, "E-stop latched, abandoning drive script.");
            return Ok(());
        }
        info!(
            step = i + 1,
            motor = channel.number(),
            ?direction,
            speed = speed.get(),
            hold_ms = step.hold_ms,
            "Drive step applied."
        );
        time::sleep(Duration::from_millis(step.hold_ms)).await;
    }
    tokio::task::spawn_blocking(move || board.lock().stop_all_motors()).await??;
    info!("Drive script complete, all motors stopped.");
    Ok(())
}
