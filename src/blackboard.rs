use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

/// One sampling pass over the board's sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Line sensors A, B, C, D.
    pub line: [u8; 4],
    /// `None` when the ultrasonic echo timed out.
    pub distance_cm: Option<u32>,
    pub taken_at: Instant,
}

#[derive(Clone, Default)]
pub struct State {
    pub last_frame: Option<SensorFrame>,
    pub frames: u64,
    pub estopped: bool,
    pub faults: Vec<String>,
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn record_frame(bb: &Blackboard, frame: SensorFrame) {
    let mut g = bb.write();
    g.last_frame = Some(frame);
    g.frames += 1;
}

pub fn latch_estop(bb: &Blackboard) -> bool {
    let mut g = bb.write();
    let first = !g.estopped;
    g.estopped = true;
    first
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_frame_counts() {
        let bb: Blackboard = Arc::default();
        let frame = SensorFrame {
            line: [0, 1, 0, 0],
            distance_cm: Some(42),
            taken_at: Instant::now(),
        };
        record_frame(&bb, frame);
        record_frame(&bb, frame);
        let state = snapshot(&bb);
        assert_eq!(state.frames, 2);
        assert_eq!(state.last_frame, Some(frame));
    }

    #[test]
    fn test_faults_are_deduplicated() {
        let bb: Blackboard = Arc::default();
        raise_fault(&bb, "obstacle");
        raise_fault(&bb, "obstacle");
        raise_fault(&bb, "sensor");
        assert_eq!(snapshot(&bb).faults, vec!["obstacle", "sensor"]);
    }

    #[test]
    fn test_estop_latches_once() {
        let bb: Blackboard = Arc::default();
        assert!(latch_estop(&bb));
        assert!(!latch_estop(&bb));
        assert!(snapshot(&bb).estopped);
    }
}
