//! A stand-in for a playing timeline when no real engine is connected.
//!
//! Every step publishes a slowly drifting pair of levels for each attached meter, with the odd
//! transient so the peak hold has something to catch.
use crate::engine::{PropertyEngine, Target};
use std::{f64::consts::PI, sync::Arc};

pub struct SignalFeed {
    engine: Arc<PropertyEngine>,
    step: u64,
}

impl SignalFeed {
    pub fn new(engine: Arc<PropertyEngine>) -> Self {
        SignalFeed { engine, step: 0 }
    }

    /// Publish the next set of levels.
    pub fn advance(&mut self) {
        self.step += 1;
        for target in self.engine.attached_targets() {
            let (left, right) = levels(target, self.step);
            self.engine.set_levels(target, left, right);
        }
    }
}

/// Levels for `target` at `step`, in `0..=1`.
fn levels(target: Target, step: u64) -> (f64, f64) {
    let seed = match target {
        Target::Master => 0.0,
        Target::Track(idx) => idx as f64 + 1.0,
    };
    let t = step as f64;
    let base = 0.45 + 0.3 * (t * 0.05 + seed).sin();
    let wobble = 0.1 * (t * 0.31 + seed * 1.7).sin();
    // a short hit every couple of seconds, offset per track
    let hit = if (step + seed as u64 * 13) % 60 < 2 { 0.25 } else { 0.0 };
    let left = base + wobble + hit;
    let right = base - wobble + hit * (0.5 + 0.5 * (seed * PI / 3.0).cos());
    (left.max(0.0).min(1.0), right.max(0.0).min(1.0))
}
