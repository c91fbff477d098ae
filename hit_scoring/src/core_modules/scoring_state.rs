// THEORY:
// `ScoringState` is the only analysis state that outlives a frame cycle. It holds
// the running total and the time of the last accepted hit, which the hit resolver
// reads for its cooldown. Only the accepted-hit path of the pipeline writes to it,
// and a new frame source resets it.

use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringState {
    total: u32,
    last_hit: Option<Instant>,
}

impl ScoringState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the points of one accepted hit. Saturates rather than wrapping so the
    /// total never decreases.
    pub fn add_points(&mut self, points: u32) {
        self.total = self.total.saturating_add(points);
    }

    pub fn record_hit(&mut self, timestamp: Instant) {
        self.last_hit = Some(timestamp);
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn last_hit(&self) -> Option<Instant> {
        self.last_hit
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.last_hit = None;
    }
}
