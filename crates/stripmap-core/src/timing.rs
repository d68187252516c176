//! Caller-owned phase timings.
//!
//! A `Timings` value is threaded through `setup` and `solve`; resetting means
//! starting over with `Timings::default()`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Planner phases that are timed separately.
///
/// Pulling track ends off the walls happens while chords are generated and
/// is charged to `LineSweeps`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Decomposition,
    Adjacency,
    LineSweeps,
    VisibilityGraph,
    NodeCreation,
    EdgeCreation,
    SolverSetup,
    Solve,
    Refinement,
}

impl Phase {
    /// Whether the phase belongs to `setup` (as opposed to `solve`).
    pub fn is_setup(self) -> bool {
        matches!(
            self,
            Phase::Decomposition
                | Phase::Adjacency
                | Phase::LineSweeps
                | Phase::VisibilityGraph
                | Phase::NodeCreation
                | Phase::EdgeCreation
        )
    }
}

/// Accumulated wall-clock time per phase, in seconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    seconds: BTreeMap<Phase, f64>,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` to the running total of `phase`.
    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        *self.seconds.entry(phase).or_insert(0.0) += elapsed.as_secs_f64();
    }

    /// Run `f`, charging its wall-clock time to `phase`.
    pub fn time<T>(&mut self, phase: Phase, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = f();
        self.record(phase, started.elapsed());
        out
    }

    /// Seconds spent in `phase` (zero when never recorded).
    pub fn get(&self, phase: Phase) -> f64 {
        self.seconds.get(&phase).copied().unwrap_or(0.0)
    }

    pub fn setup_total(&self) -> f64 {
        self.seconds
            .iter()
            .filter(|(p, _)| p.is_setup())
            .map(|(_, s)| s)
            .sum()
    }

    pub fn solve_total(&self) -> f64 {
        self.seconds
            .iter()
            .filter(|(p, _)| !p.is_setup())
            .map(|(_, s)| s)
            .sum()
    }

    pub fn total(&self) -> f64 {
        self.seconds.values().sum()
    }

    /// Fold another collector into this one.
    pub fn merge(&mut self, other: &Timings) {
        for (&phase, &s) in &other.seconds {
            *self.seconds.entry(phase).or_insert(0.0) += s;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Phase, f64)> + '_ {
        self.seconds.iter().map(|(&p, &s)| (p, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accumulates_and_splits_by_stage() {
        let mut t = Timings::new();
        t.record(Phase::Decomposition, Duration::from_millis(250));
        t.record(Phase::Decomposition, Duration::from_millis(250));
        t.record(Phase::Solve, Duration::from_millis(100));
        assert_relative_eq!(t.get(Phase::Decomposition), 0.5);
        assert_relative_eq!(t.setup_total(), 0.5);
        assert_relative_eq!(t.solve_total(), 0.1);
        assert_relative_eq!(t.total(), 0.6);
        assert_eq!(t.get(Phase::Refinement), 0.0);
    }

    #[test]
    fn time_returns_closure_value() {
        let mut t = Timings::new();
        let v = t.time(Phase::LineSweeps, || 7);
        assert_eq!(v, 7);
        assert!(t.get(Phase::LineSweeps) >= 0.0);

        let mut other = Timings::new();
        other.record(Phase::LineSweeps, Duration::from_secs(1));
        t.merge(&other);
        assert!(t.get(Phase::LineSweeps) >= 1.0);
    }
}
