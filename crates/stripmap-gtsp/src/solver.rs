use crate::error::GtspError;
use crate::instance::{Direction, GtspInstance, Visit};
use crate::{exact, heuristic};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Largest instance the exact solver accepts regardless of configuration.
pub const MAX_EXACT_CLUSTERS: usize = 16;

/// Relative tolerance under which two tour costs count as equal.
pub const COST_REL_TOL: f64 = 1e-9;

/// Solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Instances with at most this many clusters are solved exactly.
    pub exact_cluster_limit: usize,
    /// Wall-clock budget for the heuristic, in seconds.
    pub time_budget_secs: f64,
    /// Cap on search steps for the heuristic (construction nodes plus moves).
    pub max_iterations: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            exact_cluster_limit: 12,
            time_budget_secs: 2.0,
            max_iterations: 1_000_000,
        }
    }
}

/// How a returned tour was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// No 2-opt or relocate move improves the tour.
    LocalOptimum,
    /// Best tour found before the budget ran out.
    BudgetExhausted,
}

/// Ordered cluster visits from start to goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub visits: Vec<Visit>,
    pub cost: f64,
    pub status: SolveStatus,
}

impl Tour {
    pub fn reversals(&self) -> usize {
        self.visits
            .iter()
            .filter(|v| v.direction.is_reverse())
            .count()
    }
}

/// Tour quality used for every comparison: cost first, then the number of
/// reversed traversals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Score {
    pub cost: f64,
    pub reversals: usize,
}

impl Score {
    pub const INFEASIBLE: Score = Score {
        cost: f64::INFINITY,
        reversals: usize::MAX,
    };

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }

    pub fn better_than(&self, other: &Score) -> bool {
        if !other.is_feasible() {
            return self.is_feasible();
        }
        if !self.is_feasible() {
            return false;
        }
        if costs_equal(self.cost, other.cost) {
            self.reversals < other.reversals
        } else {
            self.cost < other.cost
        }
    }

    pub fn ties_with(&self, other: &Score) -> bool {
        self.is_feasible()
            && other.is_feasible()
            && costs_equal(self.cost, other.cost)
            && self.reversals == other.reversals
    }
}

#[inline]
pub(crate) fn costs_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= COST_REL_TOL * a.abs().max(b.abs()).max(1.0)
}

#[inline]
pub(crate) fn reversal_count(d: Direction) -> usize {
    d.index()
}

/// Step and wall-clock budget shared by the heuristic phases.
pub(crate) struct Budget {
    deadline: Option<Instant>,
    steps: usize,
    max_steps: usize,
}

impl Budget {
    pub fn new(params: &SolverParams) -> Self {
        let secs = params.time_budget_secs;
        let deadline = if secs.is_nan() || secs <= 0.0 {
            Some(Instant::now())
        } else if secs.is_finite() {
            Instant::now().checked_add(Duration::from_secs_f64(secs.min(1e9)))
        } else {
            None
        };
        Self {
            deadline,
            steps: 0,
            max_steps: params.max_iterations,
        }
    }

    /// Count one step; true once the budget is spent.
    pub fn tick(&mut self) -> bool {
        self.steps += 1;
        if self.steps > self.max_steps {
            return true;
        }
        // Checking the clock every step dominates small instances.
        self.steps % 64 == 0 && self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Generalized TSP solver: exact dynamic programming for small instances,
/// construction plus local search otherwise.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    params: SolverParams,
}

impl Solver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(clusters = instance.cluster_count())))]
    pub fn solve<I: GtspInstance + ?Sized>(&self, instance: &I) -> Result<Tour, GtspError> {
        let n = instance.cluster_count();
        if n == 0 {
            return Ok(Tour {
                visits: Vec::new(),
                cost: 0.0,
                status: SolveStatus::Optimal,
            });
        }
        check_connectivity(instance)?;
        let tour = if n <= self.params.exact_cluster_limit.min(MAX_EXACT_CLUSTERS) {
            exact::solve(instance)?
        } else {
            heuristic::solve(instance, &mut Budget::new(&self.params))?
        };
        log::debug!(
            "tour over {n} clusters: cost {:.3}, {} reversals, {:?}",
            tour.cost,
            tour.reversals(),
            tour.status
        );
        Ok(tour)
    }
}

/// Every cluster must be reachable from the start and able to reach the goal.
pub fn check_connectivity<I: GtspInstance + ?Sized>(instance: &I) -> Result<(), GtspError> {
    let n = instance.cluster_count();
    let links = |a: usize, b: usize| {
        Direction::ALL.iter().any(|&da| {
            Direction::ALL.iter().any(|&db| {
                instance
                    .transition_cost(Visit::new(a, da), Visit::new(b, db))
                    .is_some()
            })
        })
    };
    let mut succ = vec![Vec::new(); n];
    let mut pred = vec![Vec::new(); n];
    for a in 0..n {
        for b in 0..n {
            if a != b && links(a, b) {
                succ[a].push(b);
                pred[b].push(a);
            }
        }
    }
    let any_dir = |f: &dyn Fn(Visit) -> bool, c: usize| {
        Direction::ALL.iter().any(|&d| f(Visit::new(c, d)))
    };
    let from_start = reach(
        &succ,
        (0..n).filter(|&c| any_dir(&|v| instance.start_cost(v).is_some(), c)),
    );
    let to_goal = reach(
        &pred,
        (0..n).filter(|&c| any_dir(&|v| instance.goal_cost(v).is_some(), c)),
    );
    let clusters: Vec<usize> = (0..n).filter(|&c| !(from_start[c] && to_goal[c])).collect();
    if clusters.is_empty() {
        Ok(())
    } else {
        Err(GtspError::Disconnected { clusters })
    }
}

fn reach(adj: &[Vec<usize>], seeds: impl Iterator<Item = usize>) -> Vec<bool> {
    let mut seen = vec![false; adj.len()];
    let mut queue = VecDeque::new();
    for s in seeds {
        if !seen[s] {
            seen[s] = true;
            queue.push_back(s);
        }
    }
    while let Some(c) = queue.pop_front() {
        for &n in &adj[c] {
            if !seen[n] {
                seen[n] = true;
                queue.push_back(n);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::DenseInstance;

    #[test]
    fn score_ordering() {
        let a = Score {
            cost: 10.0,
            reversals: 2,
        };
        let b = Score {
            cost: 10.0 + 1e-12,
            reversals: 1,
        };
        let c = Score {
            cost: 9.0,
            reversals: 5,
        };
        assert!(b.better_than(&a));
        assert!(c.better_than(&b));
        assert!(a.better_than(&Score::INFEASIBLE));
        assert!(!Score::INFEASIBLE.better_than(&a));
        assert!(!Score::INFEASIBLE.better_than(&Score::INFEASIBLE));
    }

    #[test]
    fn unreachable_cluster_is_reported() {
        let mut inst = DenseInstance::new(3);
        let v = |c| Visit::new(c, Direction::Forward);
        inst.set_start_cost(v(0), Some(1.0));
        inst.set_transition_cost(v(0), v(1), Some(1.0));
        inst.set_goal_cost(v(1), Some(1.0));
        inst.set_goal_cost(v(2), Some(1.0));
        assert_eq!(
            check_connectivity(&inst),
            Err(GtspError::Disconnected { clusters: vec![2] })
        );
    }

    #[test]
    fn zero_budget_still_allows_exact_solve() {
        let mut inst = DenseInstance::new(1);
        let v = Visit::new(0, Direction::Forward);
        inst.set_start_cost(v, Some(1.0));
        inst.set_goal_cost(v, Some(2.0));
        let solver = Solver::new(SolverParams {
            time_budget_secs: 0.0,
            ..SolverParams::default()
        });
        let tour = solver.solve(&inst).expect("solvable");
        assert_eq!(tour.visits, vec![v]);
        assert_eq!(tour.cost, 3.0);
        assert_eq!(tour.status, SolveStatus::Optimal);
    }
}
