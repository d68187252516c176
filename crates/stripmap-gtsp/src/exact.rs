//! Held-Karp dynamic programming over (visited set, last cluster, direction).

use crate::error::GtspError;
use crate::instance::{Direction, GtspInstance, Visit};
use crate::solver::{reversal_count, Score, SolveStatus, Tour};

const NO_CHOICE: u8 = u8::MAX;

/// Optimal tour; ties resolve to the lexicographically smallest visit list.
///
/// Values are computed backwards: `best[mask][c][d]` is the cheapest way to
/// finish the tour after walking cluster `c` in direction `d` with `mask`
/// already visited. Scanning successors in ascending order and keeping the
/// first of equal scores makes every step pick the smallest continuation.
pub(crate) fn solve<I: GtspInstance + ?Sized>(instance: &I) -> Result<Tour, GtspError> {
    let n = instance.cluster_count();
    let full = (1usize << n) - 1;
    let idx = |mask: usize, c: usize, d: usize| (mask * n + c) * 2 + d;
    let size = (full + 1) * n * 2;

    let mut cost = vec![f64::INFINITY; size];
    let mut reversals = vec![0u8; size];
    let mut next = vec![NO_CHOICE; size];

    for mask in (1..=full).rev() {
        for c in (0..n).filter(|&c| mask & (1 << c) != 0) {
            for d in Direction::ALL {
                let here = Visit::new(c, d);
                let mut best = Score::INFEASIBLE;
                let mut choice = NO_CHOICE;
                if mask == full {
                    if let Some(g) = instance.goal_cost(here) {
                        best = Score {
                            cost: g,
                            reversals: 0,
                        };
                    }
                } else {
                    for c2 in (0..n).filter(|&c2| mask & (1 << c2) == 0) {
                        let m2 = mask | (1 << c2);
                        for d2 in Direction::ALL {
                            let j = idx(m2, c2, d2.index());
                            if !cost[j].is_finite() {
                                continue;
                            }
                            let Some(t) = instance.transition_cost(here, Visit::new(c2, d2)) else {
                                continue;
                            };
                            let cand = Score {
                                cost: t + cost[j],
                                reversals: usize::from(reversals[j]),
                            };
                            if cand.better_than(&best) {
                                best = cand;
                                choice = (2 * c2 + d2.index()) as u8;
                            }
                        }
                    }
                }
                if best.is_feasible() {
                    let i = idx(mask, c, d.index());
                    cost[i] = best.cost + instance.visit_cost(here);
                    reversals[i] = (best.reversals + reversal_count(d)) as u8;
                    next[i] = choice;
                }
            }
        }
    }

    let mut root = Score::INFEASIBLE;
    let mut first = None;
    for c in 0..n {
        for d in Direction::ALL {
            let i = idx(1 << c, c, d.index());
            if !cost[i].is_finite() {
                continue;
            }
            let Some(s) = instance.start_cost(Visit::new(c, d)) else {
                continue;
            };
            let cand = Score {
                cost: s + cost[i],
                reversals: usize::from(reversals[i]),
            };
            if cand.better_than(&root) {
                root = cand;
                first = Some(Visit::new(c, d));
            }
        }
    }
    let Some(mut current) = first else {
        return Err(GtspError::Infeasible);
    };

    let mut visits = Vec::with_capacity(n);
    let mut mask = 1 << current.cluster;
    loop {
        visits.push(current);
        if mask == full {
            break;
        }
        let choice = next[idx(mask, current.cluster, current.direction.index())];
        if choice == NO_CHOICE {
            return Err(GtspError::Infeasible);
        }
        let c = usize::from(choice / 2);
        current = Visit::new(c, Direction::from_index(usize::from(choice % 2)));
        mask |= 1 << c;
    }

    Ok(Tour {
        visits,
        cost: root.cost,
        status: SolveStatus::Optimal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::DenseInstance;

    #[test]
    fn picks_the_cheaper_direction() {
        let mut inst = DenseInstance::new(2);
        let f = |c| Visit::new(c, Direction::Forward);
        let r = |c| Visit::new(c, Direction::Reverse);
        for a in [f(0), r(0)] {
            inst.set_start_cost(a, Some(1.0));
            for b in [f(1), r(1)] {
                inst.set_transition_cost(a, b, Some(1.0));
                inst.set_goal_cost(b, Some(1.0));
            }
        }
        // Walking cluster 1 backwards lands next to the goal.
        inst.set_goal_cost(r(1), Some(0.5));
        let tour = solve(&inst).expect("feasible");
        assert_eq!(tour.visits, vec![f(0), r(1)]);
        assert_eq!(tour.cost, 2.5);
    }
}
