//! Depth-first construction followed by 2-opt and relocate local search.

use crate::error::GtspError;
use crate::instance::{Direction, GtspInstance, Visit};
use crate::solver::{reversal_count, Budget, Score, SolveStatus, Tour};

/// One level of the construction search: ranked options for the next visit.
struct Frame {
    candidates: Vec<Visit>,
    next: usize,
}

pub(crate) fn solve<I: GtspInstance + ?Sized>(
    instance: &I,
    budget: &mut Budget,
) -> Result<Tour, GtspError> {
    let initial = construct(instance, budget)?;
    let order: Vec<usize> = initial.iter().map(|v| v.cluster).collect();
    let Some((score, visits)) = assign_directions(instance, &order) else {
        return Err(GtspError::Infeasible);
    };
    log::debug!(
        "constructed tour over {} clusters, cost {:.3}",
        order.len(),
        score.cost
    );
    Ok(improve(instance, order, score, visits, budget))
}

/// Feasible visit sequence, preferring cheap steps and backtracking on dead
/// ends.
fn construct<I: GtspInstance + ?Sized>(
    instance: &I,
    budget: &mut Budget,
) -> Result<Vec<Visit>, GtspError> {
    let n = instance.cluster_count();
    let mut visited = vec![false; n];
    let mut path: Vec<Visit> = Vec::with_capacity(n);

    let starts = rank(
        (0..n).flat_map(|c| Direction::ALL.map(|d| Visit::new(c, d))),
        |v| instance.start_cost(v).map(|s| s + instance.visit_cost(v)),
    );
    // Frame k picks path[k]; popping frame k + 1 undoes path[k].
    let mut stack = vec![Frame {
        candidates: starts,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if budget.tick() {
            return Err(GtspError::Timeout);
        }
        let Some(&v) = frame.candidates.get(frame.next) else {
            stack.pop();
            if let Some(undone) = path.pop() {
                visited[undone.cluster] = false;
            }
            continue;
        };
        frame.next += 1;

        if path.len() + 1 == n {
            if instance.goal_cost(v).is_some() {
                path.push(v);
                return Ok(path);
            }
            continue;
        }
        path.push(v);
        visited[v.cluster] = true;
        let candidates = rank(
            (0..n)
                .filter(|&c| !visited[c])
                .flat_map(|c| Direction::ALL.map(|d| Visit::new(c, d))),
            |w| {
                instance
                    .transition_cost(v, w)
                    .map(|t| t + instance.visit_cost(w))
            },
        );
        stack.push(Frame {
            candidates,
            next: 0,
        });
    }
    Err(GtspError::Infeasible)
}

/// Visits with a defined cost, cheapest first; ties keep generation order.
fn rank(visits: impl Iterator<Item = Visit>, cost: impl Fn(Visit) -> Option<f64>) -> Vec<Visit> {
    let mut ranked: Vec<(f64, Visit)> = visits
        .filter_map(|v| cost(v).filter(|c| c.is_finite()).map(|c| (c, v)))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.into_iter().map(|(_, v)| v).collect()
}

/// Best directions for a fixed cluster order.
///
/// Forward is preferred on ties at every step.
pub(crate) fn assign_directions<I: GtspInstance + ?Sized>(
    instance: &I,
    order: &[usize],
) -> Option<(Score, Vec<Visit>)> {
    let (&head, rest) = order.split_first()?;
    let mut best = Direction::ALL.map(|d| {
        let v = Visit::new(head, d);
        instance
            .start_cost(v)
            .map(|s| Score {
                cost: s + instance.visit_cost(v),
                reversals: reversal_count(d),
            })
            .unwrap_or(Score::INFEASIBLE)
    });
    let mut back: Vec<[usize; 2]> = Vec::with_capacity(rest.len());
    let mut prev_cluster = head;

    for &c in rest {
        let mut layer = [Score::INFEASIBLE; 2];
        let mut from = [0usize; 2];
        for d in Direction::ALL {
            let to = Visit::new(c, d);
            for pd in Direction::ALL {
                let prev = best[pd.index()];
                if !prev.is_feasible() {
                    continue;
                }
                let Some(t) = instance.transition_cost(Visit::new(prev_cluster, pd), to) else {
                    continue;
                };
                let cand = Score {
                    cost: prev.cost + t + instance.visit_cost(to),
                    reversals: prev.reversals + reversal_count(d),
                };
                if cand.better_than(&layer[d.index()]) {
                    layer[d.index()] = cand;
                    from[d.index()] = pd.index();
                }
            }
        }
        best = layer;
        back.push(from);
        prev_cluster = c;
    }

    let mut total = Score::INFEASIBLE;
    let mut last = 0;
    for d in Direction::ALL {
        let s = best[d.index()];
        if !s.is_feasible() {
            continue;
        }
        let Some(g) = instance.goal_cost(Visit::new(prev_cluster, d)) else {
            continue;
        };
        let cand = Score {
            cost: s.cost + g,
            reversals: s.reversals,
        };
        if cand.better_than(&total) {
            total = cand;
            last = d.index();
        }
    }
    if !total.is_feasible() {
        return None;
    }

    let mut dirs = vec![0usize; order.len()];
    dirs[order.len() - 1] = last;
    for k in (1..order.len()).rev() {
        dirs[k - 1] = back[k - 1][dirs[k]];
    }
    let visits = order
        .iter()
        .zip(dirs)
        .map(|(&c, d)| Visit::new(c, Direction::from_index(d)))
        .collect();
    Some((total, visits))
}

/// First-improvement local search until no move helps or the budget ends.
fn improve<I: GtspInstance + ?Sized>(
    instance: &I,
    mut order: Vec<usize>,
    mut score: Score,
    mut visits: Vec<Visit>,
    budget: &mut Budget,
) -> Tour {
    let n = order.len();
    let finish = |visits: Vec<Visit>, score: Score, status| Tour {
        visits,
        cost: score.cost,
        status,
    };

    'search: loop {
        let mut candidate = order.clone();
        // 2-opt: reverse order[i..=j].
        for i in 0..n {
            for j in i + 1..n {
                if budget.tick() {
                    return finish(visits, score, SolveStatus::BudgetExhausted);
                }
                candidate.copy_from_slice(&order);
                candidate[i..=j].reverse();
                if let Some((s, v)) = accept(instance, &candidate, &score, &visits) {
                    std::mem::swap(&mut order, &mut candidate);
                    score = s;
                    visits = v;
                    continue 'search;
                }
            }
        }
        // Relocate: move order[i] to position j.
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                if budget.tick() {
                    return finish(visits, score, SolveStatus::BudgetExhausted);
                }
                candidate.copy_from_slice(&order);
                let c = candidate.remove(i);
                candidate.insert(j, c);
                if let Some((s, v)) = accept(instance, &candidate, &score, &visits) {
                    std::mem::swap(&mut order, &mut candidate);
                    score = s;
                    visits = v;
                    continue 'search;
                }
            }
        }
        return finish(visits, score, SolveStatus::LocalOptimum);
    }
}

/// Score and visits of `order` when it beats the incumbent, or ties it with a
/// lexicographically smaller visit list.
fn accept<I: GtspInstance + ?Sized>(
    instance: &I,
    order: &[usize],
    score: &Score,
    visits: &[Visit],
) -> Option<(Score, Vec<Visit>)> {
    let (s, v) = assign_directions(instance, order)?;
    let wins = s.better_than(score) || (s.ties_with(score) && v.as_slice() < visits);
    wins.then_some((s, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::DenseInstance;
    use crate::solver::SolverParams;

    fn line_instance(n: usize) -> DenseInstance {
        // Clusters on a line; moving between neighbours is cheap.
        let mut inst = DenseInstance::new(n);
        for a in 0..n {
            for da in Direction::ALL {
                let va = Visit::new(a, da);
                inst.set_visit_cost(va, 1.0);
                inst.set_start_cost(va, Some(a as f64));
                inst.set_goal_cost(va, Some((n - 1 - a) as f64));
                for b in (0..n).filter(|&b| b != a) {
                    for db in Direction::ALL {
                        let d = (a as f64 - b as f64).abs();
                        inst.set_transition_cost(va, Visit::new(b, db), Some(d));
                    }
                }
            }
        }
        inst
    }

    #[test]
    fn directions_prefer_forward_on_ties() {
        let inst = line_instance(3);
        let (score, visits) = assign_directions(&inst, &[0, 1, 2]).expect("feasible");
        assert_eq!(score.reversals, 0);
        assert!(visits.iter().all(|v| v.direction == Direction::Forward));
        assert_eq!(score.cost, 5.0);
    }

    #[test]
    fn local_search_sorts_the_line() {
        let inst = line_instance(6);
        let mut budget = Budget::new(&SolverParams::default());
        let tour = solve(&inst, &mut budget).expect("feasible");
        let order: Vec<usize> = tour.visits.iter().map(|v| v.cluster).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(tour.status, SolveStatus::LocalOptimum);
    }

    #[test]
    fn zero_step_budget_times_out() {
        let inst = line_instance(4);
        let mut budget = Budget::new(&SolverParams {
            max_iterations: 0,
            ..SolverParams::default()
        });
        assert_eq!(solve(&inst, &mut budget), Err(GtspError::Timeout));
    }
}
