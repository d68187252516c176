use approx::assert_relative_eq;
use stripmap_gtsp::{
    tour_cost, DenseInstance, Direction, GtspError, GtspInstance, SolveStatus, Solver,
    SolverParams, Visit,
};

/// Small deterministic generator for instance costs.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64) / ((1u64 << 53) as f64)
    }
}

fn random_instance(n: usize, seed: u64, edge_prob: f64) -> DenseInstance {
    let mut rng = Lcg(seed);
    let mut inst = DenseInstance::new(n);
    for c in 0..n {
        for d in Direction::ALL {
            let v = Visit::new(c, d);
            inst.set_visit_cost(v, 1.0 + 5.0 * rng.next_f64());
            inst.set_start_cost(v, Some(10.0 * rng.next_f64()));
            inst.set_goal_cost(v, Some(10.0 * rng.next_f64()));
        }
    }
    for a in 0..n {
        for b in (0..n).filter(|&b| b != a) {
            for da in Direction::ALL {
                for db in Direction::ALL {
                    let cost = 10.0 * rng.next_f64();
                    let present = rng.next_f64() < edge_prob;
                    inst.set_transition_cost(
                        Visit::new(a, da),
                        Visit::new(b, db),
                        present.then_some(cost),
                    );
                }
            }
        }
    }
    inst
}

/// Cheapest tour by enumerating every order and direction assignment.
fn brute_force(inst: &DenseInstance) -> Option<f64> {
    let n = inst.cluster_count();
    let mut order: Vec<usize> = (0..n).collect();
    let mut best: Option<f64> = None;
    permute(&mut order, 0, &mut |order| {
        for bits in 0..(1usize << n) {
            let visits: Vec<Visit> = order
                .iter()
                .enumerate()
                .map(|(k, &c)| Visit::new(c, Direction::from_index((bits >> k) & 1)))
                .collect();
            if let Some(cost) = tour_cost(inst, &visits) {
                best = Some(best.map_or(cost, |b: f64| b.min(cost)));
            }
        }
    });
    best
}

fn permute(items: &mut Vec<usize>, k: usize, visit: &mut dyn FnMut(&[usize])) {
    if k == items.len() {
        visit(items);
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute(items, k + 1, visit);
        items.swap(k, i);
    }
}

fn assert_valid(inst: &DenseInstance, visits: &[Visit]) {
    let mut seen = vec![false; inst.cluster_count()];
    for v in visits {
        assert!(!seen[v.cluster], "cluster {} visited twice", v.cluster);
        seen[v.cluster] = true;
    }
    assert!(seen.iter().all(|&s| s), "not every cluster visited");
}

#[test]
fn exact_matches_brute_force() {
    for seed in 0..12 {
        let inst = random_instance(5, seed, 0.6);
        let expected = brute_force(&inst);
        match (Solver::default().solve(&inst), expected) {
            (Ok(tour), Some(best)) => {
                assert_eq!(tour.status, SolveStatus::Optimal);
                assert_valid(&inst, &tour.visits);
                assert_relative_eq!(tour.cost, best, epsilon = 1e-6);
                let replay = tour_cost(&inst, &tour.visits).expect("tour uses real edges");
                assert_relative_eq!(tour.cost, replay, epsilon = 1e-9);
            }
            (Err(GtspError::Infeasible | GtspError::Disconnected { .. }), None) => {}
            (got, want) => panic!("seed {seed}: solver {got:?}, brute force {want:?}"),
        }
    }
}

#[test]
fn heuristic_finds_valid_tours_no_better_than_optimal() {
    let heuristic = Solver::new(SolverParams {
        exact_cluster_limit: 0,
        ..SolverParams::default()
    });
    for seed in 100..108 {
        let inst = random_instance(6, seed, 1.0);
        let best = brute_force(&inst).expect("complete graph is feasible");
        let tour = heuristic.solve(&inst).expect("complete graph is feasible");
        assert_ne!(tour.status, SolveStatus::Optimal);
        assert_valid(&inst, &tour.visits);
        let replay = tour_cost(&inst, &tour.visits).expect("tour uses real edges");
        assert_relative_eq!(tour.cost, replay, epsilon = 1e-9);
        assert!(tour.cost >= best - 1e-9);
    }
}

#[test]
fn larger_instances_use_the_heuristic() {
    let inst = random_instance(20, 7, 1.0);
    let tour = Solver::default().solve(&inst).expect("feasible");
    assert_eq!(tour.visits.len(), 20);
    assert!(matches!(
        tour.status,
        SolveStatus::LocalOptimum | SolveStatus::BudgetExhausted
    ));
    assert_valid(&inst, &tour.visits);
}

#[test]
fn spent_budget_returns_the_best_tour_so_far() {
    let n = 8;
    let inst = random_instance(n, 21, 1.0);
    let budgeted = |max_iterations| {
        Solver::new(SolverParams {
            exact_cluster_limit: 0,
            time_budget_secs: 60.0,
            max_iterations,
        })
    };

    // Construction takes one step per cluster on a complete graph, leaving
    // two steps of local search.
    let tour = budgeted(n + 2).solve(&inst).expect("constructed tour");
    assert_eq!(tour.status, SolveStatus::BudgetExhausted);
    assert_eq!(tour.visits.len(), n);
    assert_valid(&inst, &tour.visits);
    let replay = tour_cost(&inst, &tour.visits).expect("tour uses real edges");
    assert_relative_eq!(tour.cost, replay, epsilon = 1e-9);

    let unlimited = budgeted(usize::MAX).solve(&inst).expect("feasible");
    assert!(unlimited.cost <= tour.cost + 1e-9);

    // Too few steps to finish construction.
    assert_eq!(budgeted(n - 1).solve(&inst), Err(GtspError::Timeout));
}

#[test]
fn no_hamiltonian_order_is_infeasible() {
    // Start only at 0, goal only after 1; cluster 2 can only return to 0.
    let mut inst = DenseInstance::new(3);
    let f = |c| Visit::new(c, Direction::Forward);
    inst.set_start_cost(f(0), Some(1.0));
    inst.set_goal_cost(f(1), Some(1.0));
    inst.set_transition_cost(f(0), f(1), Some(1.0));
    inst.set_transition_cost(f(0), f(2), Some(1.0));
    inst.set_transition_cost(f(2), f(0), Some(1.0));

    assert_eq!(Solver::default().solve(&inst), Err(GtspError::Infeasible));
    let heuristic = Solver::new(SolverParams {
        exact_cluster_limit: 0,
        ..SolverParams::default()
    });
    assert_eq!(heuristic.solve(&inst), Err(GtspError::Infeasible));
}

#[test]
fn isolated_cluster_is_disconnected() {
    let mut inst = random_instance(4, 3, 1.0);
    for other in [0, 1, 2] {
        for a in Direction::ALL {
            for b in Direction::ALL {
                inst.set_transition_cost(Visit::new(3, a), Visit::new(other, b), None);
                inst.set_transition_cost(Visit::new(other, a), Visit::new(3, b), None);
            }
        }
    }
    for d in Direction::ALL {
        inst.set_start_cost(Visit::new(3, d), None);
        inst.set_goal_cost(Visit::new(3, d), None);
    }
    assert_eq!(
        Solver::default().solve(&inst),
        Err(GtspError::Disconnected { clusters: vec![3] })
    );
}

#[test]
fn equal_costs_resolve_to_the_smallest_forward_order() {
    let mut inst = DenseInstance::new(3);
    for a in 0..3 {
        for da in Direction::ALL {
            let va = Visit::new(a, da);
            inst.set_start_cost(va, Some(0.0));
            inst.set_goal_cost(va, Some(0.0));
            for b in (0..3).filter(|&b| b != a) {
                for db in Direction::ALL {
                    inst.set_transition_cost(va, Visit::new(b, db), Some(1.0));
                }
            }
        }
    }
    let f = |c| Visit::new(c, Direction::Forward);
    for limit in [12, 0] {
        let solver = Solver::new(SolverParams {
            exact_cluster_limit: limit,
            ..SolverParams::default()
        });
        let tour = solver.solve(&inst).expect("feasible");
        assert_eq!(tour.visits, vec![f(0), f(1), f(2)]);
        assert_eq!(tour.reversals(), 0);
        assert_eq!(tour.cost, 2.0);
    }
}

#[test]
fn equal_cost_prefers_fewer_reversals() {
    let mut inst = DenseInstance::new(2);
    let f = |c| Visit::new(c, Direction::Forward);
    let r = |c| Visit::new(c, Direction::Reverse);
    inst.set_start_cost(r(0), Some(1.0));
    inst.set_start_cost(f(1), Some(1.0));
    inst.set_transition_cost(r(0), f(1), Some(1.0));
    inst.set_transition_cost(f(1), f(0), Some(1.0));
    inst.set_goal_cost(f(1), Some(1.0));
    inst.set_goal_cost(f(0), Some(1.0));
    let tour = Solver::default().solve(&inst).expect("feasible");
    assert_eq!(tour.visits, vec![f(1), f(0)]);
    assert_eq!(tour.reversals(), 0);
}

#[test]
fn empty_instance_is_trivially_optimal() {
    let tour = Solver::default().solve(&DenseInstance::new(0)).expect("empty");
    assert!(tour.visits.is_empty());
    assert_eq!(tour.cost, 0.0);
    assert_eq!(tour.status, SolveStatus::Optimal);
}

#[test]
fn params_round_trip_through_json_with_defaults() {
    let params: SolverParams = serde_json::from_str(r#"{"exact_cluster_limit": 4}"#).expect("json");
    assert_eq!(params.exact_cluster_limit, 4);
    assert_eq!(params.max_iterations, SolverParams::default().max_iterations);
}
