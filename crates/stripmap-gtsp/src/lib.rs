//! Generalized travelling-salesman search over clusters of two directed
//! traversals, with a fixed start and goal.
//!
//! Every cluster stands for one coverage track that may be walked forwards
//! or backwards. A [`Solver`] orders the clusters and picks a direction for
//! each, minimising total cost and, among equal costs, the number of reversed
//! traversals.
//!
//! ```
//! use stripmap_gtsp::{DenseInstance, Direction, Solver, Visit};
//!
//! let mut inst = DenseInstance::new(2);
//! let f = |c| Visit::new(c, Direction::Forward);
//! inst.set_start_cost(f(0), Some(1.0));
//! inst.set_transition_cost(f(0), f(1), Some(2.0));
//! inst.set_goal_cost(f(1), Some(1.0));
//! let tour = Solver::default().solve(&inst).unwrap();
//! assert_eq!(tour.visits, vec![f(0), f(1)]);
//! assert_eq!(tour.cost, 4.0);
//! ```

mod error;
mod exact;
mod heuristic;
mod instance;
mod solver;

pub use error::GtspError;
pub use instance::{tour_cost, DenseInstance, Direction, GtspInstance, Visit};
pub use solver::{
    check_connectivity, SolveStatus, Solver, SolverParams, Tour, COST_REL_TOL, MAX_EXACT_CLUSTERS,
};
