use serde::{Deserialize, Serialize};

/// Which way a cluster's track is traversed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Reverse];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    #[inline]
    pub fn from_index(i: usize) -> Self {
        if i == 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Direction::Reverse
    }
}

/// One step of a tour: a cluster and the direction its track is walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Visit {
    pub cluster: usize,
    pub direction: Direction,
}

impl Visit {
    pub fn new(cluster: usize, direction: Direction) -> Self {
        Self { cluster, direction }
    }
}

/// A generalized TSP with a fixed start and goal.
///
/// Every cluster must be visited exactly once in one of two directions.
/// `None` marks a missing edge.
pub trait GtspInstance: Sync {
    fn cluster_count(&self) -> usize;

    /// Cost of walking the cluster's own track.
    fn visit_cost(&self, visit: Visit) -> f64;

    /// Start to the entry of `visit`.
    fn start_cost(&self, visit: Visit) -> Option<f64>;

    /// Exit of `visit` to the goal.
    fn goal_cost(&self, visit: Visit) -> Option<f64>;

    /// Exit of `from` to the entry of `to`.
    fn transition_cost(&self, from: Visit, to: Visit) -> Option<f64>;
}

/// Total cost of a tour, or `None` when it uses a missing edge.
pub fn tour_cost<I: GtspInstance + ?Sized>(instance: &I, visits: &[Visit]) -> Option<f64> {
    let (first, last) = match (visits.first(), visits.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Some(0.0),
    };
    let mut cost = instance.start_cost(first)? + instance.goal_cost(last)?;
    for v in visits {
        cost += instance.visit_cost(*v);
    }
    for w in visits.windows(2) {
        cost += instance.transition_cost(w[0], w[1])?;
    }
    Some(cost)
}

/// Dense cost tables; node `2 * cluster + direction` indexes the traversals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseInstance {
    clusters: usize,
    visit: Vec<f64>,
    start: Vec<Option<f64>>,
    goal: Vec<Option<f64>>,
    transition: Vec<Option<f64>>,
}

impl DenseInstance {
    /// An instance with zero visit costs and no edges.
    pub fn new(clusters: usize) -> Self {
        let nodes = 2 * clusters;
        Self {
            clusters,
            visit: vec![0.0; nodes],
            start: vec![None; nodes],
            goal: vec![None; nodes],
            transition: vec![None; nodes * nodes],
        }
    }

    #[inline]
    fn node(v: Visit) -> usize {
        2 * v.cluster + v.direction.index()
    }

    pub fn set_visit_cost(&mut self, visit: Visit, cost: f64) {
        self.visit[Self::node(visit)] = cost;
    }

    pub fn set_start_cost(&mut self, visit: Visit, cost: Option<f64>) {
        self.start[Self::node(visit)] = cost;
    }

    pub fn set_goal_cost(&mut self, visit: Visit, cost: Option<f64>) {
        self.goal[Self::node(visit)] = cost;
    }

    pub fn set_transition_cost(&mut self, from: Visit, to: Visit, cost: Option<f64>) {
        let n = 2 * self.clusters;
        self.transition[Self::node(from) * n + Self::node(to)] = cost;
    }
}

impl GtspInstance for DenseInstance {
    fn cluster_count(&self) -> usize {
        self.clusters
    }

    fn visit_cost(&self, visit: Visit) -> f64 {
        self.visit[Self::node(visit)]
    }

    fn start_cost(&self, visit: Visit) -> Option<f64> {
        self.start[Self::node(visit)]
    }

    fn goal_cost(&self, visit: Visit) -> Option<f64> {
        self.goal[Self::node(visit)]
    }

    fn transition_cost(&self, from: Visit, to: Visit) -> Option<f64> {
        if from.cluster == to.cluster {
            return None;
        }
        let n = 2 * self.clusters;
        self.transition[Self::node(from) * n + Self::node(to)]
    }
}
