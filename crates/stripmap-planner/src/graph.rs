//! Sweep-plan graph: one cluster of two directed traversals per cell.
//!
//! Cluster `c` is the track of cell `c`. Transition costs are evaluated once
//! during setup; start and goal costs are attached per query through
//! [`AnchoredGraph`], so the graph itself is never mutated by a solve.

use crate::error::GraphError;
use crate::params::TransitMode;
use nalgebra::Point2;
use stripmap_core::{PathCost, Phase, PolygonWithHoles, Timings, VisibilityGraph};
use stripmap_decomposition::AdjacencyGraph;
use stripmap_gtsp::{DenseInstance, Direction, GtspInstance, Visit};
use stripmap_sweep::Track;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Entry and exit points of a track walked in `direction`.
pub fn endpoints(track: &Track, direction: Direction) -> (Point2<f64>, Point2<f64>) {
    match direction {
        Direction::Forward => (track.first(), track.last()),
        Direction::Reverse => (track.last(), track.first()),
    }
}

/// Track polyline walked in `direction`.
pub fn oriented_points(track: &Track, direction: Direction) -> Vec<Point2<f64>> {
    match direction {
        Direction::Forward => track.points().to_vec(),
        Direction::Reverse => track.reversed_points(),
    }
}

/// Free-space router shared by graph construction and path assembly.
#[derive(Clone, Debug)]
pub struct TransitRouter {
    graph: VisibilityGraph,
}

impl TransitRouter {
    pub fn new(polygon: &PolygonWithHoles) -> Self {
        Self {
            graph: VisibilityGraph::new(polygon),
        }
    }

    #[inline]
    pub fn polygon(&self) -> &PolygonWithHoles {
        self.graph.polygon()
    }

    /// Shortest free-space polyline between two points, both included.
    pub fn route(&self, from: &Point2<f64>, to: &Point2<f64>) -> Option<Vec<Point2<f64>>> {
        if (to - from).norm() <= self.polygon().tolerance() {
            return Some(vec![*from]);
        }
        self.graph.shortest_path(from, to)
    }

    /// Straight-line visibility between two points.
    pub fn sees(&self, from: &Point2<f64>, to: &Point2<f64>) -> bool {
        self.polygon().segment_in_free_space(from, to)
    }
}

/// Clusters, their traversal costs and the transitions between them.
#[derive(Clone, Debug)]
pub struct SweepPlanGraph {
    tracks: Vec<Track>,
    instance: DenseInstance,
    edge_count: usize,
}

/// Edge policy inputs.
pub(crate) struct EdgePolicy<'a> {
    pub adjacency: &'a AdjacencyGraph,
    pub sweep_around_obstacles: bool,
    pub transit: TransitMode,
}

impl SweepPlanGraph {
    /// Build the graph; fails when some cell ends up without any transition.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(cells = tracks.len())))]
    pub(crate) fn build(
        tracks: Vec<Track>,
        router: &TransitRouter,
        cost: &dyn PathCost,
        policy: &EdgePolicy<'_>,
        timings: &mut Timings,
    ) -> Result<Self, GraphError> {
        let n = tracks.len();
        let mut instance = DenseInstance::new(n);
        timings.time(Phase::NodeCreation, || {
            for (c, track) in tracks.iter().enumerate() {
                for d in Direction::ALL {
                    instance.set_visit_cost(Visit::new(c, d), cost.cost(&oriented_points(track, d)));
                }
            }
        });

        let started = std::time::Instant::now();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|a| (0..n).filter(move |&b| b != a).map(move |b| (a, b)))
            .collect();
        let link = |&(a, b): &(usize, usize)| link_costs(&tracks, a, b, router, cost, policy);
        #[cfg(feature = "rayon")]
        let costs: Vec<[[Option<f64>; 2]; 2]> = pairs.par_iter().map(link).collect();
        #[cfg(not(feature = "rayon"))]
        let costs: Vec<[[Option<f64>; 2]; 2]> = pairs.iter().map(link).collect();

        let mut edge_count = 0;
        let mut linked = vec![false; n];
        for (&(a, b), table) in pairs.iter().zip(&costs) {
            for da in Direction::ALL {
                for db in Direction::ALL {
                    let c = table[da.index()][db.index()];
                    if c.is_some() {
                        edge_count += 1;
                        linked[a] = true;
                        linked[b] = true;
                    }
                    instance.set_transition_cost(Visit::new(a, da), Visit::new(b, db), c);
                }
            }
        }
        timings.record(Phase::EdgeCreation, started.elapsed());
        if n > 1 {
            if let Some(cell) = linked.iter().position(|&l| !l) {
                return Err(GraphError::IsolatedCell { cell });
            }
        }
        log::info!("sweep-plan graph: {n} clusters, {edge_count} edges");

        Ok(Self {
            tracks,
            instance,
            edge_count,
        })
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.tracks.len()
    }

    /// Directed edges between traversals of different clusters.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn instance(&self) -> &DenseInstance {
        &self.instance
    }

    /// Attach a start and goal for one query.
    pub fn anchored(
        &self,
        start: &Point2<f64>,
        goal: &Point2<f64>,
        router: &TransitRouter,
        cost: &dyn PathCost,
    ) -> AnchoredGraph<'_> {
        let mut start_costs = Vec::with_capacity(2 * self.tracks.len());
        let mut goal_costs = Vec::with_capacity(2 * self.tracks.len());
        for track in &self.tracks {
            for d in Direction::ALL {
                let (entry, exit) = endpoints(track, d);
                start_costs.push(router.route(start, &entry).map(|p| cost.cost(&p)));
                goal_costs.push(router.route(&exit, goal).map(|p| cost.cost(&p)));
            }
        }
        AnchoredGraph {
            graph: self,
            start_costs,
            goal_costs,
        }
    }
}

fn link_costs(
    tracks: &[Track],
    a: usize,
    b: usize,
    router: &TransitRouter,
    cost: &dyn PathCost,
    policy: &EdgePolicy<'_>,
) -> [[Option<f64>; 2]; 2] {
    let adjacent = policy.adjacency.are_adjacent(a, b);
    let mut table = [[None; 2]; 2];
    if !adjacent && !policy.sweep_around_obstacles {
        return table;
    }
    for da in Direction::ALL {
        let (_, exit) = endpoints(&tracks[a], da);
        for db in Direction::ALL {
            let (entry, _) = endpoints(&tracks[b], db);
            if !adjacent && policy.transit == TransitMode::StraightLine && !router.sees(&exit, &entry) {
                continue;
            }
            table[da.index()][db.index()] = router.route(&exit, &entry).map(|p| cost.cost(&p));
        }
    }
    table
}

/// The sweep-plan graph with one query's start and goal attached.
pub struct AnchoredGraph<'a> {
    graph: &'a SweepPlanGraph,
    start_costs: Vec<Option<f64>>,
    goal_costs: Vec<Option<f64>>,
}

impl AnchoredGraph<'_> {
    #[inline]
    fn node(v: Visit) -> usize {
        2 * v.cluster + v.direction.index()
    }

    /// True when at least one traversal can be entered from the start and one
    /// can reach the goal.
    pub fn is_anchored(&self) -> bool {
        self.start_costs.iter().any(Option::is_some) && self.goal_costs.iter().any(Option::is_some)
    }
}

impl GtspInstance for AnchoredGraph<'_> {
    fn cluster_count(&self) -> usize {
        self.graph.cluster_count()
    }

    fn visit_cost(&self, visit: Visit) -> f64 {
        self.graph.instance.visit_cost(visit)
    }

    fn start_cost(&self, visit: Visit) -> Option<f64> {
        self.start_costs[Self::node(visit)]
    }

    fn goal_cost(&self, visit: Visit) -> Option<f64> {
        self.goal_costs[Self::node(visit)]
    }

    fn transition_cost(&self, from: Visit, to: Visit) -> Option<f64> {
        self.graph.instance.transition_cost(from, to)
    }
}
