use crate::error::{SetupError, SolveError};
use crate::graph::{endpoints, oriented_points, EdgePolicy, SweepPlanGraph, TransitRouter};
use crate::params::{PlannerVariant, Settings};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use stripmap_core::{Phase, SensorError, Timings};
use stripmap_decomposition::Decomposition;
use stripmap_gtsp::{SolveStatus, Solver, Visit};
use stripmap_sweep::{densify_for_coverage, sweep_decomposition, SweepParams, Track};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Lifecycle of a [`Planner`].
///
/// Solving does not change the state: a built planner answers any number of
/// queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerState {
    Uninitialized,
    Decomposed,
    GraphBuilt,
    Failed,
}

/// A coverage path from start to goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub path: Vec<Point2<f64>>,
    /// Cost function applied to `path`.
    pub cost: f64,
    /// Cells in visiting order with their traversal direction.
    pub visits: Vec<Visit>,
    pub status: SolveStatus,
}

/// Data produced by a successful setup.
#[derive(Debug)]
struct Built {
    decomposition: Decomposition,
    router: TransitRouter,
    graph: SweepPlanGraph,
}

/// Coverage planner over one polygon.
///
/// `setup` decomposes the polygon, sweeps every cell and builds the
/// sweep-plan graph; `solve` answers start/goal queries against it and
/// never mutates the planner, so it can be called from several threads.
#[derive(Debug)]
pub struct Planner {
    settings: Settings,
    state: PlannerState,
    built: Option<Built>,
}

impl Planner {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: PlannerState::Uninitialized,
            built: None,
        }
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn state(&self) -> PlannerState {
        self.state
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state == PlannerState::GraphBuilt
    }

    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.built.as_ref().map(|b| &b.decomposition)
    }

    pub fn graph(&self) -> Option<&SweepPlanGraph> {
        self.built.as_ref().map(|b| &b.graph)
    }

    /// Coverage tracks in cell order.
    pub fn tracks(&self) -> &[Track] {
        self.built.as_ref().map_or(&[], |b| b.graph.tracks())
    }

    /// Run every setup stage; on failure the planner holds no partial state.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn setup(&mut self, timings: &mut Timings) -> Result<(), SetupError> {
        self.built = None;
        self.state = PlannerState::Uninitialized;
        match self.build(timings) {
            Ok(built) => {
                log::info!(
                    "planner ready: {} cells, {} graph edges",
                    built.decomposition.cell_count(),
                    built.graph.edge_count()
                );
                self.built = Some(built);
                self.state = PlannerState::GraphBuilt;
                Ok(())
            }
            Err(err) => {
                log::warn!("setup failed: {err}");
                self.state = PlannerState::Failed;
                Err(err)
            }
        }
    }

    fn build(&mut self, timings: &mut Timings) -> Result<Built, SetupError> {
        let settings = &self.settings;
        let sensor = settings.sensor_model.as_ref();
        let width = sensor.footprint_width();
        if !width.is_finite() || width <= 0.0 {
            return Err(SensorError::InvalidWidth(width).into());
        }
        let spacing = sensor.sweep_distance();
        if !spacing.is_finite() || spacing <= 0.0 || spacing > width {
            return Err(SensorError::InvalidOverlap(1.0 - spacing / width).into());
        }

        let decomposition = timings.time(Phase::Decomposition, || {
            settings
                .decomposer
                .decompose(&settings.polygon, settings.params.sweep_direction, spacing)
        })?;
        self.state = PlannerState::Decomposed;
        log::debug!(
            "{:?} decomposition: {} cells at direction {:.4}",
            settings.decomposer.kind(),
            decomposition.cell_count(),
            decomposition.direction()
        );

        let adjacency = timings.time(Phase::Adjacency, || decomposition.adjacency());
        let sweep_params = SweepParams {
            inset_ends: settings.params.offset_polygons,
        };
        let tracks = timings.time(Phase::LineSweeps, || {
            sweep_decomposition(&decomposition, sensor, &sweep_params)
        });
        let router = timings.time(Phase::VisibilityGraph, || {
            TransitRouter::new(&settings.polygon)
        });
        let policy = EdgePolicy {
            adjacency: &adjacency,
            sweep_around_obstacles: settings.params.sweep_around_obstacles,
            transit: settings.params.transit,
        };
        let cost = settings.cost_function.as_ref();
        let graph = SweepPlanGraph::build(tracks, &router, cost, &policy, timings)?;

        Ok(Built {
            decomposition,
            router,
            graph,
        })
    }

    /// Plan a coverage path from `start` to `goal`.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn solve(
        &self,
        start: Point2<f64>,
        goal: Point2<f64>,
        timings: &mut Timings,
    ) -> Result<Solution, SolveError> {
        let built = match (&self.built, self.state) {
            (Some(built), PlannerState::GraphBuilt) => built,
            _ => return Err(SolveError::NotInitialized),
        };
        let polygon = &self.settings.polygon;
        if !polygon.contains(&start) {
            return Err(SolveError::StartOutside {
                x: start.x,
                y: start.y,
            });
        }
        if !polygon.contains(&goal) {
            return Err(SolveError::GoalOutside {
                x: goal.x,
                y: goal.y,
            });
        }

        let cost = self.settings.cost_function.as_ref();
        let (anchored, solver) = timings.time(Phase::SolverSetup, || {
            (
                built.graph.anchored(&start, &goal, &built.router, cost),
                Solver::new(self.settings.params.solver.clone()),
            )
        });
        if !anchored.is_anchored() {
            return Err(SolveError::Unreachable);
        }
        let tour = timings.time(Phase::Solve, || solver.solve(&anchored))?;

        let mut tracks: Vec<Track> = tour
            .visits
            .iter()
            .map(|v| built.graph.tracks()[v.cluster].clone())
            .collect();
        if self.settings.params.variant == PlannerVariant::Exact {
            tracks = timings.time(Phase::Refinement, || self.densify(built, &tour.visits));
        }

        let path = assemble(&built.router, &start, &goal, &tracks, &tour.visits)?;
        let total = cost.cost(&path);
        log::info!(
            "solved: {} cells, cost {total:.3} (solver {:.3}), {:?}",
            tour.visits.len(),
            tour.cost,
            tour.status
        );
        Ok(Solution {
            path,
            cost: total,
            visits: tour.visits,
            status: tour.status,
        })
    }

    /// Densified track for every visit, in visiting order.
    fn densify(&self, built: &Built, visits: &[Visit]) -> Vec<Track> {
        let sensor = self.settings.sensor_model.as_ref();
        let cells = built.decomposition.cells();
        let tracks = built.graph.tracks();
        let refine = |v: &Visit| densify_for_coverage(&cells[v.cluster], &tracks[v.cluster], sensor);
        #[cfg(feature = "rayon")]
        let out: Vec<Track> = visits.par_iter().map(refine).collect();
        #[cfg(not(feature = "rayon"))]
        let out: Vec<Track> = visits.iter().map(refine).collect();
        out
    }
}

/// Concatenate transits and oriented tracks into one polyline.
fn assemble(
    router: &TransitRouter,
    start: &Point2<f64>,
    goal: &Point2<f64>,
    tracks: &[Track],
    visits: &[Visit],
) -> Result<Vec<Point2<f64>>, SolveError> {
    let tol = router.polygon().tolerance();
    let mut path = vec![*start];
    let push_all = |path: &mut Vec<Point2<f64>>, pts: &[Point2<f64>]| {
        for p in pts {
            if path.last().is_none_or(|q| (p - q).norm() > tol) {
                path.push(*p);
            }
        }
    };
    for (track, visit) in tracks.iter().zip(visits) {
        let (entry, _) = endpoints(track, visit.direction);
        let here = path.last().copied().unwrap_or(*start);
        let transit = router.route(&here, &entry).ok_or(SolveError::Unreachable)?;
        push_all(&mut path, &transit);
        push_all(&mut path, &oriented_points(track, visit.direction));
    }
    let here = path.last().copied().unwrap_or(*start);
    let transit = router.route(&here, goal).ok_or(SolveError::Unreachable)?;
    push_all(&mut path, &transit);
    Ok(path)
}
