use crate::error::SetupError;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use stripmap_core::{PathCost, PolygonWithHoles, SensorModel};
use stripmap_decomposition::{Decomposer, DecompositionKind, SweepDirection};
use stripmap_gtsp::SolverParams;

/// Base planner or the variant that guarantees full footprint coverage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerVariant {
    #[default]
    Base,
    /// Densifies visited tracks after solving until no gap remains.
    Exact,
}

/// Which non-adjacent cell pairs get an edge when sweeping around obstacles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitMode {
    /// Only when the straight segment from exit to entry stays in free space.
    StraightLine,
    /// Always, routed along the free-space shortest path.
    #[default]
    ShortestPath,
}

/// Serializable planner configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    pub variant: PlannerVariant,
    pub decomposition: DecompositionKind,
    pub sweep_direction: SweepDirection,
    /// Connect non-adjacent cells as well as adjacent ones.
    pub sweep_around_obstacles: bool,
    /// Keep track ends half a footprint away from the cell walls.
    pub offset_polygons: bool,
    pub transit: TransitMode,
    pub solver: SolverParams,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            variant: PlannerVariant::Base,
            decomposition: DecompositionKind::Boustrophedon,
            sweep_direction: SweepDirection::Auto,
            sweep_around_obstacles: true,
            offset_polygons: false,
            transit: TransitMode::ShortestPath,
            solver: SolverParams::default(),
        }
    }
}

/// Everything a [`crate::Planner`] needs, fixed for its lifetime.
#[derive(Clone)]
pub struct Settings {
    pub polygon: PolygonWithHoles,
    pub sensor_model: Arc<dyn SensorModel>,
    pub cost_function: Arc<dyn PathCost>,
    pub decomposer: Arc<dyn Decomposer>,
    pub params: PlannerParams,
}

impl Settings {
    /// Settings using the decomposer named by `params.decomposition`.
    pub fn new(
        polygon: PolygonWithHoles,
        sensor_model: Arc<dyn SensorModel>,
        cost_function: Arc<dyn PathCost>,
        params: PlannerParams,
    ) -> Self {
        Self {
            polygon,
            sensor_model,
            cost_function,
            decomposer: Arc::from(params.decomposition.decomposer()),
            params,
        }
    }

    /// Validate raw rings and build settings from them.
    pub fn from_rings(
        outer: Vec<Point2<f64>>,
        holes: Vec<Vec<Point2<f64>>>,
        sensor_model: Arc<dyn SensorModel>,
        cost_function: Arc<dyn PathCost>,
        params: PlannerParams,
    ) -> Result<Self, SetupError> {
        let polygon = PolygonWithHoles::new(outer, holes)?;
        Ok(Self::new(polygon, sensor_model, cost_function, params))
    }

    /// Replace the decomposer, e.g. with a custom implementation.
    pub fn with_decomposer(mut self, decomposer: Arc<dyn Decomposer>) -> Self {
        self.decomposer = decomposer;
        self
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("holes", &self.polygon.hole_count())
            .field("sensor_model", &self.sensor_model)
            .field("decomposer", &self.decomposer)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
