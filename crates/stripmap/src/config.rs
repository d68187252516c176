//! JSON run configuration.

use crate::io::{load_instance, read, IoError, PointRecord};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stripmap_core::{EuclideanCost, Line, PathCost, PolygonWithHoles, VelocityRampCost};
use stripmap_planner::{PlannerParams, Settings};

/// Line sensor parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub width: f64,
    pub overlap: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            width: 3.0,
            overlap: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    #[default]
    VelocityRamp,
    Euclidean,
}

/// Path cost parameters; `v_max`/`a_max` only apply to the velocity ramp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub kind: CostKind,
    pub v_max: f64,
    pub a_max: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            kind: CostKind::VelocityRamp,
            v_max: 3.0,
            a_max: 1.0,
        }
    }
}

impl CostConfig {
    pub fn build(&self) -> Result<Arc<dyn PathCost>, Error> {
        Ok(match self.kind {
            CostKind::VelocityRamp => Arc::new(VelocityRampCost::new(self.v_max, self.a_max)?),
            CostKind::Euclidean => Arc::new(EuclideanCost),
        })
    }
}

/// One planning run: instance, sensor, cost, query and planner parameters.
///
/// A relative `instance` path is resolved against the directory of the
/// configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub instance: Option<PathBuf>,
    /// Multiplier applied to instance coordinates.
    pub resolution: f64,
    pub sensor: SensorConfig,
    pub cost: CostConfig,
    pub start: PointRecord,
    /// Defaults to `start`.
    pub goal: Option<PointRecord>,
    pub planner: PlannerParams,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            instance: None,
            resolution: 1.0,
            sensor: SensorConfig::default(),
            cost: CostConfig::default(),
            start: PointRecord::default(),
            goal: None,
            planner: PlannerParams::default(),
        }
    }
}

impl PlanConfig {
    /// Load a configuration and resolve its instance path.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let raw = read(path)?;
        let mut config: Self = serde_json::from_str(&raw).map_err(|source| IoError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let (Some(instance), Some(dir)) = (config.instance.as_mut(), path.parent()) {
            if instance.is_relative() {
                *instance = dir.join(&*instance);
            }
        }
        Ok(config)
    }

    /// Defaults of the benchmark harness: map pixels at 2.5 cm and track ends
    /// kept off the walls.
    ///
    /// Transits around obstacles stay enabled. With adjacency-only edges a
    /// field with several holes rarely admits a tour that visits each cell
    /// once, and the solver runs out of budget without one.
    pub fn benchmark() -> Self {
        let mut config = Self {
            resolution: 0.025,
            ..Self::default()
        };
        config.planner.offset_polygons = true;
        config
    }

    pub fn goal(&self) -> PointRecord {
        self.goal.unwrap_or(self.start)
    }

    /// Load the configured instance.
    pub fn polygon(&self) -> Result<PolygonWithHoles, IoError> {
        let path = self.instance.as_ref().ok_or(IoError::MissingInstance)?;
        load_instance(path, self.resolution)
    }

    /// Planner settings for `polygon`.
    pub fn settings(&self, polygon: PolygonWithHoles) -> Result<Settings, Error> {
        let sensor = Line::new(self.sensor.width, self.sensor.overlap)?;
        Ok(Settings::new(
            polygon,
            Arc::new(sensor),
            self.cost.build()?,
            self.planner.clone(),
        ))
    }
}
