//! Run metrics and the JSON report written by the CLI.

use crate::config::{CostKind, PlanConfig};
use crate::io::{write, IoError};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stripmap_core::{Phase, PolygonWithHoles, Timings};
use stripmap_gtsp::SolveStatus;
use stripmap_planner::{Planner, PlannerVariant, Solution};

/// Short identifier of a planner variant used in reports.
pub fn planner_id(variant: PlannerVariant) -> &'static str {
    match variant {
        PlannerVariant::Base => "bcd",
        PlannerVariant::Exact => "bcd_exact",
    }
}

/// Metrics of one planner run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub planner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<PathBuf>,
    pub hole_count: usize,
    pub hole_vertex_count: usize,
    pub cell_count: usize,
    pub cost: f64,
    pub status: SolveStatus,
    pub total_time: f64,
    pub setup_time: f64,
    pub solve_time: f64,
    /// Seconds per phase.
    pub phases: BTreeMap<Phase, f64>,
    pub sweep_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_max: Option<f64>,
}

/// Solution of a run together with its metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanOutcome {
    pub solution: Solution,
    pub metrics: PlanMetrics,
}

/// Set up a planner on `polygon` and answer the configured query.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "info", skip_all, fields(planner = planner_id(config.planner.variant)))
)]
pub fn run(config: &PlanConfig, polygon: PolygonWithHoles) -> Result<PlanOutcome, Error> {
    let hole_count = polygon.hole_count();
    let hole_vertex_count = polygon.hole_vertex_count();
    let settings = config.settings(polygon)?;
    let sweep_distance = settings.sensor_model.sweep_distance();
    let mut planner = Planner::new(settings);
    let mut timings = Timings::new();
    planner.setup(&mut timings)?;
    let cell_count = planner.tracks().len();
    let solution = planner.solve(config.start.into(), config.goal().into(), &mut timings)?;

    let ramp = config.cost.kind == CostKind::VelocityRamp;
    let metrics = PlanMetrics {
        planner: planner_id(config.planner.variant).to_string(),
        instance: config.instance.clone(),
        hole_count,
        hole_vertex_count,
        cell_count,
        cost: solution.cost,
        status: solution.status,
        total_time: timings.total(),
        setup_time: timings.setup_total(),
        solve_time: timings.solve_total(),
        phases: timings.iter().collect(),
        sweep_distance,
        v_max: ramp.then_some(config.cost.v_max),
        a_max: ramp.then_some(config.cost.a_max),
    };
    log::info!(
        "{}: {} cells, cost {:.3}, setup {:.3}s, solve {:.3}s",
        metrics.planner,
        cell_count,
        metrics.cost,
        metrics.setup_time,
        metrics.solve_time
    );
    Ok(PlanOutcome { solution, metrics })
}

/// A run that could not produce a solution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub planner: String,
    pub instance: PathBuf,
    pub error: String,
}

/// Collected results of a benchmark sweep.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    pub runs: Vec<PlanMetrics>,
    pub failures: Vec<RunFailure>,
}

impl BenchReport {
    pub fn write_json(&self, path: &Path) -> Result<(), IoError> {
        write_json(path, self)
    }
}

/// Pretty-print `value` as JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value).map_err(IoError::Serialize)?;
    write(path, &json)
}
