//! Polygon instance files.
//!
//! An instance is a JSON object with a `hull` ring and optional `holes`,
//! each a list of `{x, y}` points. Coordinates are multiplied by a resolution
//! on load and the holes are subtracted from the hull one after another, so
//! holes overlapping the boundary reshape it instead of being rejected.

use geo::{BooleanOps, Coord, LineString, Polygon};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stripmap_core::{GeometryError, PolygonWithHoles};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("{ring} has {count} points, at least 3 are required")]
    TooFewPoints { ring: String, count: usize },
    #[error("resolution must be finite and > 0 (got {0})")]
    InvalidResolution(f64),
    #[error("subtracting hole {hole} leaves no free space")]
    EmptyDifference { hole: usize },
    #[error("configuration does not name an instance file")]
    MissingInstance,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
}

impl From<PointRecord> for Point2<f64> {
    fn from(p: PointRecord) -> Self {
        Point2::new(p.x, p.y)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RingRecord {
    pub points: Vec<PointRecord>,
}

/// Raw instance as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceFile {
    pub hull: RingRecord,
    #[serde(default)]
    pub holes: Vec<RingRecord>,
}

impl InstanceFile {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let raw = read(path)?;
        serde_json::from_str(&raw).map_err(|source| IoError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Scale by `resolution`, subtract the holes and validate the result.
    pub fn to_polygon(&self, resolution: f64) -> Result<PolygonWithHoles, IoError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(IoError::InvalidResolution(resolution));
        }
        let mut shape = Polygon::new(scaled_ring(&self.hull, resolution, "hull")?, Vec::new());
        for (i, hole) in self.holes.iter().enumerate() {
            let cutter = Polygon::new(
                scaled_ring(hole, resolution, &format!("hole {i}"))?,
                Vec::new(),
            );
            let remaining = shape.difference(&cutter);
            if remaining.0.len() > 1 {
                log::warn!(
                    "hole {i} splits the free space into {} parts, keeping the first",
                    remaining.0.len()
                );
            }
            shape = remaining
                .0
                .into_iter()
                .next()
                .ok_or(IoError::EmptyDifference { hole: i })?;
        }
        let outer = ring_points(shape.exterior());
        let holes = shape.interiors().iter().map(ring_points).collect();
        Ok(PolygonWithHoles::new(outer, holes)?)
    }
}

/// Load an instance file and turn it into a polygon.
pub fn load_instance(path: impl AsRef<Path>, resolution: f64) -> Result<PolygonWithHoles, IoError> {
    let polygon = InstanceFile::load_json(path.as_ref())?.to_polygon(resolution)?;
    log::debug!(
        "loaded {}: {} holes, {} hole vertices",
        path.as_ref().display(),
        polygon.hole_count(),
        polygon.hole_vertex_count()
    );
    Ok(polygon)
}

pub(crate) fn read(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn scaled_ring(ring: &RingRecord, resolution: f64, name: &str) -> Result<LineString<f64>, IoError> {
    if ring.points.len() < 3 {
        return Err(IoError::TooFewPoints {
            ring: name.to_string(),
            count: ring.points.len(),
        });
    }
    Ok(ring
        .points
        .iter()
        .map(|p| Coord {
            x: resolution * p.x,
            y: resolution * p.y,
        })
        .collect::<Vec<_>>()
        .into())
}

/// Ring vertices without the closing duplicate.
fn ring_points(ring: &LineString<f64>) -> Vec<Point2<f64>> {
    let mut points: Vec<Point2<f64>> = ring.coords().map(|c| Point2::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, side: f64) -> RingRecord {
        RingRecord {
            points: vec![
                PointRecord { x: x0, y: y0 },
                PointRecord { x: x0 + side, y: y0 },
                PointRecord {
                    x: x0 + side,
                    y: y0 + side,
                },
                PointRecord { x: x0, y: y0 + side },
            ],
        }
    }

    #[test]
    fn holes_are_scaled_and_subtracted() {
        let file = InstanceFile {
            hull: square(0.0, 0.0, 400.0),
            holes: vec![square(100.0, 100.0, 40.0), square(200.0, 200.0, 80.0)],
        };
        let polygon = file.to_polygon(0.025).expect("valid");
        assert_eq!(polygon.hole_count(), 2);
        assert_relative_eq!(polygon.area(), 100.0 - 1.0 - 4.0, epsilon = 1e-9);
    }

    #[test]
    fn hole_crossing_the_hull_reshapes_it() {
        let file = InstanceFile {
            hull: square(0.0, 0.0, 10.0),
            holes: vec![square(8.0, 2.0, 4.0)],
        };
        let polygon = file.to_polygon(1.0).expect("valid");
        assert_eq!(polygon.hole_count(), 0);
        assert_relative_eq!(polygon.area(), 100.0 - 8.0, epsilon = 1e-9);
    }

    #[test]
    fn short_rings_are_rejected() {
        let file: InstanceFile =
            serde_json::from_str(r#"{"hull": {"points": [{"x": 0, "y": 0}, {"x": 1, "y": 0}]}}"#)
                .expect("json");
        assert!(matches!(
            file.to_polygon(1.0),
            Err(IoError::TooFewPoints { count: 2, .. })
        ));
        assert!(matches!(
            InstanceFile::default().to_polygon(0.0),
            Err(IoError::InvalidResolution(_))
        ));
    }
}
