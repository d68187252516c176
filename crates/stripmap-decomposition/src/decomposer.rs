use crate::boustrophedon::{Boustrophedon, Trapezoidal};
use crate::cell::Decomposition;
use crate::error::DecompositionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use stripmap_core::{chord_count, PolygonWithHoles};

/// Available decomposition strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionKind {
    #[default]
    Boustrophedon,
    Trapezoidal,
}

impl DecompositionKind {
    pub fn decomposer(self) -> Box<dyn Decomposer> {
        match self {
            DecompositionKind::Boustrophedon => Box::new(Boustrophedon),
            DecompositionKind::Trapezoidal => Box::new(Trapezoidal),
        }
    }
}

/// How the sweep (chord) direction is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepDirection {
    /// Try every boundary edge direction and keep the one needing the fewest chords.
    #[default]
    Auto,
    /// Chords run along this world angle (radians).
    Fixed(f64),
}

/// Splits a polygon with holes into simple cells.
pub trait Decomposer: Send + Sync + fmt::Debug {
    fn kind(&self) -> DecompositionKind;

    /// Decompose with chords running along `direction` (radians, world frame).
    fn decompose_at(
        &self,
        polygon: &PolygonWithHoles,
        direction: f64,
    ) -> Result<Decomposition, DecompositionError>;

    /// Decompose using `direction`; `spacing` is the chord spacing used to
    /// rank candidate directions when the direction is automatic.
    fn decompose(
        &self,
        polygon: &PolygonWithHoles,
        direction: SweepDirection,
        spacing: f64,
    ) -> Result<Decomposition, DecompositionError> {
        match direction {
            SweepDirection::Fixed(angle) => self.decompose_at(polygon, angle),
            SweepDirection::Auto => {
                let mut best: Option<(usize, usize, Decomposition)> = None;
                let mut last_err = None;
                for angle in polygon.edge_directions() {
                    match self.decompose_at(polygon, angle) {
                        Ok(d) => {
                            let chords = total_chords(&d, spacing);
                            log::debug!(
                                "direction {angle:.4}: {} cells, {chords} chords",
                                d.cell_count()
                            );
                            let better = best.as_ref().is_none_or(|(c, n, _)| {
                                (chords, d.cell_count()) < (*c, *n)
                            });
                            if better {
                                best = Some((chords, d.cell_count(), d));
                            }
                        }
                        Err(err) => {
                            log::debug!("direction {angle:.4} rejected: {err}");
                            last_err = Some(err);
                        }
                    }
                }
                match (best, last_err) {
                    (Some((_, _, d)), _) => Ok(d),
                    (None, Some(err)) => Err(err),
                    (None, None) => Err(DecompositionError::NoCells),
                }
            }
        }
    }
}

/// Chords needed to sweep every cell of `d` at the given spacing.
pub fn total_chords(d: &Decomposition, spacing: f64) -> usize {
    let frame = d.frame();
    d.cells()
        .iter()
        .map(|cell| {
            let (lo, hi) = frame.ring_to_frame(cell.ring()).bounds();
            chord_count(hi.x - lo.x, spacing)
        })
        .sum()
}
