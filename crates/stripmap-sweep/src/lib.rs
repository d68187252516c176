//! Boustrophedon sweep tracks for decomposition cells.
//!
//! Each cell gets parallel chords spaced by the sensor's sweep distance and
//! joined end to end into one back-and-forth polyline. The exact-coverage
//! pass in [`densify_for_coverage`] adds chords until every part of the cell
//! is certified to lie within half a footprint width of the track.

mod coverage;
mod generator;
mod track;

pub use coverage::{coverage_gaps, densify_for_coverage, distance_to_polyline};
pub use generator::{chord_offsets, sweep_cell, sweep_decomposition, SweepParams};
pub use track::Track;
