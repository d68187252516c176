//! Cell decomposition of polygons with holes.
//!
//! A [`Decomposer`] splits the free space into simple, hole-free cells that
//! are monotone with respect to the sweep chords, and records which cells
//! share a cut edge.
//!
//! ```
//! use nalgebra::Point2;
//! use stripmap_core::PolygonWithHoles;
//! use stripmap_decomposition::{Boustrophedon, Decomposer, SweepDirection};
//!
//! let p = |x: f64, y: f64| Point2::new(x, y);
//! let polygon = PolygonWithHoles::new(
//!     vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
//!     vec![vec![p(4.0, 4.0), p(6.0, 4.0), p(6.0, 6.0), p(4.0, 6.0)]],
//! )
//! .unwrap();
//! let cells = Boustrophedon
//!     .decompose(&polygon, SweepDirection::Fixed(std::f64::consts::FRAC_PI_2), 3.0)
//!     .unwrap();
//! assert_eq!(cells.cell_count(), 4);
//! ```

mod adjacency;
mod boustrophedon;
mod cell;
mod decomposer;
mod error;
mod planar;

pub use adjacency::AdjacencyGraph;
pub use boustrophedon::{Boustrophedon, Trapezoidal};
pub use cell::{Cell, Decomposition, SharedEdge, SweepFrame};
pub use decomposer::{total_chords, Decomposer, DecompositionKind, SweepDirection};
pub use error::DecompositionError;
