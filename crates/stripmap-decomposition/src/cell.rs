use crate::adjacency::AdjacencyGraph;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use stripmap_core::{rotate, Ring};

/// Rotation between world coordinates and the sweep frame.
///
/// In the frame, sweep chords and decomposition cuts are vertical and the
/// sweep advances along `+x`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepFrame {
    /// World direction of the chords, in `[0, π)`.
    direction: f64,
}

impl SweepFrame {
    pub fn new(direction: f64) -> Self {
        Self { direction }
    }

    #[inline]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Counter-clockwise angle applied by [`SweepFrame::to_frame`].
    #[inline]
    pub fn angle(&self) -> f64 {
        std::f64::consts::FRAC_PI_2 - self.direction
    }

    #[inline]
    pub fn to_frame(&self, p: &Point2<f64>) -> Point2<f64> {
        rotate(p, self.angle())
    }

    #[inline]
    pub fn to_world(&self, p: &Point2<f64>) -> Point2<f64> {
        rotate(p, -self.angle())
    }

    pub fn ring_to_frame(&self, ring: &Ring) -> Ring {
        ring.rotated(self.angle())
    }
}

/// One simple, hole-free cell of a decomposition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    id: usize,
    ring: Ring,
    neighbours: Vec<usize>,
}

impl Cell {
    pub(crate) fn new(id: usize, ring: Ring) -> Self {
        Self {
            id,
            ring,
            neighbours: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Counter-clockwise boundary in world coordinates.
    #[inline]
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// Ids of cells sharing a cut edge with this one, ascending.
    #[inline]
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.ring.area()
    }
}

/// A cut segment separating two cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedEdge {
    pub a: usize,
    pub b: usize,
    pub segment: [Point2<f64>; 2],
}

/// Result of decomposing a polygon: cells, their shared edges and the frame
/// in which every cell is monotone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    cells: Vec<Cell>,
    shared_edges: Vec<SharedEdge>,
    frame: SweepFrame,
}

impl Decomposition {
    pub(crate) fn new(
        mut cells: Vec<Cell>,
        shared_edges: Vec<SharedEdge>,
        frame: SweepFrame,
    ) -> Self {
        for edge in &shared_edges {
            cells[edge.a].neighbours.push(edge.b);
            cells[edge.b].neighbours.push(edge.a);
        }
        for cell in &mut cells {
            cell.neighbours.sort_unstable();
            cell.neighbours.dedup();
        }
        Self {
            cells,
            shared_edges,
            frame,
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn shared_edges(&self) -> &[SharedEdge] {
        &self.shared_edges
    }

    #[inline]
    pub fn frame(&self) -> SweepFrame {
        self.frame
    }

    /// World direction of the sweep chords.
    #[inline]
    pub fn direction(&self) -> f64 {
        self.frame.direction()
    }

    pub fn total_area(&self) -> f64 {
        self.cells.iter().map(Cell::area).sum()
    }

    pub fn adjacency(&self) -> AdjacencyGraph {
        AdjacencyGraph::from_cells(&self.cells)
    }
}
