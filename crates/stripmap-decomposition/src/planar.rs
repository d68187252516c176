//! Planar subdivision of the free space by boundary edges and vertical cuts.
//!
//! Boundary edges are stored once, in their free-space orientation; cuts are
//! stored in both directions. Every half-edge therefore has a free-space face
//! on its left, and tracing the left faces yields the cells.

use crate::error::DecompositionError;
use nalgebra::Point2;
use std::f64::consts::TAU;
use stripmap_core::cross;

#[derive(Clone, Copy, Debug)]
pub(crate) struct HalfEdge {
    pub from: usize,
    pub to: usize,
    /// Index of the undirected cut this half-edge belongs to.
    pub cut: Option<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Subdivision {
    pub points: Vec<Point2<f64>>,
    pub half_edges: Vec<HalfEdge>,
    outgoing: Vec<Vec<usize>>,
    cut_count: usize,
}

/// A traced face as its counter-clockwise node cycle.
#[derive(Debug)]
pub(crate) struct Face {
    pub nodes: Vec<usize>,
}

impl Subdivision {
    pub fn add_node(&mut self, p: Point2<f64>) -> usize {
        self.points.push(p);
        self.outgoing.push(Vec::new());
        self.points.len() - 1
    }

    pub fn add_boundary_edge(&mut self, from: usize, to: usize) {
        self.push_half_edge(HalfEdge {
            from,
            to,
            cut: None,
        });
    }

    /// Add a cut in both directions; returns its index.
    pub fn add_cut(&mut self, a: usize, b: usize) -> usize {
        let id = self.cut_count;
        self.cut_count += 1;
        self.push_half_edge(HalfEdge {
            from: a,
            to: b,
            cut: Some(id),
        });
        self.push_half_edge(HalfEdge {
            from: b,
            to: a,
            cut: Some(id),
        });
        id
    }

    pub fn cut_count(&self) -> usize {
        self.cut_count
    }

    fn push_half_edge(&mut self, he: HalfEdge) {
        self.outgoing[he.from].push(self.half_edges.len());
        self.half_edges.push(he);
    }

    /// Half-edge leaving `he.to` that keeps the current face on the left.
    ///
    /// That is the outgoing edge with the smallest clockwise turn away from the
    /// reversed incoming direction.
    fn next_on_face(&self, he: usize) -> Option<usize> {
        let HalfEdge { from, to, .. } = self.half_edges[he];
        let pivot = self.points[to];
        let back = self.points[from] - pivot;
        let mut best: Option<(f64, usize)> = None;
        for &cand in &self.outgoing[to] {
            let target = self.half_edges[cand].to;
            let dir = self.points[target] - pivot;
            let ccw = cross(back, dir).atan2(back.dot(&dir));
            let mut cw = (-ccw).rem_euclid(TAU);
            if target == from || cw <= 0.0 {
                cw = TAU;
            }
            if best.is_none_or(|(b, _)| cw < b) {
                best = Some((cw, cand));
            }
        }
        best.map(|(_, c)| c)
    }

    /// Trace every face; returns faces and the face on the left of each half-edge.
    pub fn trace_faces(&self) -> Result<(Vec<Face>, Vec<usize>), DecompositionError> {
        let mut face_of = vec![usize::MAX; self.half_edges.len()];
        let mut faces = Vec::new();
        for start in 0..self.half_edges.len() {
            if face_of[start] != usize::MAX {
                continue;
            }
            let face = faces.len();
            let mut nodes = Vec::new();
            let mut cur = start;
            loop {
                if face_of[cur] != usize::MAX || nodes.len() > self.half_edges.len() {
                    return Err(DecompositionError::OpenFace {
                        node: self.half_edges[cur].from,
                    });
                }
                face_of[cur] = face;
                nodes.push(self.half_edges[cur].from);
                let next = self.next_on_face(cur).ok_or(DecompositionError::OpenFace {
                    node: self.half_edges[cur].to,
                })?;
                if next == start {
                    break;
                }
                cur = next;
            }
            faces.push(Face { nodes });
        }
        Ok((faces, face_of))
    }
}
