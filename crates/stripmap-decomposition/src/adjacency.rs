//! Cell adjacency derived from shared cut edges.

use crate::cell::Cell;
use std::collections::VecDeque;

/// Undirected cell adjacency, indexed by cell id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    neighbours: Vec<Vec<usize>>,
}

impl AdjacencyGraph {
    pub fn from_cells(cells: &[Cell]) -> Self {
        Self {
            neighbours: cells.iter().map(|c| c.neighbours().to_vec()).collect(),
        }
    }

    pub fn from_lists(neighbours: Vec<Vec<usize>>) -> Self {
        Self { neighbours }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    #[inline]
    pub fn neighbours(&self, cell: usize) -> &[usize] {
        &self.neighbours[cell]
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbours[a].binary_search(&b).is_ok()
    }

    pub fn edge_count(&self) -> usize {
        self.neighbours.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Connected component label per cell, labels assigned in id order.
    pub fn components(&self) -> Vec<usize> {
        let mut label = vec![usize::MAX; self.neighbours.len()];
        let mut next = 0;
        let mut queue = VecDeque::new();
        for seed in 0..self.neighbours.len() {
            if label[seed] != usize::MAX {
                continue;
            }
            label[seed] = next;
            queue.push_back(seed);
            while let Some(c) = queue.pop_front() {
                for &n in &self.neighbours[c] {
                    if label[n] == usize::MAX {
                        label[n] = next;
                        queue.push_back(n);
                    }
                }
            }
            next += 1;
        }
        label
    }

    pub fn component_count(&self) -> usize {
        self.components().into_iter().max().map_or(0, |m| m + 1)
    }

    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }
}
