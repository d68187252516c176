//! Reduced visibility graph and shortest paths through free space.
//!
//! Shortest paths in a polygonal domain only bend at reflex vertices of the
//! free space, so those are the only graph nodes. Query endpoints are attached
//! on the fly and never stored, which keeps the graph immutable and shareable.

use crate::polygon::PolygonWithHoles;
use crate::predicates::orientation;
use nalgebra::Point2;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Clone, Debug)]
pub struct VisibilityGraph {
    polygon: PolygonWithHoles,
    nodes: Vec<Point2<f64>>,
    /// `adjacency[i]` lists `(j, length)` for every node `j` visible from `i`.
    adjacency: Vec<Vec<(usize, f64)>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct QueueEntry {
    cost: f64,
    node: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, then lowest node index for determinism.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl VisibilityGraph {
    /// Build the reduced visibility graph of `polygon`.
    pub fn new(polygon: &PolygonWithHoles) -> Self {
        let mut nodes = Vec::new();
        for (_, ring) in polygon.rings() {
            let n = ring.len();
            for i in 0..n {
                let prev = ring.vertex(i + n - 1);
                let cur = ring.vertex(i);
                let next = ring.vertex(i + 1);
                // Free space is on the left; a right turn is a reflex corner.
                if orientation(&prev, &cur, &next) < 0 {
                    nodes.push(cur);
                }
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                if polygon.segment_in_free_space(&nodes[i], &nodes[j]) {
                    let d = (nodes[j] - nodes[i]).norm();
                    adjacency[i].push((j, d));
                    adjacency[j].push((i, d));
                }
            }
        }

        log::debug!(
            "visibility graph: {} reflex nodes, {} edges",
            nodes.len(),
            adjacency.iter().map(Vec::len).sum::<usize>() / 2
        );

        Self {
            polygon: polygon.clone(),
            nodes,
            adjacency,
        }
    }

    #[inline]
    pub fn polygon(&self) -> &PolygonWithHoles {
        &self.polygon
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Shortest free-space polyline from `from` to `to`, endpoints included.
    ///
    /// Returns `None` when either endpoint is outside the free space or no
    /// path exists.
    pub fn shortest_path(&self, from: &Point2<f64>, to: &Point2<f64>) -> Option<Vec<Point2<f64>>> {
        if !self.polygon.contains(from) || !self.polygon.contains(to) {
            return None;
        }
        if self.polygon.segment_in_free_space(from, to) {
            return Some(vec![*from, *to]);
        }

        // Index layout: graph nodes, then `from`, then `to`.
        let n = self.nodes.len();
        let src = n;
        let dst = n + 1;
        let from_links: Vec<(usize, f64)> = self.links_to(from);
        let to_links: Vec<Option<f64>> = {
            let mut v = vec![None; n];
            for (j, d) in self.links_to(to) {
                v[j] = Some(d);
            }
            v
        };

        let mut dist = vec![f64::INFINITY; n + 2];
        let mut parent = vec![usize::MAX; n + 2];
        let mut heap = BinaryHeap::new();
        dist[src] = 0.0;
        heap.push(QueueEntry {
            cost: 0.0,
            node: src,
        });

        while let Some(QueueEntry { cost, node }) = heap.pop() {
            if cost > dist[node] {
                continue;
            }
            if node == dst {
                break;
            }
            let neighbours: Box<dyn Iterator<Item = (usize, f64)> + '_> = if node == src {
                Box::new(from_links.iter().copied())
            } else {
                let to_dst = to_links[node].map(|d| (dst, d));
                Box::new(self.adjacency[node].iter().copied().chain(to_dst))
            };
            for (next, w) in neighbours {
                let candidate = cost + w;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    parent[next] = node;
                    heap.push(QueueEntry {
                        cost: candidate,
                        node: next,
                    });
                }
            }
        }

        if !dist[dst].is_finite() {
            return None;
        }

        let mut path = vec![*to];
        let mut cur = parent[dst];
        while cur != src {
            path.push(self.nodes[cur]);
            cur = parent[cur];
        }
        path.push(*from);
        path.reverse();
        Some(path)
    }

    fn links_to(&self, p: &Point2<f64>) -> Vec<(usize, f64)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, q)| self.polygon.segment_in_free_space(p, q))
            .map(|(j, q)| (j, (q - p).norm()))
            .collect()
    }
}
