//! Road network graph with A* routing.
//!
//! Segment endpoints closer than [`ROAD_NODE_MERGE_DISTANCE`] share a node.
//! Routes start and end at arbitrary points on segments.

use glam::DVec2;
use pathfinding::prelude::astar;

use overwatch_core::components::RoadSegment;
use overwatch_core::constants::ROAD_NODE_MERGE_DISTANCE;

/// A point snapped onto a road segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadHit {
    pub point: DVec2,
    pub distance: f64,
    /// Index into the road table.
    pub segment: usize,
}

#[derive(Debug, Clone)]
pub struct RoadGraph {
    nodes: Vec<DVec2>,
    /// Per node: (neighbor, cost).
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Per segment: (start node, end node).
    segment_nodes: Vec<(usize, usize)>,
}

impl RoadGraph {
    pub fn build(roads: &[RoadSegment]) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            adjacency: Vec::new(),
            segment_nodes: Vec::with_capacity(roads.len()),
        };
        for road in roads {
            let a = graph.node_for(road.start);
            let b = graph.node_for(road.end);
            graph.segment_nodes.push((a, b));
            if a != b {
                let cost = graph.nodes[a].distance(graph.nodes[b]);
                graph.adjacency[a].push((b, cost));
                graph.adjacency[b].push((a, cost));
            }
        }
        graph
    }

    fn node_for(&mut self, p: DVec2) -> usize {
        if let Some(i) = self
            .nodes
            .iter()
            .position(|n| n.distance(p) < ROAD_NODE_MERGE_DISTANCE)
        {
            return i;
        }
        self.nodes.push(p);
        self.adjacency.push(Vec::new());
        self.nodes.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_nodes.is_empty()
    }

    /// Polyline along the network from one snapped point to another,
    /// or None when the two segments are not connected.
    pub fn route(&self, from: &RoadHit, to: &RoadHit) -> Option<Vec<DVec2>> {
        if from.segment == to.segment {
            return Some(vec![from.point, to.point]);
        }
        let (s0, s1) = *self.segment_nodes.get(from.segment)?;
        let (g0, g1) = *self.segment_nodes.get(to.segment)?;

        // Virtual start and goal nodes sit past the real ones.
        let start = self.nodes.len();
        let goal = start + 1;
        let position = |n: usize| match n {
            n if n == start => from.point,
            n if n == goal => to.point,
            n => self.nodes[n],
        };

        let (path, _cost) = astar(
            &start,
            |&n| {
                let mut next: Vec<(usize, u64)> = if n == start {
                    [s0, s1]
                        .iter()
                        .map(|&m| (m, millimeters(from.point.distance(self.nodes[m]))))
                        .collect()
                } else if n == goal {
                    Vec::new()
                } else {
                    self.adjacency[n].iter().map(|&(m, cost)| (m, millimeters(cost))).collect()
                };
                if n == g0 || n == g1 {
                    next.push((goal, millimeters(to.point.distance(self.nodes[n]))));
                }
                next
            },
            |&n| (position(n).distance(to.point) * 1000.0).floor() as u64,
            |&n| n == goal,
        )?;
        Some(path.into_iter().map(position).collect())
    }
}

/// Edge cost in whole millimeters.
fn millimeters(meters: f64) -> u64 {
    (meters * 1000.0).round() as u64
}
