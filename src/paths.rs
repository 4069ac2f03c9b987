//! Shortest paths between the depot and AOI nodes over the GeoGraph.
//!
//! The CVRP solver only reasons about depot/AOI pairs; the path table keeps
//! the intermediate ring points so routes can be expanded into polylines.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use tracing::debug;

use crate::error::PlanError;
use crate::graph::{GeoGraph, NodeId, DEPOT_NODE};

#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    cost: f64,
    node: NodeId,
}

impl Eq for State {}

impl Ord for State {
    // Min-heap on cost, lower node id first on ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source Dijkstra result.
///
/// `petgraph::algo::dijkstra` only returns costs. Expansion needs the node
/// sequence, and equal-cost ties must resolve the same way on every run, so
/// this keeps its own predecessor table and breaks ties on the lower node id.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NodeId,
    dist: Vec<f64>,
    pred: Vec<Option<NodeId>>,
}

impl ShortestPathTree {
    pub fn from_source(graph: &GeoGraph, source: NodeId) -> Self {
        let inner = graph.inner();
        let n = inner.node_count();
        let mut dist = vec![f64::INFINITY; n];
        let mut pred = vec![None; n];
        let mut heap = BinaryHeap::new();

        if source < n {
            dist[source] = 0.0;
            heap.push(State { cost: 0.0, node: source });
        }

        while let Some(State { cost, node }) = heap.pop() {
            if cost > dist[node] {
                continue;
            }
            for edge in inner.edges(NodeIndex::new(node)) {
                let next = if edge.source().index() == node {
                    edge.target().index()
                } else {
                    edge.source().index()
                };
                let candidate = cost + *edge.weight();
                if candidate < dist[next] {
                    dist[next] = candidate;
                    pred[next] = Some(node);
                    heap.push(State { cost: candidate, node: next });
                }
            }
        }

        Self { source, dist, pred }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn cost_to(&self, target: NodeId) -> Option<f64> {
        self.dist.get(target).copied().filter(|cost| cost.is_finite())
    }

    /// Node sequence from the source to `target`, both included.
    pub fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        self.cost_to(target)?;
        let mut path = vec![target];
        let mut current = target;
        while let Some(previous) = self.pred[current] {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        Some(path)
    }
}

/// Cost matrix and path table over the depot plus the nodes of interest.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    costs: Vec<Vec<f64>>,
    paths: Vec<Vec<Vec<NodeId>>>,
}

impl ShortestPaths {
    /// Nodes covered by the tables, depot first.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.index.contains_key(&node)
    }

    pub fn cost(&self, from: NodeId, to: NodeId) -> Option<f64> {
        let (i, j) = (self.index.get(&from)?, self.index.get(&to)?);
        Some(self.costs[*i][*j])
    }

    pub fn path(&self, from: NodeId, to: NodeId) -> Option<&[NodeId]> {
        let (i, j) = (self.index.get(&from)?, self.index.get(&to)?);
        Some(&self.paths[*i][*j])
    }
}

/// Computes shortest paths for every ordered pair in `nodes_of_interest` plus
/// the depot anchor. One Dijkstra run per source, sources in parallel.
pub fn all_pairs_shortest(graph: &GeoGraph, nodes_of_interest: &[NodeId]) -> Result<ShortestPaths, PlanError> {
    let started = Instant::now();

    let mut nodes = vec![DEPOT_NODE];
    for &node in nodes_of_interest {
        if !nodes.contains(&node) {
            nodes.push(node);
        }
    }
    if let Some(&missing) = nodes.iter().find(|&&node| node >= graph.node_count()) {
        return Err(PlanError::Input(format!(
            "node {} is not part of the graph ({} nodes)",
            missing,
            graph.node_count()
        )));
    }

    let rows: Vec<(Vec<f64>, Vec<Vec<NodeId>>)> = nodes
        .par_iter()
        .map(|&source| -> Result<(Vec<f64>, Vec<Vec<NodeId>>), PlanError> {
            let tree = ShortestPathTree::from_source(graph, source);
            let mut costs = Vec::with_capacity(nodes.len());
            let mut paths = Vec::with_capacity(nodes.len());
            for &target in &nodes {
                let cost = tree
                    .cost_to(target)
                    .ok_or(PlanError::GraphConnectivity { from: source, to: target })?;
                let path = tree
                    .path_to(target)
                    .ok_or(PlanError::GraphConnectivity { from: source, to: target })?;
                costs.push(cost);
                paths.push(path);
            }
            Ok((costs, paths))
        })
        .collect::<Result<_, PlanError>>()?;

    let (costs, paths) = rows.into_iter().unzip();
    let index = nodes.iter().enumerate().map(|(i, node)| (*node, i)).collect();

    debug!(
        nodes = nodes.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Shortest paths computed"
    );

    Ok(ShortestPaths {
        nodes,
        index,
        costs,
        paths,
    })
}
