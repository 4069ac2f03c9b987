//! Route expansion: node-id routes back into full polylines.

use std::collections::BTreeMap;

use crate::error::PlanError;
use crate::graph::{GeoGraph, NodeId};
use crate::paths::ShortestPaths;
use crate::polyline::Polyline;

/// Concatenates the shortest-path segments between consecutive route nodes.
///
/// The junction node shared by two segments is emitted once.
pub fn expand_route(route: &[NodeId], paths: &ShortestPaths) -> Result<Vec<NodeId>, PlanError> {
    let mut expanded: Vec<NodeId> = Vec::new();
    if let [single] = route {
        expanded.push(*single);
        return Ok(expanded);
    }
    for pair in route.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let segment = paths
            .path(from, to)
            .ok_or(PlanError::GraphConnectivity { from, to })?;
        let skip = usize::from(!expanded.is_empty());
        expanded.extend(segment.iter().skip(skip).copied());
    }
    Ok(expanded)
}

/// Expands every route and maps node ids to coordinates.
pub fn expand(
    routes: &BTreeMap<usize, Vec<NodeId>>,
    paths: &ShortestPaths,
    graph: &GeoGraph,
) -> Result<BTreeMap<usize, Polyline>, PlanError> {
    routes
        .iter()
        .map(|(number, route)| {
            let nodes = expand_route(route, paths)?;
            let points = nodes
                .iter()
                .map(|&node| {
                    graph.coordinate(node).ok_or_else(|| {
                        PlanError::Input(format!("route {} references unknown node {}", number, node))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((*number, Polyline::new(points)))
        })
        .collect()
}
