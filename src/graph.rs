//! GeoGraph builder: shoreline ring plus dynamically attached AOI nodes.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use tracing::{debug, info, warn};

use crate::geodesic::{geodesic_km, Coordinate};
use crate::skeleton::{PlanarContainment, ShorelineSkeleton};
use crate::traits::{AreaOfInterest, Id};

/// Node identifier inside a [`GeoGraph`]. Ring points are `0..N`, AOIs follow.
pub type NodeId = usize;

/// The depot anchor: ring point 0.
pub const DEPOT_NODE: NodeId = 0;

/// Undirected graph weighted by geodesic distance (km).
#[derive(Debug, Clone)]
pub struct GeoGraph {
    graph: UnGraph<Coordinate, f64>,
    ring_len: usize,
}

impl GeoGraph {
    fn from_skeleton(skeleton: &ShorelineSkeleton) -> Self {
        let mut graph = UnGraph::with_capacity(skeleton.len(), skeleton.len());
        for point in skeleton.points() {
            graph.add_node(*point);
        }
        for (a, b, km) in skeleton.edges() {
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), km);
        }
        Self {
            graph,
            ring_len: skeleton.len(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn ring_len(&self) -> usize {
        self.ring_len
    }

    pub fn is_ring_node(&self, node: NodeId) -> bool {
        node < self.ring_len
    }

    pub fn coordinate(&self, node: NodeId) -> Option<Coordinate> {
        self.graph.node_weight(NodeIndex::new(node)).copied()
    }

    /// Coordinate table indexed by node id.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.graph.node_weights().copied().collect()
    }

    /// Weight of the edge between two nodes, if they are adjacent.
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
    }

    pub(crate) fn inner(&self) -> &UnGraph<Coordinate, f64> {
        &self.graph
    }

    #[cfg(test)]
    pub(crate) fn push_isolated_node(&mut self, point: Coordinate) -> NodeId {
        self.graph.add_node(point).index()
    }
}

/// An AOI that received at least one attachment edge.
#[derive(Debug, Clone)]
pub struct AttachedAoi<K> {
    pub key: K,
    pub node: NodeId,
    pub centroid: Coordinate,
    pub demand: u32,
    /// Ring points the AOI is attached to, in ring order.
    pub anchors: Vec<NodeId>,
}

/// An AOI no ring point can reach under the containment test.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedAoi<K> {
    pub key: K,
    pub centroid: Coordinate,
    pub demand: u32,
}

/// Result of graph construction: which AOIs are routable and which are not.
#[derive(Debug, Clone)]
pub struct RoutablePlan<K> {
    pub graph: GeoGraph,
    pub accepted: Vec<AttachedAoi<K>>,
    pub excluded: Vec<ExcludedAoi<K>>,
}

impl<K: Id> RoutablePlan<K> {
    /// Mapping from AOI key to assigned node id.
    pub fn node_index_map(&self) -> HashMap<K, NodeId> {
        self.accepted
            .iter()
            .map(|aoi| (aoi.key.clone(), aoi.node))
            .collect()
    }

    pub fn node_of(&self, key: &K) -> Option<NodeId> {
        self.accepted.iter().find(|aoi| &aoi.key == key).map(|aoi| aoi.node)
    }

    pub fn aoi_at(&self, node: NodeId) -> Option<&AttachedAoi<K>> {
        self.accepted.iter().find(|aoi| aoi.node == node)
    }

    /// `(node, demand)` pairs for the CVRP reduction.
    pub fn demand_nodes(&self) -> Vec<(NodeId, u32)> {
        self.accepted.iter().map(|aoi| (aoi.node, aoi.demand)).collect()
    }
}

/// Builds the GeoGraph for one planning request.
///
/// Ring edges come first. Each AOI, in input order, is tested against every
/// ring point; passing ring points get an attachment edge weighted by the
/// geodesic distance. AOIs with no passing ring point get no node and are
/// reported in `excluded`, so node ids stay contiguous.
pub fn build_graph<A>(
    skeleton: &ShorelineSkeleton,
    containment: &PlanarContainment,
    aois: &[A],
) -> RoutablePlan<A::Key>
where
    A: AreaOfInterest,
{
    let mut geo = GeoGraph::from_skeleton(skeleton);
    let mut accepted = Vec::new();
    let mut excluded = Vec::new();

    for aoi in aois {
        let centroid = aoi.centroid();
        let anchors: Vec<NodeId> = skeleton
            .points()
            .iter()
            .enumerate()
            .filter(|(_, ring_point)| containment.segment_inside(**ring_point, centroid))
            .map(|(index, _)| index)
            .collect();

        if anchors.is_empty() {
            warn!(key = ?aoi.key(), ?centroid, "AOI cannot be attached to the shoreline skeleton");
            excluded.push(ExcludedAoi {
                key: aoi.key().clone(),
                centroid,
                demand: aoi.demand(),
            });
            continue;
        }

        let node = geo.graph.add_node(centroid);
        for &anchor in &anchors {
            let km = geodesic_km(skeleton.points()[anchor], centroid);
            geo.graph.add_edge(NodeIndex::new(anchor), node, km);
        }
        debug!(key = ?aoi.key(), node = node.index(), anchors = anchors.len(), "AOI attached");

        accepted.push(AttachedAoi {
            key: aoi.key().clone(),
            node: node.index(),
            centroid,
            demand: aoi.demand(),
            anchors,
        });
    }

    info!(
        ring = skeleton.len(),
        accepted = accepted.len(),
        excluded = excluded.len(),
        edges = geo.edge_count(),
        "GeoGraph built"
    );

    RoutablePlan {
        graph: geo,
        accepted,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Area {
        key: &'static str,
        centroid: Coordinate,
        demand: u32,
    }

    impl AreaOfInterest for Area {
        type Key = &'static str;

        fn key(&self) -> &Self::Key {
            &self.key
        }

        fn centroid(&self) -> Coordinate {
            self.centroid
        }

        fn demand(&self) -> u32 {
            self.demand
        }
    }

    fn square() -> ShorelineSkeleton {
        ShorelineSkeleton::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap()
    }

    fn build(aois: &[Area]) -> RoutablePlan<&'static str> {
        let skeleton = square();
        let containment = PlanarContainment::new(&skeleton, 10);
        build_graph(&skeleton, &containment, aois)
    }

    #[test]
    fn test_ring_only_graph() {
        let plan = build(&[]);
        assert_eq!(plan.graph.node_count(), 4);
        assert_eq!(plan.graph.edge_count(), 4);
        assert!(plan.graph.edge_weight(3, 0).is_some());
        assert!(plan.graph.edge_weight(0, 2).is_none());
    }

    #[test]
    fn test_center_aoi_attaches_to_all_corners() {
        let plan = build(&[Area { key: "a", centroid: (0.5, 0.5), demand: 5 }]);
        assert_eq!(plan.accepted.len(), 1);
        let aoi = &plan.accepted[0];
        assert_eq!(aoi.node, 4);
        assert_eq!(aoi.anchors, vec![0, 1, 2, 3]);
        assert_eq!(plan.graph.edge_count(), 8);

        let expected = geodesic_km((0.0, 0.0), (0.5, 0.5));
        assert!((plan.graph.edge_weight(0, 4).unwrap() - expected).abs() < 1e-9);
        assert_eq!(plan.graph.coordinate(4), Some((0.5, 0.5)));
    }

    #[test]
    fn test_outside_aoi_is_excluded_and_ids_stay_contiguous() {
        let plan = build(&[
            Area { key: "out", centroid: (2.0, 2.0), demand: 3 },
            Area { key: "in", centroid: (0.25, 0.75), demand: 4 },
        ]);
        assert_eq!(plan.excluded.len(), 1);
        assert_eq!(plan.excluded[0].key, "out");
        assert_eq!(plan.accepted.len(), 1);
        assert_eq!(plan.node_of(&"in"), Some(4));
        assert_eq!(plan.node_of(&"out"), None);
        assert_eq!(plan.graph.node_count(), 5);
    }

    #[test]
    fn test_node_ids_follow_input_order() {
        let plan = build(&[
            Area { key: "z", centroid: (0.2, 0.2), demand: 1 },
            Area { key: "a", centroid: (0.8, 0.8), demand: 2 },
        ]);
        let map = plan.node_index_map();
        assert_eq!(map[&"z"], 4);
        assert_eq!(map[&"a"], 5);
        assert_eq!(plan.demand_nodes(), vec![(4, 1), (5, 2)]);
        assert_eq!(plan.aoi_at(5).map(|aoi| aoi.key), Some("a"));
    }

    #[test]
    fn test_coordinate_table_appends_aois() {
        let plan = build(&[Area { key: "a", centroid: (0.5, 0.5), demand: 5 }]);
        let table = plan.graph.coordinates();
        assert_eq!(table.len(), 5);
        assert_eq!(table[0], (0.0, 0.0));
        assert_eq!(table[4], (0.5, 0.5));
        assert!(plan.graph.is_ring_node(3));
        assert!(!plan.graph.is_ring_node(4));
    }
}
