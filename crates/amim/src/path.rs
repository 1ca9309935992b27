use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::frame::{Frame, Transformation};
use crate::graph::{ExtendedGraph, GraphData, Parent, Payload};
use crate::node::Node;
use crate::registry::{Entity, Registry, dtype};

/// Winding of a path. Classification metadata only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

/// One continuous deposition pass: an ordered sequence of [`Node`]s joined by
/// [`Edge`]s.
///
/// Each node added with the default parent is linked from the previously
/// added node. Edge vectors always match the current node origins.
///
/// # Example
///
/// ```
/// use amim::v1::{Frame, Node, Path};
/// use nalgebra::Point3;
///
/// let mut path = Path::new();
/// for x in [0.0, 1.0, 2.0] {
///     path.push(Node::new(Frame::from_point(Point3::new(x, 0.0, 0.0)))).unwrap();
/// }
///
/// assert_eq!(path.number_of_nodes(), 3);
/// assert_eq!(path.number_of_edges(), 2);
/// assert_eq!(path.get_edge_length("node_0", "node_1"), Some(1.0));
/// assert_eq!(path.get_edge_length("node_0", "node_2"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    graph: ExtendedGraph<Node, Edge>,
    /// Reference pose of the whole path.
    pub frame: Frame,
    pub direction: Direction,
}

#[derive(Serialize, Deserialize)]
struct PathData {
    #[serde(flatten)]
    graph: GraphData<Edge>,
    #[serde(default)]
    frame: Frame,
    #[serde(default)]
    direction: Direction,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Self {
            graph: ExtendedGraph::new("Path"),
            frame: Frame::world_xy(),
            direction: Direction::default(),
        }
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.graph.name = name.into();
        self
    }

    /// Build a path from nodes in order.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self> {
        let mut path = Self::new();
        path.add_nodes(nodes)?;
        Ok(path)
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.graph.name = name.into();
    }

    /// The underlying graph, for queries and attribute access.
    pub fn graph(&self) -> &ExtendedGraph<Node, Edge> {
        &self.graph
    }

    // ── Building ───────────────────────────────────────────────────────

    /// Add a node, linking it from `parent` with an edge spanning the two
    /// frame origins. Returns the node's key.
    pub fn add_node(&mut self, node: Node, key: Option<String>, parent: Parent) -> Result<String> {
        let overwrite = key.as_deref().is_some_and(|k| self.graph.has_node(k));
        let key = self
            .graph
            .add_named_node_with(node, key, parent, Edge::from_node_to_node)?;
        if overwrite {
            self.resync_edges();
        }
        Ok(key)
    }

    /// Append a node after the last one.
    pub fn push(&mut self, node: Node) -> Result<String> {
        self.add_node(node, None, Parent::Last)
    }

    /// Append nodes in order, each linked from the one before.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<Vec<String>> {
        nodes.into_iter().map(|node| self.push(node)).collect()
    }

    /// Append nodes under explicit keys, in order.
    pub fn add_named_nodes<K>(
        &mut self,
        nodes: impl IntoIterator<Item = (K, Node)>,
    ) -> Result<Vec<String>>
    where
        K: Into<String>,
    {
        nodes
            .into_iter()
            .map(|(key, node)| self.add_node(node, Some(key.into()), Parent::Last))
            .collect()
    }

    /// Mutate one node in place; edges touching it are re-derived.
    pub fn update_node<F>(&mut self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Node),
    {
        let node = self
            .graph
            .get_node_mut(key)
            .ok_or_else(|| Error::NodeNotFound(key.to_string()))?;
        f(node);
        self.resync_edges();
        Ok(())
    }

    /// Remove a node. Its predecessors are relinked to its successors so the
    /// sequence stays connected.
    pub fn remove_node(&mut self, key: &str) -> Option<Node> {
        let predecessors: Vec<String> = self.graph.predecessors(key).map(str::to_string).collect();
        let successors: Vec<String> = self.graph.successors(key).map(str::to_string).collect();
        let node = self.graph.remove_node(key)?;

        for u in &predecessors {
            for v in &successors {
                if u != v {
                    debug!(from = %u, to = %v, "bridging removed node");
                    self.graph.upsert_edge(u, v, Edge::default());
                }
            }
        }
        self.resync_edges();
        Some(node)
    }

    // ── Access ─────────────────────────────────────────────────────────

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.graph.get_node(key)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.graph.nodes()
    }

    /// Edges as `(u, v, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &Edge)> {
        self.graph
            .edges()
            .iter()
            .map(|e| (e.u.as_str(), e.v.as_str(), &e.data))
    }

    pub fn edge(&self, u: &str, v: &str) -> Option<&Edge> {
        self.graph.edge(u, v)
    }

    pub fn get_edge_length(&self, u: &str, v: &str) -> Option<f64> {
        self.edge(u, v).map(Edge::length)
    }

    pub fn number_of_nodes(&self) -> usize {
        self.graph.number_of_nodes()
    }

    pub fn number_of_edges(&self) -> usize {
        self.graph.number_of_edges()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn first_node(&self) -> Option<&Node> {
        self.graph.children().first().map(|c| &c.payload)
    }

    pub fn last_node(&self) -> Option<&Node> {
        self.graph.children().last().map(|c| &c.payload)
    }

    /// Node frames in insertion order.
    pub fn frames(&self) -> Vec<Frame> {
        self.nodes().map(|(_, node)| node.frame).collect()
    }

    /// Summed length of all edges.
    pub fn total_length(&self) -> f64 {
        self.edges().map(|(_, _, edge)| edge.length()).sum()
    }

    // ── Geometry ───────────────────────────────────────────────────────

    /// Transform the path frame and every node.
    pub fn transform(&mut self, transformation: &Transformation) {
        self.frame.transform(transformation);
        self.graph.transform(transformation);
        self.resync_edges();
    }

    pub fn transformed(&self, transformation: &Transformation) -> Self {
        let mut path = self.clone();
        path.transform(transformation);
        path
    }

    fn resync_edges(&mut self) {
        self.graph.update_edges(|a, b, edge| edge.update(a, b));
    }

    // ── Data ───────────────────────────────────────────────────────────

    pub fn data(&self) -> Result<Value> {
        let data = PathData {
            graph: self.graph.to_graph_data()?,
            frame: self.frame,
            direction: self.direction,
        };
        Ok(serde_json::to_value(data)?)
    }

    pub fn from_data(data: &Value) -> Result<Self> {
        Self::from_data_with(data, Registry::global())
    }

    /// Rebuild from data, resolving node envelopes through `registry`.
    pub fn from_data_with(data: &Value, registry: &Registry) -> Result<Self> {
        let data = PathData::deserialize(data)?;
        Ok(Self {
            graph: ExtendedGraph::from_graph_data(data.graph, registry)?,
            frame: data.frame,
            direction: data.direction,
        })
    }
}

impl Payload for Path {
    fn node_type(&self) -> &'static str {
        "path"
    }

    fn dtype(&self) -> &'static str {
        dtype::PATH
    }

    fn to_data(&self) -> Result<Value> {
        self.data()
    }

    fn from_entity(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Path(path) => Ok(path),
            other => Err(Error::UnexpectedDtype {
                expected: dtype::PATH.to_string(),
                found: other.dtype().to_string(),
            }),
        }
    }

    fn transform(&mut self, transformation: &Transformation) {
        Path::transform(self, transformation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_warnings;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn node_at(x: f64, y: f64, z: f64) -> Node {
        Node::new(Frame::from_point(Point3::new(x, y, z)))
    }

    fn straight_path() -> Path {
        Path::from_nodes([
            node_at(0.0, 0.0, 0.0),
            node_at(1.0, 0.0, 0.0),
            node_at(2.0, 0.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_three_node_scenario() {
        let path = straight_path();
        assert_eq!(path.number_of_edges(), 2);
        for (u, v) in [("node_0", "node_1"), ("node_1", "node_2")] {
            let edge = path.edge(u, v).unwrap();
            assert_eq!(edge.vector(), Vector3::new(1.0, 0.0, 0.0));
            assert_relative_eq!(edge.length(), 1.0);
        }
        assert_relative_eq!(path.total_length(), 2.0);
    }

    #[test]
    fn test_duplicate_key_scenario() {
        let mut path = Path::new();
        path.add_node(node_at(0.0, 0.0, 0.0), Some("node_0".into()), Parent::Last)
            .unwrap();
        let (_, logs) = capture_warnings(|| {
            path.add_node(node_at(3.0, 0.0, 0.0), Some("node_0".into()), Parent::Last)
                .unwrap()
        });
        assert!(logs.contains("key already in graph, value is overwritten"));
        assert!(logs.contains("node_0"));
        assert_eq!(path.number_of_nodes(), 1);
        assert_eq!(path.number_of_edges(), 0);
        assert_eq!(path.node("node_0").unwrap().frame.point().x, 3.0);
    }

    #[test]
    fn test_edge_count_invariant() {
        for n in 0..6 {
            let nodes = (0..n).map(|i| node_at(i as f64, 0.0, 0.0));
            let path = Path::from_nodes(nodes).unwrap();
            assert_eq!(path.number_of_nodes(), n);
            assert_eq!(path.number_of_edges(), n.saturating_sub(1));
        }
    }

    #[test]
    fn test_overwrite_resyncs_edges() {
        let mut path = straight_path();
        path.add_node(node_at(1.0, 3.0, 0.0), Some("node_1".into()), Parent::Unlinked)
            .unwrap();
        assert_eq!(path.number_of_edges(), 2);
        assert_eq!(
            path.edge("node_0", "node_1").unwrap().vector(),
            Vector3::new(1.0, 3.0, 0.0)
        );
        assert_eq!(
            path.edge("node_1", "node_2").unwrap().vector(),
            Vector3::new(1.0, -3.0, 0.0)
        );
    }

    #[test]
    fn test_update_node_resyncs_edges() {
        let mut path = straight_path();
        path.update_node("node_2", |n| n.frame.set_point(Point3::new(1.0, 0.0, 5.0)))
            .unwrap();
        assert_relative_eq!(path.get_edge_length("node_1", "node_2").unwrap(), 5.0);
        assert!(path.update_node("node_9", |_| {}).is_err());
    }

    #[test]
    fn test_remove_middle_bridges() {
        let mut path = straight_path();
        let removed = path.remove_node("node_1").unwrap();
        assert_eq!(removed.frame.point().x, 1.0);
        assert_eq!(path.number_of_nodes(), 2);
        assert_eq!(path.number_of_edges(), 1);
        assert_relative_eq!(path.get_edge_length("node_0", "node_2").unwrap(), 2.0);

        path.push(node_at(3.0, 0.0, 0.0)).unwrap();
        assert!(path.edge("node_2", "node_3").is_some());
    }

    #[test]
    fn test_remove_last_moves_tail() {
        let mut path = straight_path();
        path.remove_node("node_2");
        let key = path.push(node_at(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(key, "node_2");
        assert_relative_eq!(path.get_edge_length("node_1", "node_2").unwrap(), 4.0);
    }

    #[test]
    fn test_first_last_and_frames() {
        let path = straight_path();
        assert_eq!(path.first_node().unwrap().frame.point().x, 0.0);
        assert_eq!(path.last_node().unwrap().frame.point().x, 2.0);
        assert_eq!(path.frames().len(), 3);
        assert!(Path::new().first_node().is_none());
    }

    #[test]
    fn test_transform_roundtrip() {
        let t = Transformation::new(Vector3::new(1.0, -2.0, 0.5), Vector3::new(0.0, 0.0, 1.2));
        let path = straight_path();
        let back = path.transformed(&t).transformed(&t.inverse());
        for ((_, a), (_, b)) in back.nodes().zip(path.nodes()) {
            assert!(a.frame.approx_eq(&b.frame, 1e-12));
        }
        assert!(back.frame.approx_eq(&path.frame, 1e-12));
    }

    #[test]
    fn test_transform_rotates_edges() {
        let t = Transformation::rotation(Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
        let path = straight_path().transformed(&t);
        let v = path.edge("node_0", "node_1").unwrap().vector();
        assert_relative_eq!(v, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(path.total_length(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_data_roundtrip() {
        let mut path = straight_path()
            .with_direction(Direction::CounterClockwise)
            .with_name("outer");
        path.update_node("node_1", |n| n.set_extrusion_rate(0.4))
            .unwrap();
        let data = path.data().unwrap();
        assert_eq!(data["name"], "outer");
        assert_eq!(data["direction"], "counter_clockwise");
        assert_eq!(data["nodes"][0]["payload"]["dtype"], "amim/Node");

        let parsed = Path::from_data(&data).unwrap();
        assert_eq!(parsed, path);
        assert_eq!(parsed.data().unwrap(), data);
    }

    #[test]
    fn test_from_data_wrong_payload_type() {
        let mut data = straight_path().data().unwrap();
        data["nodes"][0]["payload"]["dtype"] = "amim/Frame".into();
        data["nodes"][0]["payload"]["data"] = serde_json::to_value(Frame::world_xy()).unwrap();
        assert!(matches!(
            Path::from_data(&data),
            Err(Error::UnexpectedDtype { .. })
        ));
    }
}
