use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::frame::{Frame, Transformation};
use crate::graph::{ExtendedGraph, GraphData, Parent, Payload};
use crate::path::Path;
use crate::registry::{Entity, Registry, dtype};
use crate::state::FabricationState;

/// The six boundary poses an element presents to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConnectionSlot {
    #[serde(rename = "connection_ua")]
    Ua,
    #[serde(rename = "connection_ub")]
    Ub,
    #[serde(rename = "connection_va")]
    Va,
    #[serde(rename = "connection_vb")]
    Vb,
    #[serde(rename = "connection_wa")]
    Wa,
    #[serde(rename = "connection_wb")]
    Wb,
}

impl ConnectionSlot {
    pub const ALL: [ConnectionSlot; 6] = [
        Self::Ua,
        Self::Ub,
        Self::Va,
        Self::Vb,
        Self::Wa,
        Self::Wb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ua => "connection_ua",
            Self::Ub => "connection_ub",
            Self::Va => "connection_va",
            Self::Vb => "connection_vb",
            Self::Wa => "connection_wa",
            Self::Wb => "connection_wb",
        }
    }
}

/// A fabrication unit: one or more [`Path`]s printed as a physically
/// distinguishable part.
///
/// Connection frames are computed from the current paths on every read:
///
/// | slot | default                                |
/// |------|----------------------------------------|
/// | `ua` | first node of the first path           |
/// | `ub` | last node of the first path            |
/// | `va` | element frame                          |
/// | `vb` | element frame                          |
/// | `wa` | first node of the first path           |
/// | `wb` | first node of the last added path      |
///
/// Any slot can be pinned with [`set_connection_frames`](Self::set_connection_frames).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    graph: ExtendedGraph<Path>,
    pub frame: Frame,
    pub state: FabricationState,
    connection_overrides: BTreeMap<ConnectionSlot, Frame>,
    /// Reference to the solid or mesh the paths were generated from.
    pub source: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ElementData {
    #[serde(flatten)]
    graph: GraphData<()>,
    #[serde(default)]
    frame: Frame,
    #[serde(default)]
    state: FabricationState,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    connection_frames: BTreeMap<ConnectionSlot, Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

impl Element {
    pub fn new() -> Self {
        Self {
            graph: ExtendedGraph::new("element"),
            frame: Frame::world_xy(),
            state: FabricationState::default(),
            connection_overrides: BTreeMap::new(),
            source: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.graph.name = name.into();
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.graph.name = name.into();
    }

    pub fn graph(&self) -> &ExtendedGraph<Path> {
        &self.graph
    }

    // ── Paths ──────────────────────────────────────────────────────────

    /// Add a path, linked from `parent` (by default the last added path).
    pub fn add_path(&mut self, path: Path, key: Option<String>, parent: Parent) -> Result<String> {
        self.graph.add_named_node(path, key, parent)
    }

    pub fn push(&mut self, path: Path) -> Result<String> {
        self.add_path(path, None, Parent::Last)
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.graph.nodes()
    }

    pub fn path(&self, key: &str) -> Option<&Path> {
        self.graph.get_node(key)
    }

    pub fn path_mut(&mut self, key: &str) -> Option<&mut Path> {
        self.graph.get_node_mut(key)
    }

    pub fn remove_path(&mut self, key: &str) -> Option<Path> {
        self.graph.remove_node(key)
    }

    pub fn number_of_paths(&self) -> usize {
        self.graph.number_of_nodes()
    }

    /// Nodes across all paths.
    pub fn number_of_nodes(&self) -> usize {
        self.paths().map(|(_, p)| p.number_of_nodes()).sum()
    }

    pub fn total_length(&self) -> f64 {
        self.paths().map(|(_, p)| p.total_length()).sum()
    }

    // ── State ──────────────────────────────────────────────────────────

    pub fn is_constructed(&self) -> bool {
        self.state.is_placed()
    }

    // ── Connection frames ──────────────────────────────────────────────

    /// The frame for `slot`: the pinned override if any, otherwise derived
    /// from the current paths. `None` when the element has no paths to
    /// derive it from.
    pub fn connection_frame(&self, slot: ConnectionSlot) -> Option<Frame> {
        if let Some(frame) = self.connection_overrides.get(&slot) {
            return Some(*frame);
        }

        let first_path = self.graph.children().first().map(|c| &c.payload);
        let last_path = self
            .graph
            .last_key("path")
            .and_then(|key| self.graph.get_node(key));

        match slot {
            ConnectionSlot::Ua | ConnectionSlot::Wa => first_path?.first_node().map(|n| n.frame),
            ConnectionSlot::Ub => first_path?.last_node().map(|n| n.frame),
            ConnectionSlot::Wb => last_path?.first_node().map(|n| n.frame),
            ConnectionSlot::Va | ConnectionSlot::Vb => Some(self.frame),
        }
    }

    /// Every available connection frame.
    pub fn connection_frames(&self) -> BTreeMap<ConnectionSlot, Frame> {
        ConnectionSlot::ALL
            .into_iter()
            .filter_map(|slot| self.connection_frame(slot).map(|f| (slot, f)))
            .collect()
    }

    /// Pin any subset of the connection frames.
    pub fn set_connection_frames(
        &mut self,
        overrides: impl IntoIterator<Item = (ConnectionSlot, Frame)>,
    ) {
        self.connection_overrides.extend(overrides);
    }

    /// Return a slot to its derived value.
    pub fn clear_connection_frame(&mut self, slot: ConnectionSlot) -> Option<Frame> {
        self.connection_overrides.remove(&slot)
    }

    pub fn connection_overrides(&self) -> &BTreeMap<ConnectionSlot, Frame> {
        &self.connection_overrides
    }

    // ── Geometry ───────────────────────────────────────────────────────

    /// Transform the element frame, pinned connection frames and every path.
    pub fn transform(&mut self, transformation: &Transformation) {
        self.frame.transform(transformation);
        for frame in self.connection_overrides.values_mut() {
            frame.transform(transformation);
        }
        self.graph.transform(transformation);
    }

    pub fn transformed(&self, transformation: &Transformation) -> Self {
        let mut element = self.clone();
        element.transform(transformation);
        element
    }

    // ── Data ───────────────────────────────────────────────────────────

    pub fn data(&self) -> Result<Value> {
        let data = ElementData {
            graph: self.graph.to_graph_data()?,
            frame: self.frame,
            state: self.state,
            connection_frames: self.connection_overrides.clone(),
            source: self.source.clone(),
        };
        Ok(serde_json::to_value(data)?)
    }

    pub fn from_data(data: &Value) -> Result<Self> {
        Self::from_data_with(data, Registry::global())
    }

    pub fn from_data_with(data: &Value, registry: &Registry) -> Result<Self> {
        let data = ElementData::deserialize(data)?;
        Ok(Self {
            graph: ExtendedGraph::from_graph_data(data.graph, registry)?,
            frame: data.frame,
            state: data.state,
            connection_overrides: data.connection_frames,
            source: data.source,
        })
    }
}

impl Payload for Element {
    fn node_type(&self) -> &'static str {
        "element"
    }

    fn dtype(&self) -> &'static str {
        dtype::ELEMENT
    }

    fn to_data(&self) -> Result<Value> {
        self.data()
    }

    fn from_entity(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Element(element) => Ok(element),
            other => Err(Error::UnexpectedDtype {
                expected: dtype::ELEMENT.to_string(),
                found: other.dtype().to_string(),
            }),
        }
    }

    fn transform(&mut self, transformation: &Transformation) {
        Element::transform(self, transformation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn line(y: f64, n: usize) -> Path {
        let nodes = (0..n).map(|i| Node::new(Frame::from_point(Point3::new(i as f64, y, 0.0))));
        Path::from_nodes(nodes).unwrap()
    }

    fn two_path_element() -> Element {
        let mut element = Element::new();
        element.push(line(0.0, 3)).unwrap();
        element.push(line(1.0, 4)).unwrap();
        element
    }

    #[test]
    fn test_add_paths_links_last() {
        let element = two_path_element();
        assert_eq!(element.number_of_paths(), 2);
        assert_eq!(element.number_of_nodes(), 7);
        assert!(element.graph().has_edge("path_0", "path_1"));
        assert_relative_eq!(element.total_length(), 5.0);
    }

    #[test]
    fn test_connection_frames_derived() {
        let element = two_path_element();
        let frames = element.connection_frames();
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[&ConnectionSlot::Ua].point(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(frames[&ConnectionSlot::Ub].point(), Point3::new(2.0, 0.0, 0.0));
        assert_eq!(frames[&ConnectionSlot::Wa].point(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(frames[&ConnectionSlot::Wb].point(), Point3::new(0.0, 1.0, 0.0));
        assert_eq!(frames[&ConnectionSlot::Va], element.frame);
    }

    #[test]
    fn test_connection_frames_follow_new_paths() {
        let mut element = two_path_element();
        element.push(line(2.0, 2)).unwrap();
        let wb = element.connection_frame(ConnectionSlot::Wb).unwrap();
        assert_eq!(wb.point(), Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_connection_frames_empty_element() {
        let element = Element::new();
        let frames = element.connection_frames();
        assert_eq!(frames.len(), 2);
        assert!(frames.contains_key(&ConnectionSlot::Va));
        assert!(element.connection_frame(ConnectionSlot::Ua).is_none());
    }

    #[test]
    fn test_override_and_clear() {
        let mut element = two_path_element();
        let pinned = Frame::from_point(Point3::new(9.0, 9.0, 9.0));
        element.set_connection_frames([(ConnectionSlot::Ub, pinned)]);
        assert_eq!(element.connection_frame(ConnectionSlot::Ub), Some(pinned));
        assert_eq!(
            element.connection_frame(ConnectionSlot::Ua).unwrap().point(),
            Point3::origin()
        );
        element.clear_connection_frame(ConnectionSlot::Ub);
        assert_eq!(
            element.connection_frame(ConnectionSlot::Ub).unwrap().point(),
            Point3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_transform_moves_derived_and_pinned() {
        let mut element = two_path_element();
        element.set_connection_frames([(ConnectionSlot::Vb, Frame::world_xy())]);
        element.transform(&Transformation::translation(0.0, 0.0, 2.0));
        assert_eq!(
            element.connection_frame(ConnectionSlot::Ua).unwrap().point(),
            Point3::new(0.0, 0.0, 2.0)
        );
        assert_eq!(
            element.connection_frame(ConnectionSlot::Vb).unwrap().point(),
            Point3::new(0.0, 0.0, 2.0)
        );
        assert_eq!(element.frame.point(), Point3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_transform_roundtrip() {
        let t = Transformation::new(Vector3::new(0.3, 0.0, -1.0), Vector3::new(0.4, -0.2, 0.9));
        let element = two_path_element();
        let back = element.transformed(&t).transformed(&t.inverse());
        for ((_, a), (_, b)) in back.paths().zip(element.paths()) {
            for (fa, fb) in a.frames().iter().zip(b.frames()) {
                assert!(fa.approx_eq(&fb, 1e-12));
            }
        }
        assert!(back.frame.approx_eq(&element.frame, 1e-12));
    }

    #[test]
    fn test_state() {
        let mut element = two_path_element();
        assert!(!element.is_constructed());
        element.state.mark_placed().unwrap();
        assert!(element.is_constructed());
    }

    #[test]
    fn test_data_roundtrip() {
        let mut element = two_path_element().with_source("wall.stl").with_name("wall");
        let pinned = Frame::from_point(Point3::new(1.0, 2.0, 3.0));
        element.set_connection_frames([(ConnectionSlot::Wb, pinned)]);
        element.state.mark_planned().unwrap();

        let data = element.data().unwrap();
        assert_eq!(data["nodes"][1]["payload"]["dtype"], "amim/Path");
        assert!(data["connection_frames"].get("connection_wb").is_some());
        assert_eq!(data["state"], "planned");

        let parsed = Element::from_data(&data).unwrap();
        assert_eq!(parsed, element);
        assert_eq!(parsed.data().unwrap(), data);
    }
}
