use std::collections::BTreeMap;
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::frame::Transformation;
use crate::graph::{ExtendedGraph, GraphData, Parent, Payload};
use crate::layer::Layer;
use crate::registry::{Entity, Registry, dtype};
use crate::robot::Robot;

/// A child of an [`InformationModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModelChild {
    Element(Element),
    Layer(Layer),
    Robot(Robot),
}

impl Payload for ModelChild {
    fn node_type(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Layer(_) => "layer",
            Self::Robot(_) => "robot",
        }
    }

    fn dtype(&self) -> &'static str {
        match self {
            Self::Element(_) => dtype::ELEMENT,
            Self::Layer(_) => dtype::LAYER,
            Self::Robot(_) => dtype::ROBOT,
        }
    }

    fn to_data(&self) -> Result<Value> {
        match self {
            Self::Element(e) => e.data(),
            Self::Layer(l) => l.data(),
            Self::Robot(r) => r.data(),
        }
    }

    fn from_entity(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Element(e) => Ok(Self::Element(e)),
            Entity::Layer(l) => Ok(Self::Layer(l)),
            Entity::Robot(r) => Ok(Self::Robot(r)),
            other => Err(Error::UnexpectedDtype {
                expected: format!("{} | {} | {}", dtype::ELEMENT, dtype::LAYER, dtype::ROBOT),
                found: other.dtype().to_string(),
            }),
        }
    }

    /// Robots stay where they are; only fabricated geometry moves.
    fn transform(&mut self, transformation: &Transformation) {
        match self {
            Self::Element(e) => e.transform(transformation),
            Self::Layer(l) => l.transform(transformation),
            Self::Robot(_) => {}
        }
    }
}

/// Top-level assembly of elements, layers and robots.
///
/// Elements and layers are each linked from the previously added child of
/// their own type; robots are never linked. Further connections between
/// children can be added with [`add_connection`](Self::add_connection).
///
/// # Example
///
/// ```
/// use amim::v1::{Element, InformationModel, Robot};
///
/// let mut model = InformationModel::new();
/// model.add_element(Element::new()).unwrap();
/// model.add_element(Element::new()).unwrap();
/// model.add_robot(Robot::new("r1")).unwrap();
///
/// assert_eq!(model.number_of_elements(), 2);
/// assert_eq!(model.number_of_robots(), 1);
/// assert_eq!(model.number_of_connections(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InformationModel {
    graph: ExtendedGraph<ModelChild>,
}

#[derive(Serialize, Deserialize)]
struct ModelData {
    #[serde(flatten)]
    graph: GraphData<()>,
}

impl Default for InformationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InformationModel {
    pub fn new() -> Self {
        Self {
            graph: ExtendedGraph::new("InformationModel"),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.graph.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.graph.name = name.into();
    }

    /// User metadata of the whole model.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.graph.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.graph.attributes
    }

    /// Template copied into the attributes of every child added from now on.
    pub fn default_child_attributes_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.graph.default_child_attributes
    }

    pub fn graph(&self) -> &ExtendedGraph<ModelChild> {
        &self.graph
    }

    // ── Adding ─────────────────────────────────────────────────────────

    pub fn add_element(&mut self, element: Element) -> Result<String> {
        self.add_element_with(element, None, Parent::Last)
    }

    pub fn add_element_with(
        &mut self,
        element: Element,
        key: Option<String>,
        parent: Parent,
    ) -> Result<String> {
        self.graph
            .add_named_node(ModelChild::Element(element), key, parent)
    }

    pub fn add_layer(&mut self, layer: Layer) -> Result<String> {
        self.add_layer_with(layer, None, Parent::Last)
    }

    pub fn add_layer_with(
        &mut self,
        layer: Layer,
        key: Option<String>,
        parent: Parent,
    ) -> Result<String> {
        self.graph
            .add_named_node(ModelChild::Layer(layer), key, parent)
    }

    /// Add a robot under a minted `robot_<n>` key, without any link.
    pub fn add_robot(&mut self, robot: Robot) -> Result<String> {
        self.graph
            .add_named_node(ModelChild::Robot(robot), None, Parent::Unlinked)
    }

    /// Connect two existing children.
    pub fn add_connection(&mut self, u: &str, v: &str) -> Result<()> {
        self.graph.add_edge(u, v, ())
    }

    pub fn remove(&mut self, key: &str) -> Option<ModelChild> {
        self.graph.remove_node(key)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }

    // ── Access ─────────────────────────────────────────────────────────

    pub fn elements(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.graph.nodes().filter_map(|(key, child)| match child {
            ModelChild::Element(e) => Some((key, e)),
            _ => None,
        })
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &Layer)> {
        self.graph.nodes().filter_map(|(key, child)| match child {
            ModelChild::Layer(l) => Some((key, l)),
            _ => None,
        })
    }

    pub fn robots(&self) -> impl Iterator<Item = (&str, &Robot)> {
        self.graph.nodes().filter_map(|(key, child)| match child {
            ModelChild::Robot(r) => Some((key, r)),
            _ => None,
        })
    }

    pub fn element(&self, key: &str) -> Option<&Element> {
        match self.graph.get_node(key)? {
            ModelChild::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, key: &str) -> Option<&mut Element> {
        match self.graph.get_node_mut(key)? {
            ModelChild::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn layer(&self, key: &str) -> Option<&Layer> {
        match self.graph.get_node(key)? {
            ModelChild::Layer(l) => Some(l),
            _ => None,
        }
    }

    pub fn layer_mut(&mut self, key: &str) -> Option<&mut Layer> {
        match self.graph.get_node_mut(key)? {
            ModelChild::Layer(l) => Some(l),
            _ => None,
        }
    }

    pub fn robot(&self, key: &str) -> Option<&Robot> {
        match self.graph.get_node(key)? {
            ModelChild::Robot(r) => Some(r),
            _ => None,
        }
    }

    /// Connections as `(u, v)`.
    pub fn connections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph
            .edges()
            .iter()
            .map(|e| (e.u.as_str(), e.v.as_str()))
    }

    pub fn number_of_elements(&self) -> usize {
        self.graph.count("element")
    }

    pub fn number_of_layers(&self) -> usize {
        self.graph.count("layer")
    }

    pub fn number_of_robots(&self) -> usize {
        self.graph.count("robot")
    }

    pub fn number_of_connections(&self) -> usize {
        self.graph.number_of_edges()
    }

    /// Deposited length over all elements.
    pub fn total_length(&self) -> f64 {
        self.elements().map(|(_, e)| e.total_length()).sum()
    }

    // ── Geometry ───────────────────────────────────────────────────────

    /// Transform every element and layer.
    pub fn transform(&mut self, transformation: &Transformation) {
        self.graph.transform(transformation);
    }

    pub fn transformed(&self, transformation: &Transformation) -> Self {
        let mut model = self.copy();
        model.transform(transformation);
        model
    }

    /// A structurally independent deep copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    // ── Data ───────────────────────────────────────────────────────────

    pub fn data(&self) -> Result<Value> {
        let data = ModelData {
            graph: self.graph.to_graph_data()?,
        };
        Ok(serde_json::to_value(data)?)
    }

    pub fn from_data(data: &Value) -> Result<Self> {
        Self::from_data_with(data, Registry::global())
    }

    pub fn from_data_with(data: &Value, registry: &Registry) -> Result<Self> {
        let data = ModelData::deserialize(data)?;
        Ok(Self {
            graph: ExtendedGraph::from_graph_data(data.graph, registry)?,
        })
    }

    /// Write the model's data as pretty-printed JSON.
    pub fn to_json_file(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.data()?)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "wrote model");
        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<FsPath>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let data: Value = serde_json::from_str(&content)?;
        Self::from_data(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::node::Node;
    use crate::path::Path;
    use nalgebra::{Point3, Vector3};
    use serde_json::json;

    fn element_at(y: f64) -> Element {
        let path = Path::from_nodes(
            (0..3).map(|i| Node::new(Frame::from_point(Point3::new(i as f64, y, 0.0)))),
        )
        .unwrap();
        let mut element = Element::new();
        element.push(path).unwrap();
        element
    }

    fn sample_model() -> InformationModel {
        let mut model = InformationModel::new().with_name("wall");
        model.add_element(element_at(0.0)).unwrap();
        model.add_element(element_at(1.0)).unwrap();
        model
            .add_layer(Layer::from_nodes([Node::new(Frame::world_xy())]))
            .unwrap();
        model.add_robot(Robot::new("r1")).unwrap();
        model
    }

    #[test]
    fn test_counts_track_graph() {
        let model = sample_model();
        assert_eq!(model.number_of_elements(), 2);
        assert_eq!(model.number_of_layers(), 1);
        assert_eq!(model.number_of_robots(), 1);
        assert_eq!(model.number_of_connections(), 1);
        assert_eq!(model.elements().count(), 2);
        assert_eq!(model.name(), "wall");
    }

    #[test]
    fn test_keys_and_links() {
        let mut model = sample_model();
        assert!(model.element("element_1").is_some());
        assert!(model.layer("layer_0").is_some());
        assert!(model.robot("robot_0").is_some());
        assert!(model.element("robot_0").is_none());
        assert!(model.graph().has_edge("element_0", "element_1"));

        let key = model.add_robot(Robot::new("r2")).unwrap();
        assert_eq!(key, "robot_1");
        assert_eq!(model.graph().predecessors("robot_1").count(), 0);
        assert_eq!(model.number_of_connections(), 1);
    }

    #[test]
    fn test_add_connection() {
        let mut model = sample_model();
        model.add_connection("element_1", "layer_0").unwrap();
        assert_eq!(model.number_of_connections(), 2);
        assert!(model.add_connection("element_1", "element_9").is_err());
        let connections: Vec<_> = model.connections().collect();
        assert!(connections.contains(&("element_1", "layer_0")));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut model = sample_model();
        assert!(matches!(model.remove("element_0"), Some(ModelChild::Element(_))));
        assert_eq!(model.number_of_elements(), 1);
        assert_eq!(model.number_of_connections(), 0);
        model.clear();
        assert_eq!(model.number_of_elements(), 0);
        assert!(model.graph().is_empty());
    }

    #[test]
    fn test_transform_robot_unmoved() {
        let model = sample_model();
        let moved = model.transformed(&Transformation::translation(0.0, 0.0, 1.0));
        let path = moved.element("element_0").unwrap().path("path_0").unwrap();
        assert_eq!(path.first_node().unwrap().frame.point().z, 1.0);
        assert_eq!(moved.layer("layer_0").unwrap().frames()[0].point().z, 1.0);
        assert_eq!(moved.robot("robot_0").unwrap().base_frame.point().z, 0.0);
        let original = model.element("element_0").unwrap().path("path_0").unwrap();
        assert_eq!(original.first_node().unwrap().frame.point().z, 0.0);
    }

    #[test]
    fn test_transform_roundtrip() {
        let t = Transformation::new(Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.1, 0.2, 0.3));
        let model = sample_model();
        let back = model.transformed(&t).transformed(&t.inverse());
        for ((_, a), (_, b)) in back.elements().zip(model.elements()) {
            for ((_, pa), (_, pb)) in a.paths().zip(b.paths()) {
                for (fa, fb) in pa.frames().iter().zip(pb.frames()) {
                    assert!(fa.approx_eq(&fb, 1e-12));
                }
            }
        }
    }

    #[test]
    fn test_copy_is_independent() {
        let model = sample_model();
        let mut copy = model.copy();
        copy.element_mut("element_0")
            .unwrap()
            .state
            .mark_placed()
            .unwrap();
        assert!(!model.element("element_0").unwrap().is_constructed());
        assert!(copy.element("element_0").unwrap().is_constructed());
    }

    #[test]
    fn test_default_child_attributes() {
        let mut model = InformationModel::new();
        model
            .default_child_attributes_mut()
            .insert("is_planned".into(), json!(false));
        model.add_element(Element::new()).unwrap();
        assert_eq!(
            model.graph().node_attribute("element_0", "is_planned"),
            Some(&json!(false))
        );
    }

    #[test]
    fn test_data_roundtrip() {
        let mut model = sample_model();
        model.attributes_mut().insert("material".into(), json!("clay"));
        let data = model.data().unwrap();
        assert_eq!(data["name"], "wall");
        assert_eq!(data["nodes"][3]["payload"]["dtype"], "amim/Robot");

        let parsed = InformationModel::from_data(&data).unwrap();
        assert_eq!(parsed, model);
        assert_eq!(parsed.data().unwrap(), data);
    }

    #[test]
    fn test_rejects_path_child() {
        let mut data = sample_model().data().unwrap();
        data["nodes"][0]["payload"] = json!({
            "dtype": "amim/Path",
            "data": Path::new().data().unwrap(),
        });
        assert!(matches!(
            InformationModel::from_data(&data),
            Err(Error::UnexpectedDtype { .. })
        ));
    }

    #[test]
    fn test_from_data_repeated_element_rejected() {
        let mut model = InformationModel::new();
        model.add_element(element_at(0.0)).unwrap();
        let mut data = model.data().unwrap();
        let first = data["nodes"][0].clone();
        data["nodes"].as_array_mut().unwrap().push(first);
        assert!(matches!(
            InformationModel::from_data(&data),
            Err(Error::DuplicateKey(k)) if k == "element_0"
        ));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("model.json");
        let model = sample_model();
        model.to_json_file(&file).unwrap();
        let loaded = InformationModel::from_json_file(&file).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_missing_file() {
        let err = InformationModel::from_json_file("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
