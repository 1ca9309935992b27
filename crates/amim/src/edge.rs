use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::Transformation;
use crate::node::Node;

/// Directed geometric relation between two nodes of a path.
///
/// Stores the displacement between the two node origins. The edge's key is
/// the `(u, v)` pair under which its owning graph stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(with = "vector_serde")]
    vector: Vector3<f64>,
}

fn default_name() -> String {
    "edge".to_string()
}

mod vector_serde {
    use nalgebra::Vector3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vector3<f64>, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vector3<f64>, D::Error> {
        let xyz = <[f64; 3]>::deserialize(d)?;
        Ok(Vector3::from(xyz))
    }
}

impl Default for Edge {
    fn default() -> Self {
        Self::new(Vector3::zeros())
    }
}

impl Edge {
    pub fn new(vector: Vector3<f64>) -> Self {
        Self {
            name: default_name(),
            vector,
        }
    }

    /// The edge from `node_0`'s frame origin to `node_1`'s.
    pub fn from_node_to_node(node_0: &Node, node_1: &Node) -> Self {
        Self::new(node_1.frame.point() - node_0.frame.point())
    }

    /// Re-derive the displacement after either endpoint moved.
    pub fn update(&mut self, node_0: &Node, node_1: &Node) {
        self.vector = node_1.frame.point() - node_0.frame.point();
    }

    pub fn vector(&self) -> Vector3<f64> {
        self.vector
    }

    pub fn length(&self) -> f64 {
        self.vector.norm()
    }

    /// Rotate the stored displacement; translation does not affect it.
    pub fn transform(&mut self, transformation: &Transformation) {
        self.vector = transformation.rotation * self.vector;
    }

    pub fn data(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_data(data: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_from_node_to_node() {
        let a = Node::new(Frame::from_point(Point3::new(1.0, 1.0, 0.0)));
        let b = Node::new(Frame::from_point(Point3::new(4.0, 5.0, 0.0)));
        let edge = Edge::from_node_to_node(&a, &b);
        assert_eq!(edge.vector(), Vector3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(edge.length(), 5.0);
        assert_eq!(edge.name, "edge");
    }

    #[test]
    fn test_transform_ignores_translation() {
        let mut edge = Edge::new(Vector3::new(1.0, 0.0, 0.0));
        edge.transform(&Transformation::translation(10.0, 10.0, 10.0));
        assert_eq!(edge.vector(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_update_follows_nodes() {
        let a = Node::new(Frame::world_xy());
        let mut b = Node::new(Frame::from_point(Point3::new(1.0, 0.0, 0.0)));
        let mut edge = Edge::from_node_to_node(&a, &b);
        b.frame.set_point(Point3::new(0.0, 2.0, 0.0));
        edge.update(&a, &b);
        assert_relative_eq!(edge.length(), 2.0);
    }

    #[test]
    fn test_data_roundtrip() {
        let edge = Edge::new(Vector3::new(0.5, -1.0, 2.0));
        let data = edge.data().unwrap();
        assert_eq!(data["vector"], serde_json::json!([0.5, -1.0, 2.0]));
        let parsed = Edge::from_data(&data).unwrap();
        assert_eq!(parsed, edge);
    }
}
