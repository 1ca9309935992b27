use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::frame::{Frame, Transformation};
use crate::node::Node;
use crate::state::FabricationState;

/// A discrete, ordered set of nodes printed as one layer.
///
/// Unlike a [`Path`](crate::path::Path) a layer keeps no edges; its order is
/// the order of `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub state: FabricationState,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            state: FabricationState::default(),
        }
    }

    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn end_node(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// The cartesian tool path: node frames in order.
    pub fn frames(&self) -> Vec<Frame> {
        self.nodes.iter().map(|n| n.frame).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn transform(&mut self, transformation: &Transformation) {
        for node in &mut self.nodes {
            node.transform(transformation);
        }
    }

    pub fn transformed(&self, transformation: &Transformation) -> Self {
        let mut layer = self.clone();
        layer.transform(transformation);
        layer
    }

    pub fn data(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_data(data: &Value) -> Result<Self> {
        Ok(Self::deserialize(data)?)
    }
}
