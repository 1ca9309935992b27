use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::frame::{Frame, Transformation};

/// A robot taking part in the fabrication. Only its identity and placement
/// are modelled; kinematics live elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub name: String,
    #[serde(default)]
    pub base_frame: Frame,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Robot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_frame: Frame::world_xy(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_base_frame(mut self, base_frame: Frame) -> Self {
        self.base_frame = base_frame;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn transform(&mut self, transformation: &Transformation) {
        self.base_frame.transform(transformation);
    }

    pub fn data(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_data(data: &Value) -> Result<Self> {
        Ok(Self::deserialize(data)?)
    }
}
