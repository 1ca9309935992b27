//! Tagged envelopes and the registry that turns them back into typed values.
//!
//! Every typed payload embedded in a graph is stored as
//! `{"dtype": "amim/<Type>", "data": {...}}`. Decoding looks the tag up in a
//! [`Registry`]; unknown tags fail with [`Error::UnknownDtype`].

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edge::Edge;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::layer::Layer;
use crate::model::InformationModel;
use crate::node::Node;
use crate::path::Path;
use crate::robot::Robot;

/// Stable type tags of the built-in entities.
pub mod dtype {
    pub const FRAME: &str = "amim/Frame";
    pub const NODE: &str = "amim/Node";
    pub const EDGE: &str = "amim/Edge";
    pub const PATH: &str = "amim/Path";
    pub const ELEMENT: &str = "amim/Element";
    pub const LAYER: &str = "amim/Layer";
    pub const ROBOT: &str = "amim/Robot";
    pub const MODEL: &str = "amim/InformationModel";
}

/// A typed value wrapped with the tag that identifies its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub dtype: String,
    pub data: Value,
}

/// Any value the registry can reconstruct.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Frame(Frame),
    Node(Node),
    Edge(Edge),
    Path(Path),
    Element(Element),
    Layer(Layer),
    Robot(Robot),
    Model(InformationModel),
}

impl Entity {
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::Frame(_) => dtype::FRAME,
            Self::Node(_) => dtype::NODE,
            Self::Edge(_) => dtype::EDGE,
            Self::Path(_) => dtype::PATH,
            Self::Element(_) => dtype::ELEMENT,
            Self::Layer(_) => dtype::LAYER,
            Self::Robot(_) => dtype::ROBOT,
            Self::Model(_) => dtype::MODEL,
        }
    }

    pub fn data(&self) -> Result<Value> {
        match self {
            Self::Frame(f) => Ok(serde_json::to_value(f)?),
            Self::Node(n) => n.data(),
            Self::Edge(e) => e.data(),
            Self::Path(p) => p.data(),
            Self::Element(e) => e.data(),
            Self::Layer(l) => l.data(),
            Self::Robot(r) => r.data(),
            Self::Model(m) => m.data(),
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope> {
        Ok(Envelope {
            dtype: self.dtype().to_string(),
            data: self.data()?,
        })
    }
}

/// Builds an [`Entity`] from envelope data. Receives the registry so that
/// nested envelopes resolve through the same table.
pub type Decoder = fn(&Value, &Registry) -> Result<Entity>;

/// Maps dtype tags to decoders.
///
/// # Example
///
/// ```
/// use amim::v1::{Entity, Envelope, Frame, Registry};
///
/// let envelope = Envelope {
///     dtype: "amim/Frame".into(),
///     data: serde_json::to_value(Frame::world_xy()).unwrap(),
/// };
/// let entity = Registry::global().decode(&envelope).unwrap();
/// assert!(matches!(entity, Entity::Frame(_)));
///
/// let unknown = Envelope { dtype: "other/Thing".into(), data: serde_json::Value::Null };
/// assert!(Registry::global().decode(&unknown).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    decoders: HashMap<String, Decoder>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with every built-in dtype.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register(dtype::FRAME, |data, _| {
            Ok(Entity::Frame(Frame::deserialize(data)?))
        });
        registry.register(dtype::NODE, |data, _| Ok(Entity::Node(Node::from_data(data)?)));
        registry.register(dtype::EDGE, |data, _| Ok(Entity::Edge(Edge::from_data(data)?)));
        registry.register(dtype::PATH, |data, registry| {
            Ok(Entity::Path(Path::from_data_with(data, registry)?))
        });
        registry.register(dtype::ELEMENT, |data, registry| {
            Ok(Entity::Element(Element::from_data_with(data, registry)?))
        });
        registry.register(dtype::LAYER, |data, _| Ok(Entity::Layer(Layer::from_data(data)?)));
        registry.register(dtype::ROBOT, |data, _| Ok(Entity::Robot(Robot::from_data(data)?)));
        registry.register(dtype::MODEL, |data, registry| {
            Ok(Entity::Model(InformationModel::from_data_with(data, registry)?))
        });
        registry
    }

    /// The process-wide registry of built-in types.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::with_builtin_types)
    }

    /// Register `decoder` under `dtype`, returning any decoder it replaces.
    pub fn register(&mut self, dtype: impl Into<String>, decoder: Decoder) -> Option<Decoder> {
        self.decoders.insert(dtype.into(), decoder)
    }

    pub fn contains(&self, dtype: &str) -> bool {
        self.decoders.contains_key(dtype)
    }

    pub fn dtypes(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    pub fn decode(&self, envelope: &Envelope) -> Result<Entity> {
        let decoder = self
            .decoders
            .get(&envelope.dtype)
            .ok_or_else(|| Error::UnknownDtype(envelope.dtype.clone()))?;
        decoder(&envelope.data, self)
    }

    /// Decode a raw `{"dtype", "data"}` JSON value.
    pub fn decode_value(&self, value: &Value) -> Result<Entity> {
        let envelope = Envelope::deserialize(value)?;
        self.decode(&envelope)
    }
}
