use serde_json::Value;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::frame::Transformation;
use crate::model::InformationModel;
use crate::node::Node;
use crate::path::Path;
use crate::registry::{Entity, Envelope, Registry};

/// Any top-level AMIM document.
///
/// On disk a document is a dtype envelope:
///
/// ```json
/// { "dtype": "amim/Path", "data": { "name": "Path", "nodes": [ … ], "edges": [ … ] } }
/// ```
///
/// A JSON object without a `dtype` key is read as bare
/// [`InformationModel`] data, which is what
/// [`InformationModel::to_json_file`] writes.
///
/// # Example
///
/// ```
/// use amim::v1::{Document, Frame, Node, Path};
///
/// let path = Path::from_nodes([Node::new(Frame::world_xy())]).unwrap();
/// let json = Document::from(path).to_json().unwrap();
/// assert!(json.contains("\"dtype\":\"amim/Path\""));
///
/// let doc = Document::from_json(&json).unwrap();
/// assert_eq!(doc.kind(), "Path");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Model(InformationModel),
    Element(Element),
    Path(Path),
    Node(Node),
}

impl Document {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "InformationModel",
            Self::Element(_) => "Element",
            Self::Path(_) => "Path",
            Self::Node(_) => "Node",
        }
    }

    pub fn from_entity(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Model(m) => Ok(Self::Model(m)),
            Entity::Element(e) => Ok(Self::Element(e)),
            Entity::Path(p) => Ok(Self::Path(p)),
            Entity::Node(n) => Ok(Self::Node(n)),
            other => Err(Error::UnexpectedDtype {
                expected: "a document type".to_string(),
                found: other.dtype().to_string(),
            }),
        }
    }

    pub fn into_entity(self) -> Entity {
        match self {
            Self::Model(m) => Entity::Model(m),
            Self::Element(e) => Entity::Element(e),
            Self::Path(p) => Entity::Path(p),
            Self::Node(n) => Entity::Node(n),
        }
    }

    /// Read a document from a parsed JSON value.
    pub fn from_value_with(value: &Value, registry: &Registry) -> Result<Self> {
        if value.get("dtype").is_some() {
            return Self::from_entity(registry.decode_value(value)?);
        }
        Ok(Self::Model(InformationModel::from_data_with(value, registry)?))
    }

    /// Parse a document from JSON using the built-in registry.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value_with(&value, Registry::global())
    }

    pub fn to_envelope(&self) -> Result<Envelope> {
        let data = match self {
            Self::Model(m) => m.data()?,
            Self::Element(e) => e.data()?,
            Self::Path(p) => p.data()?,
            Self::Node(n) => n.data()?,
        };
        Ok(Envelope {
            dtype: self.dtype().to_string(),
            data,
        })
    }

    pub fn dtype(&self) -> &'static str {
        use crate::registry::dtype;
        match self {
            Self::Model(_) => dtype::MODEL,
            Self::Element(_) => dtype::ELEMENT,
            Self::Path(_) => dtype::PATH,
            Self::Node(_) => dtype::NODE,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_envelope()?)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_envelope()?)?)
    }

    pub fn transform(&mut self, transformation: &Transformation) {
        match self {
            Self::Model(m) => m.transform(transformation),
            Self::Element(e) => e.transform(transformation),
            Self::Path(p) => p.transform(transformation),
            Self::Node(n) => n.transform(transformation),
        }
    }
}

impl From<InformationModel> for Document {
    fn from(model: InformationModel) -> Self {
        Self::Model(model)
    }
}

impl From<Element> for Document {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Path> for Document {
    fn from(path: Path) -> Self {
        Self::Path(path)
    }
}

impl From<Node> for Document {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use nalgebra::Point3;

    fn sample_path() -> Path {
        Path::from_nodes([
            Node::new(Frame::world_xy()),
            Node::new(Frame::from_point(Point3::new(0.0, 1.0, 0.0))),
        ])
        .unwrap()
    }

    #[test]
    fn test_roundtrip_each_kind() {
        let mut element = Element::new();
        element.push(sample_path()).unwrap();
        let mut model = InformationModel::new();
        model.add_element(element.clone()).unwrap();

        let docs = [
            Document::from(model),
            Document::from(element),
            Document::from(sample_path()),
            Document::from(Node::new(Frame::world_xy())),
        ];
        for doc in docs {
            let json = doc.to_json_pretty().unwrap();
            let parsed = Document::from_json(&json).unwrap();
            assert_eq!(parsed, doc, "{} did not round-trip", doc.kind());
        }
    }

    #[test]
    fn test_bare_model_data() {
        let mut model = InformationModel::new();
        model.add_element(Element::new()).unwrap();
        let json = serde_json::to_string(&model.data().unwrap()).unwrap();
        match Document::from_json(&json).unwrap() {
            Document::Model(m) => assert_eq!(m.number_of_elements(), 1),
            other => panic!("Expected Model, got {}", other.kind()),
        }
    }

    #[test]
    fn test_non_document_dtype() {
        let json = r#"{"dtype": "amim/Robot", "data": {"name": "r1"}}"#;
        assert!(matches!(
            Document::from_json(json),
            Err(Error::UnexpectedDtype { .. })
        ));
    }

    #[test]
    fn test_unknown_dtype() {
        let json = r#"{"dtype": "compas.datastructures/Network", "data": {}}"#;
        assert!(matches!(
            Document::from_json(json),
            Err(Error::UnknownDtype(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Document::from_json("{nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_transform() {
        let mut doc = Document::from(sample_path());
        doc.transform(&Transformation::translation(1.0, 0.0, 0.0));
        match doc {
            Document::Path(p) => assert_eq!(p.first_node().unwrap().frame.point().x, 1.0),
            other => panic!("Expected Path, got {}", other.kind()),
        }
    }
}
