//! Directed graph of typed, named children.
//!
//! [`ExtendedGraph`] is the substrate shared by [`Path`](crate::path::Path),
//! [`Element`](crate::element::Element) and
//! [`InformationModel`](crate::model::InformationModel). It owns its children
//! in insertion order, mints `<type>_<n>` keys, remembers the last child added
//! per type and links every new child from its parent.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::Transformation;
use crate::registry::{Entity, Envelope, Registry};

/// A value that can live as a child of an [`ExtendedGraph`].
pub trait Payload: Clone {
    /// Collection tag, also used as the key prefix (`"node"`, `"path"`, ...).
    fn node_type(&self) -> &'static str;

    /// Type tag written into the child's envelope.
    fn dtype(&self) -> &'static str;

    fn to_data(&self) -> Result<Value>;

    /// Unwrap a decoded entity, failing if it has the wrong type.
    fn from_entity(entity: Entity) -> Result<Self>;

    fn transform(&mut self, transformation: &Transformation);

    fn to_envelope(&self) -> Result<Envelope> {
        Ok(Envelope {
            dtype: self.dtype().to_string(),
            data: self.to_data()?,
        })
    }
}

/// Where a new child is linked from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Parent {
    /// The last child added with the same node type.
    #[default]
    Last,
    /// An explicit existing key.
    Key(String),
    /// No link.
    Unlinked,
}

impl From<&str> for Parent {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

/// A child record: key, collection tag, payload and free-form attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Child<P> {
    pub key: String,
    pub node_type: String,
    pub payload: P,
    pub attributes: BTreeMap<String, Value>,
}

/// A directed edge `u -> v` carrying `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge<E> {
    pub u: String,
    pub v: String,
    #[serde(default)]
    pub data: E,
}

/// Serialized form of an [`ExtendedGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData<E> {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_child_attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub nodes: Vec<ChildData>,
    #[serde(default)]
    pub edges: Vec<GraphEdge<E>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub last: BTreeMap<String, String>,
}

/// Serialized form of a [`Child`]; the payload is wrapped in its envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildData {
    pub key: String,
    pub node_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    pub payload: Envelope,
}

/// Directed graph of typed children `P` joined by edges carrying `E`.
///
/// # Example
///
/// ```
/// use amim::v1::{ExtendedGraph, Frame, Node, Parent};
///
/// let mut graph: ExtendedGraph<Node> = ExtendedGraph::new("demo");
/// let a = graph.add_named_node(Node::new(Frame::world_xy()), None, Parent::Last).unwrap();
/// let b = graph.add_named_node(Node::new(Frame::world_xy()), None, Parent::Last).unwrap();
///
/// assert_eq!(a, "node_0");
/// assert_eq!(b, "node_1");
/// assert!(graph.has_edge("node_0", "node_1"));
/// assert_eq!(graph.last_key("node"), Some("node_1"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedGraph<P, E = ()> {
    pub name: String,
    /// Whole-graph user metadata.
    pub attributes: BTreeMap<String, Value>,
    /// Template copied into the attributes of every newly added child.
    pub default_child_attributes: BTreeMap<String, Value>,
    children: Vec<Child<P>>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge<E>>,
    last: BTreeMap<String, String>,
}

impl<P, E> Default for ExtendedGraph<P, E> {
    fn default() -> Self {
        Self::new("ExtendedGraph")
    }
}

/// Numeric suffix of a `<type>_<n>` key.
pub fn get_id(key: &str) -> Result<u64> {
    key.rsplit_once('_')
        .and_then(|(_, id)| id.parse().ok())
        .ok_or_else(|| Error::MalformedKey(key.to_string()))
}

impl<P, E> ExtendedGraph<P, E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            default_child_attributes: BTreeMap::new(),
            children: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            last: BTreeMap::new(),
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    pub fn has_node(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Payload stored under `key`, or `None`.
    pub fn get_node(&self, key: &str) -> Option<&P> {
        self.child(key).map(|c| &c.payload)
    }

    pub fn get_node_mut(&mut self, key: &str) -> Option<&mut P> {
        let idx = *self.index.get(key)?;
        Some(&mut self.children[idx].payload)
    }

    pub fn child(&self, key: &str) -> Option<&Child<P>> {
        self.index.get(key).map(|&idx| &self.children[idx])
    }

    pub fn children(&self) -> &[Child<P>] {
        &self.children
    }

    pub fn node_attribute(&self, key: &str, name: &str) -> Option<&Value> {
        self.child(key)?.attributes.get(name)
    }

    pub fn set_node_attribute(
        &mut self,
        key: &str,
        name: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let idx = *self
            .index
            .get(key)
            .ok_or_else(|| Error::NodeNotFound(key.to_string()))?;
        self.children[idx].attributes.insert(name.into(), value);
        Ok(())
    }

    /// All children in insertion order as `(key, payload)`.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &P)> {
        self.children.iter().map(|c| (c.key.as_str(), &c.payload))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.key.as_str())
    }

    /// Children whose attributes match every `(name, value)` pair exactly.
    /// The name `"node_type"` matches the child's collection tag.
    pub fn nodes_where<'a>(
        &'a self,
        predicate: &'a [(&'a str, Value)],
    ) -> impl Iterator<Item = (&'a str, &'a P)> {
        self.children
            .iter()
            .filter(move |c| {
                predicate.iter().all(|(name, value)| match *name {
                    "node_type" => value.as_str() == Some(c.node_type.as_str()),
                    _ => c.attributes.get(*name) == Some(value),
                })
            })
            .map(|c| (c.key.as_str(), &c.payload))
    }

    /// Keys of the children matching `predicate` (see [`nodes_where`](Self::nodes_where)).
    pub fn keys_where<'a>(
        &'a self,
        predicate: &'a [(&'a str, Value)],
    ) -> impl Iterator<Item = &'a str> {
        self.nodes_where(predicate).map(|(key, _)| key)
    }

    /// Children of one collection, in insertion order.
    pub fn objects<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = (&'a str, &'a P)> {
        self.children
            .iter()
            .filter(move |c| c.node_type == node_type)
            .map(|c| (c.key.as_str(), &c.payload))
    }

    pub fn objects_mut<'a>(&'a mut self, node_type: &'a str) -> impl Iterator<Item = &'a mut P> {
        self.children
            .iter_mut()
            .filter(move |c| c.node_type == node_type)
            .map(|c| &mut c.payload)
    }

    pub fn count(&self, node_type: &str) -> usize {
        self.children
            .iter()
            .filter(|c| c.node_type == node_type)
            .count()
    }

    pub fn number_of_nodes(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    // ── Keys ───────────────────────────────────────────────────────────

    /// Key of the most recently added child of `node_type`.
    pub fn last_key(&self, node_type: &str) -> Option<&str> {
        self.last.get(node_type).map(String::as_str)
    }

    pub fn first_key(&self) -> Option<&str> {
        self.children.first().map(|c| c.key.as_str())
    }

    /// Key of the last child in insertion order, regardless of type.
    pub fn last_inserted_key(&self) -> Option<&str> {
        self.children.last().map(|c| c.key.as_str())
    }

    /// The `node_type` key whose numeric suffix is `id`.
    pub fn get_key(&self, node_type: &str, id: u64) -> Result<&str> {
        for child in self.children.iter().filter(|c| c.node_type == node_type) {
            if get_id(&child.key)? == id {
                return Ok(&child.key);
            }
        }
        Err(Error::IdNotFound {
            node_type: node_type.to_string(),
            id,
        })
    }

    /// The key the next unnamed child of `node_type` would receive.
    pub fn next_key(&self, node_type: &str) -> Result<String> {
        let mut max_id: Option<u64> = None;
        for child in self.children.iter().filter(|c| c.node_type == node_type) {
            let id = get_id(&child.key)?;
            max_id = Some(max_id.map_or(id, |m| m.max(id)));
        }
        let next = max_id.map_or(0, |m| m + 1);
        Ok(format!("{node_type}_{next}"))
    }

    // ── Edges ──────────────────────────────────────────────────────────

    pub fn edges(&self) -> &[GraphEdge<E>] {
        &self.edges
    }

    pub fn edge(&self, u: &str, v: &str) -> Option<&E> {
        self.edges
            .iter()
            .find(|e| e.u == u && e.v == v)
            .map(|e| &e.data)
    }

    pub fn has_edge(&self, u: &str, v: &str) -> bool {
        self.edge(u, v).is_some()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// Add or replace the edge `u -> v`. Both endpoints must exist.
    pub fn add_edge(&mut self, u: &str, v: &str, data: E) -> Result<()> {
        for key in [u, v] {
            if !self.has_node(key) {
                return Err(Error::NodeNotFound(key.to_string()));
            }
        }
        self.upsert_edge(u, v, data);
        Ok(())
    }

    pub fn successors<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.u == key)
            .map(|e| e.v.as_str())
    }

    pub fn predecessors<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.v == key)
            .map(|e| e.u.as_str())
    }

    /// Recompute every edge payload from its endpoint payloads.
    pub fn update_edges<F>(&mut self, mut f: F)
    where
        F: FnMut(&P, &P, &mut E),
    {
        let Self {
            children,
            index,
            edges,
            ..
        } = self;
        for edge in edges.iter_mut() {
            if let (Some(&u), Some(&v)) = (index.get(&edge.u), index.get(&edge.v)) {
                f(&children[u].payload, &children[v].payload, &mut edge.data);
            }
        }
    }

    /// Add or replace `u -> v` without checking the endpoints.
    pub(crate) fn upsert_edge(&mut self, u: &str, v: &str, data: E) {
        match self.edges.iter_mut().find(|e| e.u == u && e.v == v) {
            Some(edge) => edge.data = data,
            None => self.edges.push(GraphEdge {
                u: u.to_string(),
                v: v.to_string(),
                data,
            }),
        }
    }

    // ── Removal ────────────────────────────────────────────────────────

    /// Remove a child and every edge touching it.
    ///
    /// If it was the last child of its type, the most recent remaining child
    /// of that type takes its place.
    pub fn remove_node(&mut self, key: &str) -> Option<P> {
        let idx = self.index.remove(key)?;
        let child = self.children.remove(idx);
        for (i, c) in self.children.iter().enumerate().skip(idx) {
            self.index.insert(c.key.clone(), i);
        }
        let before = self.edges.len();
        self.edges.retain(|e| e.u != key && e.v != key);
        debug!(
            key,
            swept = before - self.edges.len(),
            "removed node and its edges"
        );
        self.refresh_last(&child.node_type);
        Some(child.payload)
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.index.clear();
        self.edges.clear();
        self.last.clear();
    }

    fn refresh_last(&mut self, node_type: &str) {
        match self
            .children
            .iter()
            .rev()
            .find(|c| c.node_type == node_type)
        {
            Some(c) => {
                self.last.insert(node_type.to_string(), c.key.clone());
            }
            None => {
                self.last.remove(node_type);
            }
        }
    }
}

impl<P: Payload, E> ExtendedGraph<P, E> {
    /// Register `obj` and link it from its parent with an edge whose payload
    /// is computed by `link(parent, child)`.
    ///
    /// Without `key` a new `<type>_<n>` key is minted. An existing key is
    /// overwritten in place with a warning. No edge is created when there is
    /// no parent or when the parent is the child itself.
    pub fn add_named_node_with<F>(
        &mut self,
        obj: P,
        key: Option<String>,
        parent: Parent,
        link: F,
    ) -> Result<String>
    where
        F: FnOnce(&P, &P) -> E,
    {
        let node_type = obj.node_type();
        let parent_key = match parent {
            Parent::Last => self.last_key(node_type).map(str::to_string),
            Parent::Key(k) if self.has_node(&k) => Some(k),
            Parent::Key(k) => return Err(Error::NodeNotFound(k)),
            Parent::Unlinked => None,
        };

        let key = match key {
            Some(key) => key,
            None => self.next_key(node_type)?,
        };

        match self.index.get(&key).copied() {
            Some(idx) => {
                warn!(
                    graph = %self.name,
                    key = %key,
                    "key already in graph, value is overwritten"
                );
                let previous_type =
                    std::mem::replace(&mut self.children[idx].node_type, node_type.to_string());
                self.children[idx].payload = obj;
                if previous_type != node_type {
                    self.refresh_last(&previous_type);
                }
            }
            None => {
                self.index.insert(key.clone(), self.children.len());
                self.children.push(Child {
                    key: key.clone(),
                    node_type: node_type.to_string(),
                    payload: obj,
                    attributes: self.default_child_attributes.clone(),
                });
            }
        }
        self.last.insert(node_type.to_string(), key.clone());

        if let Some(parent_key) = parent_key
            && parent_key != key
        {
            let parent_obj = &self.children[self.index[&parent_key]].payload;
            let data = link(parent_obj, &self.children[self.index[&key]].payload);
            debug!(graph = %self.name, from = %parent_key, to = %key, "linked child");
            self.upsert_edge(&parent_key, &key, data);
        }

        Ok(key)
    }

    /// Apply `transformation` to every payload.
    pub fn transform(&mut self, transformation: &Transformation) {
        for child in &mut self.children {
            child.payload.transform(transformation);
        }
    }
}

impl<P: Payload, E: Default> ExtendedGraph<P, E> {
    /// Register `obj`, linking it from `parent` with a default edge payload.
    pub fn add_named_node(
        &mut self,
        obj: P,
        key: Option<String>,
        parent: Parent,
    ) -> Result<String> {
        self.add_named_node_with(obj, key, parent, |_, _| E::default())
    }
}

impl<P: Payload, E: Clone> ExtendedGraph<P, E> {
    pub fn to_graph_data(&self) -> Result<GraphData<E>> {
        let nodes = self
            .children
            .iter()
            .map(|c| {
                Ok(ChildData {
                    key: c.key.clone(),
                    node_type: c.node_type.clone(),
                    attributes: c.attributes.clone(),
                    payload: c.payload.to_envelope()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GraphData {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            default_child_attributes: self.default_child_attributes.clone(),
            nodes,
            edges: self.edges.clone(),
            last: self.last.clone(),
        })
    }

    /// Rebuild a graph, decoding every child envelope through `registry`.
    pub fn from_graph_data(data: GraphData<E>, registry: &Registry) -> Result<Self> {
        let mut graph = Self::new(data.name);
        graph.attributes = data.attributes;
        graph.default_child_attributes = data.default_child_attributes;

        for child in data.nodes {
            if graph.has_node(&child.key) {
                return Err(Error::DuplicateKey(child.key));
            }
            let payload = P::from_entity(registry.decode(&child.payload)?)?;
            graph.index.insert(child.key.clone(), graph.children.len());
            graph.children.push(Child {
                key: child.key,
                node_type: child.node_type,
                payload,
                attributes: child.attributes,
            });
        }

        for edge in data.edges {
            graph.add_edge(&edge.u, &edge.v, edge.data)?;
        }

        for (node_type, key) in data.last {
            let child = graph
                .child(&key)
                .ok_or_else(|| Error::NodeNotFound(key.clone()))?;
            if child.node_type != node_type {
                return Err(Error::NodeTypeMismatch {
                    key,
                    expected: node_type,
                    found: child.node_type.clone(),
                });
            }
            graph.last.insert(node_type, key);
        }

        Ok(graph)
    }
}
