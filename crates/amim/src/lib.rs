#![doc = include_str!("../README.md")]

mod document;
mod edge;
mod element;
mod error;
mod frame;
mod graph;
mod layer;
mod model;
mod node;
mod path;
mod process;
mod query;
mod registry;
mod robot;
mod state;
#[cfg(test)]
mod test_support;

pub mod v1 {
    //! Versioned public API for AMIM types and queries.
    //!
    //! Everything you need is re-exported from this module. Types are organized
    //! into four groups:
    //!
    //! # Entities
    //!
    //! The hierarchy you build, transform and serialize:
    //!
    //! - [`InformationModel`] — top-level assembly of elements, layers and robots
    //! - [`Element`] — a fabrication unit made of paths
    //! - [`Path`] — one continuous deposition pass
    //! - [`Node`] — a pose plus process parameters
    //! - [`Edge`] — displacement between two consecutive nodes
    //! - [`Layer`], [`Robot`] — layer-based variant and robot placement
    //!
    //! # Geometry and process
    //!
    //! - [`Frame`], [`Transformation`] — poses and rigid motions
    //! - [`ExtrusionModel`] — relation between path profile and process rates
    //! - [`FabricationState`] — unplanned, planned, placed
    //!
    //! # Substrate
    //!
    //! - [`ExtendedGraph`] — keyed, typed children with parent linking
    //! - [`Parent`] — where a new child is linked from
    //!
    //! # Serialization
    //!
    //! - [`Document`] — any top-level entity in its dtype envelope
    //! - [`Registry`], [`Envelope`], [`Entity`] — dtype resolution
    //!
    //! # Example — build a model with one element
    //!
    //! ```
    //! use amim::v1::*;
    //! use nalgebra::Point3;
    //!
    //! let nodes = (0..4).map(|i| {
    //!     Node::new(Frame::from_point(Point3::new(i as f64 * 0.01, 0.0, 0.0)))
    //!         .with_path_profile(0.010, 0.003)
    //!         .with_extrusion_rate(0.4)
    //! });
    //! let path = Path::from_nodes(nodes).unwrap();
    //!
    //! let mut element = Element::new();
    //! element.push(path).unwrap();
    //!
    //! let mut model = InformationModel::new();
    //! model.add_element(element).unwrap();
    //!
    //! let json = Document::from(model).to_json_pretty().unwrap();
    //! assert!(json.contains("amim/InformationModel"));
    //! ```

    /// Traversal over sequencing edges.
    ///
    /// # Example — find the abandoned branch of a path
    ///
    /// ```
    /// use amim::v1::{Frame, Node, Parent, Path, query};
    ///
    /// let mut path = Path::from_nodes((0..3).map(|_| Node::new(Frame::world_xy()))).unwrap();
    /// path.add_node(Node::new(Frame::world_xy()), None, Parent::from("node_0")).unwrap();
    ///
    /// let dead = query::dead_ends(path.graph(), "node_2");
    /// assert_eq!(dead, vec!["node_3"]);
    ///
    /// let ancestors = query::ancestors(path.graph(), "node_2");
    /// assert!(ancestors.contains("node_0"));
    /// assert!(!ancestors.contains("node_3"));
    /// ```
    pub mod query {
        pub use crate::query::{
            ancestors, dead_ends, descendants, elements_in_state, roots, sequence,
        };
    }
    pub use crate::document::Document;
    pub use crate::edge::Edge;
    pub use crate::element::{ConnectionSlot, Element};
    pub use crate::error::{Error, Result};
    pub use crate::frame::{Frame, Transformation};
    pub use crate::graph::{
        Child, ChildData, ExtendedGraph, GraphData, GraphEdge, Parent, Payload, get_id,
    };
    pub use crate::layer::Layer;
    pub use crate::model::{InformationModel, ModelChild};
    pub use crate::node::{Node, ProcessParameter};
    pub use crate::path::{Direction, Path};
    pub use crate::process::{ExtrusionModel, NOZZLE_SIZE, ProfileWarning};
    pub use crate::registry::{Decoder, Entity, Envelope, Registry, dtype};
    pub use crate::robot::Robot;
    pub use crate::state::FabricationState;
}
