//! Traversal and query operations over sequencing edges.

use std::collections::HashSet;

use crate::element::Element;
use crate::graph::ExtendedGraph;
use crate::model::InformationModel;
use crate::state::FabricationState;

/// Walk the predecessor links from `key`, returning every ancestor key (inclusive).
///
/// # Examples
///
/// ```
/// use amim::v1::{Frame, Node, Path, query};
///
/// let path = Path::from_nodes((0..3).map(|_| Node::new(Frame::world_xy()))).unwrap();
/// let anc = query::ancestors(path.graph(), "node_2");
/// assert_eq!(anc.len(), 3);
/// assert!(anc.contains("node_0"));
/// ```
pub fn ancestors<P, E>(graph: &ExtendedGraph<P, E>, key: &str) -> HashSet<String> {
    walk(key, |k| graph.predecessors(k).map(str::to_string).collect())
}

/// Walk the successor links from `key`, returning every descendant key (inclusive).
pub fn descendants<P, E>(graph: &ExtendedGraph<P, E>, key: &str) -> HashSet<String> {
    walk(key, |k| graph.successors(k).map(str::to_string).collect())
}

fn walk<F>(start: &str, next: F) -> HashSet<String>
where
    F: Fn(&str) -> Vec<String>,
{
    let mut result = HashSet::new();
    let mut stack = vec![start.to_string()];

    while let Some(key) = stack.pop() {
        if !result.contains(&key) {
            stack.extend(next(&key));
            result.insert(key);
        }
    }

    result
}

/// Children without any incoming link, in insertion order.
pub fn roots<P, E>(graph: &ExtendedGraph<P, E>) -> Vec<&str> {
    graph
        .keys()
        .filter(|k| graph.predecessors(k).next().is_none())
        .collect()
}

/// Follow first successors from `start` until the chain ends or loops.
///
/// # Examples
///
/// ```
/// use amim::v1::{Frame, Node, Path, query};
///
/// let path = Path::from_nodes((0..3).map(|_| Node::new(Frame::world_xy()))).unwrap();
/// assert_eq!(
///     query::sequence(path.graph(), "node_0"),
///     vec!["node_0", "node_1", "node_2"]
/// );
/// ```
pub fn sequence<'a, P, E>(graph: &'a ExtendedGraph<P, E>, start: &str) -> Vec<&'a str> {
    let Some(first) = graph.keys().find(|k| *k == start) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut current = Some(first);
    while let Some(key) = current {
        if !seen.insert(key) {
            break;
        }
        order.push(key);
        current = graph.successors(key).next();
    }
    order
}

/// Children that do not lead up to `head`: abandoned branches.
pub fn dead_ends<'a, P, E>(graph: &'a ExtendedGraph<P, E>, head: &str) -> Vec<&'a str> {
    let active = ancestors(graph, head);
    graph.keys().filter(|k| !active.contains(*k)).collect()
}

/// Elements of `model` whose fabrication state equals `state`.
pub fn elements_in_state(
    model: &InformationModel,
    state: FabricationState,
) -> Vec<(&str, &Element)> {
    model
        .elements()
        .filter(|(_, e)| e.state == state)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::graph::Parent;
    use crate::node::Node;
    use crate::path::Path;

    fn branched() -> Path {
        // node_0 -> node_1 -> node_2
        //       \-> node_3
        let mut path = Path::from_nodes((0..3).map(|_| Node::new(Frame::world_xy()))).unwrap();
        path.add_node(Node::new(Frame::world_xy()), None, Parent::from("node_0"))
            .unwrap();
        path
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let path = branched();
        let anc = ancestors(path.graph(), "node_2");
        assert_eq!(anc.len(), 3);
        assert!(!anc.contains("node_3"));

        let desc = descendants(path.graph(), "node_0");
        assert_eq!(desc.len(), 4);
        assert_eq!(descendants(path.graph(), "node_3").len(), 1);
    }

    #[test]
    fn test_roots() {
        let path = branched();
        assert_eq!(roots(path.graph()), vec!["node_0"]);
    }

    #[test]
    fn test_sequence() {
        let path = branched();
        assert_eq!(
            sequence(path.graph(), "node_0"),
            vec!["node_0", "node_1", "node_2"]
        );
        assert!(sequence(path.graph(), "missing").is_empty());
    }

    #[test]
    fn test_sequence_stops_on_cycle() {
        let mut path = Path::from_nodes((0..2).map(|_| Node::new(Frame::world_xy()))).unwrap();
        path.add_node(Node::new(Frame::world_xy()), Some("node_0".into()), Parent::from("node_1"))
            .unwrap();
        assert_eq!(sequence(path.graph(), "node_0"), vec!["node_0", "node_1"]);
    }

    #[test]
    fn test_dead_ends() {
        let path = branched();
        assert_eq!(dead_ends(path.graph(), "node_2"), vec!["node_3"]);
        assert!(dead_ends(path.graph(), "node_3").contains(&"node_1"));
    }

    #[test]
    fn test_elements_in_state() {
        let mut model = InformationModel::new();
        model.add_element(Element::new()).unwrap();
        model.add_element(Element::new()).unwrap();
        model
            .element_mut("element_1")
            .unwrap()
            .state
            .mark_placed()
            .unwrap();

        let placed = elements_in_state(&model, FabricationState::Placed);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].0, "element_1");
        assert_eq!(elements_in_state(&model, FabricationState::Unplanned).len(), 1);
    }
}
