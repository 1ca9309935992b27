//! Generate Graphviz DOT visualizations from AMIM documents.
//!
//! Renders [`Document`]s (models, elements, paths and single nodes) as
//! Graphviz DOT digraphs. Nodes become DOT nodes, sequencing edges become DOT
//! edges, and every path is drawn as its own cluster. Fill colors follow the
//! fabrication state (gray for unplanned, yellow for planned, green for
//! placed).
//!
//! # Example
//!
//! ```
//! use amim::v1::{Document, Frame, Node, Path};
//! use amim_dot::{render, RenderOptions};
//! use nalgebra::Point3;
//!
//! let path = Path::from_nodes([
//!     Node::new(Frame::world_xy()),
//!     Node::new(Frame::from_point(Point3::new(1.0, 0.0, 0.0))),
//! ])
//! .unwrap();
//!
//! let dot = render(&Document::Path(path), &RenderOptions::default());
//! assert!(dot.contains("digraph amim"));
//! assert!(dot.contains("\"node_0\" -> \"node_1\""));
//! ```
//!
//! Pipe the output through Graphviz to produce images:
//!
//! ```bash
//! amim render dot -i wall.json | dot -Tsvg -o wall.svg
//! ```

use amim::v1::{
    Document, Element, ExtrusionModel, FabricationState, InformationModel, Node, Path,
    ProcessParameter,
};

/// Options controlling what information is rendered in the DOT output.
pub struct RenderOptions {
    /// Include each node's frame origin.
    pub show_coordinates: bool,
    /// Label edges with their length.
    pub show_lengths: bool,
    /// Include path width, height, extrusion rate and robot velocity.
    pub show_process: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_coordinates: false,
            show_lengths: false,
            show_process: false,
        }
    }
}

/// Render any AMIM [`Document`] variant to a Graphviz DOT string.
pub fn render(doc: &Document, options: &RenderOptions) -> String {
    match doc {
        Document::Model(m) => render_model(m, options),
        Document::Element(e) => render_element(e, options),
        Document::Path(p) => render_path(p, options),
        Document::Node(n) => render_node(n, options),
    }
}

/// Render a single [`Node`] as a DOT digraph.
pub fn render_node(node: &Node, options: &RenderOptions) -> String {
    let mut dot = header(false);
    let label = format_node_label_html(&node.name, node, options);
    dot.push_str(&format!(
        "  \"{}\" [label={}, fillcolor=\"{}\"];\n",
        escape_dot(&node.name),
        label,
        state_color(node.state)
    ));
    dot.push_str("}\n");
    dot
}

/// Render a [`Path`] as a DOT digraph.
pub fn render_path(path: &Path, options: &RenderOptions) -> String {
    let mut dot = header(false);
    title(&mut dot, path.name(), 16);
    write_path_nodes(&mut dot, path, "", "  ", options);
    dot.push('\n');
    write_path_edges(&mut dot, path, "", "  ", options);
    dot.push_str("}\n");
    dot
}

/// Render an [`Element`] as a DOT digraph with one cluster per path.
pub fn render_element(element: &Element, options: &RenderOptions) -> String {
    let mut dot = header(true);
    title(&mut dot, element.name(), 16);
    write_element_body(&mut dot, element, "  ", options);
    dot.push_str("}\n");
    dot
}

/// Render an [`InformationModel`] as a DOT digraph.
///
/// Elements become clusters holding one summary node per path; layers and
/// robots are single nodes; model connections join them.
pub fn render_model(model: &InformationModel, options: &RenderOptions) -> String {
    let mut dot = header(true);
    title(&mut dot, model.name(), 18);

    for (i, (key, element)) in model.elements().enumerate() {
        dot.push_str(&format!("  subgraph cluster_{} {{\n", i));
        dot.push_str(&format!(
            "    label=\"{} ({})\";\n",
            escape_dot(key),
            escape_dot(element.name())
        ));
        dot.push_str("    fontname=\"Helvetica-Bold\";\n");
        dot.push_str("    style=filled;\n");
        dot.push_str(&format!("    fillcolor=\"{}\";\n", cluster_color(i)));
        dot.push_str("    margin=12;\n\n");

        dot.push_str(&format!(
            "    \"{}\" [label=<<b>{}</b><br/><font point-size=\"9\">{} paths, {:.3} m</font>>, shape=folder, fillcolor=\"{}\"];\n",
            escape_dot(key),
            escape_html(key),
            element.number_of_paths(),
            element.total_length(),
            state_color(element.state)
        ));

        for (path_key, path) in element.paths() {
            let id = format!("{key}/{path_key}");
            dot.push_str(&format!(
                "    \"{}\" [label={}];\n",
                escape_dot(&id),
                format_path_summary_html(path_key, path, options)
            ));
        }
        for edge in element.graph().edges() {
            dot.push_str(&format!(
                "    \"{}/{}\" -> \"{}/{}\";\n",
                escape_dot(key),
                escape_dot(&edge.u),
                escape_dot(key),
                escape_dot(&edge.v)
            ));
        }
        dot.push_str("  }\n\n");
    }

    for (key, layer) in model.layers() {
        dot.push_str(&format!(
            "  \"{}\" [label=<<b>{}</b><br/><font point-size=\"9\">{} nodes</font>>, shape=box3d, fillcolor=\"{}\"];\n",
            escape_dot(key),
            escape_html(key),
            layer.len(),
            state_color(layer.state)
        ));
    }

    for (key, robot) in model.robots() {
        dot.push_str(&format!(
            "  \"{}\" [label=<<b>{}</b><br/><font point-size=\"9\">{}</font>>, shape=ellipse, fillcolor=\"#e0e0e0\"];\n",
            escape_dot(key),
            escape_html(key),
            escape_html(&robot.name)
        ));
    }

    dot.push_str("\n  // Connections\n");
    for (u, v) in model.connections() {
        dot.push_str(&format!(
            "  \"{}\" -> \"{}\" [color=\"#333333\", penwidth=2];\n",
            escape_dot(u),
            escape_dot(v)
        ));
    }

    dot.push_str("}\n");
    dot
}

fn header(compound: bool) -> String {
    let mut dot = String::new();
    dot.push_str("digraph amim {\n");
    dot.push_str("  rankdir=LR;\n");
    if compound {
        dot.push_str("  compound=true;\n");
        dot.push_str("  newrank=true;\n");
    }
    dot.push_str(
        "  node [shape=box, style=\"rounded,filled\", fontname=\"Helvetica\", fillcolor=\"#f8f9fa\"];\n",
    );
    dot.push_str("  edge [color=\"#666666\"];\n\n");
    dot
}

fn title(dot: &mut String, name: &str, size: u32) {
    dot.push_str("  labelloc=\"t\";\n");
    dot.push_str(&format!("  label=\"{}\";\n", escape_dot(name)));
    dot.push_str(&format!("  fontsize={};\n", size));
    dot.push_str("  fontname=\"Helvetica-Bold\";\n\n");
}

fn write_element_body(dot: &mut String, element: &Element, indent: &str, options: &RenderOptions) {
    let inner = format!("{indent}  ");
    for (i, (key, path)) in element.paths().enumerate() {
        let scope = format!("{key}/");
        dot.push_str(&format!("{indent}subgraph cluster_{} {{\n", i));
        dot.push_str(&format!("{inner}label=\"{}\";\n", escape_dot(key)));
        dot.push_str(&format!("{inner}fontname=\"Helvetica-Bold\";\n"));
        dot.push_str(&format!("{inner}style=filled;\n"));
        dot.push_str(&format!("{inner}fillcolor=\"{}\";\n", cluster_color(i)));
        write_path_nodes(dot, path, &scope, &inner, options);
        write_path_edges(dot, path, &scope, &inner, options);
        dot.push_str(&format!("{indent}}}\n\n"));
    }

    // Path sequence: last node of one path to the first of the next.
    for edge in element.graph().edges() {
        let (Some(u), Some(v)) = (element.path(&edge.u), element.path(&edge.v)) else {
            continue;
        };
        if let (Some((u_last, _)), Some((v_first, _))) = (u.nodes().last(), v.nodes().next()) {
            dot.push_str(&format!(
                "{indent}\"{}/{}\" -> \"{}/{}\" [style=dashed, color=\"#999999\"];\n",
                escape_dot(&edge.u),
                escape_dot(u_last),
                escape_dot(&edge.v),
                escape_dot(v_first)
            ));
        }
    }
}

fn write_path_nodes(
    dot: &mut String,
    path: &Path,
    scope: &str,
    indent: &str,
    options: &RenderOptions,
) {
    for (key, node) in path.nodes() {
        let label = format_node_label_html(key, node, options);
        dot.push_str(&format!(
            "{indent}\"{}{}\" [label={}, fillcolor=\"{}\"];\n",
            escape_dot(scope),
            escape_dot(key),
            label,
            state_color(node.state)
        ));
    }
}

fn write_path_edges(
    dot: &mut String,
    path: &Path,
    scope: &str,
    indent: &str,
    options: &RenderOptions,
) {
    for (u, v, edge) in path.edges() {
        let attrs = if options.show_lengths {
            format!(" [label=\"{:.3}\", fontsize=9]", edge.length())
        } else {
            String::new()
        };
        dot.push_str(&format!(
            "{indent}\"{}{}\" -> \"{}{}\"{};\n",
            escape_dot(scope),
            escape_dot(u),
            escape_dot(scope),
            escape_dot(v),
            attrs
        ));
    }
}

fn format_node_label_html(key: &str, node: &Node, options: &RenderOptions) -> String {
    let mut rows = vec![format!("<b>{}</b>", escape_html(key))];

    if options.show_coordinates {
        let p = node.frame.point();
        rows.push(format!(
            "<font point-size=\"9\">({:.3}, {:.3}, {:.3})</font>",
            p.x, p.y, p.z
        ));
    }

    if options.show_process {
        for (abbrev, value) in process_values(node) {
            let text = match value {
                Some(v) => format!("{abbrev}={v:.4}"),
                None => format!("{abbrev}=?"),
            };
            rows.push(format!(
                "<font point-size=\"8\" color=\"#666666\">{}</font>",
                escape_html(&text)
            ));
        }
    }

    format!("<{}>", rows.join("<br/>"))
}

/// Label for a path collapsed into a single node.
fn format_path_summary_html(key: &str, path: &Path, options: &RenderOptions) -> String {
    let mut rows = vec![
        format!("<b>{}</b>", escape_html(key)),
        format!(
            "<font point-size=\"9\">{} nodes</font>",
            path.number_of_nodes()
        ),
    ];

    if options.show_lengths {
        rows.push(format!(
            "<font point-size=\"9\">{:.3} m</font>",
            path.total_length()
        ));
    }

    if options.show_coordinates
        && let (Some(first), Some(last)) = (path.first_node(), path.last_node())
    {
        let (a, b) = (first.frame.point(), last.frame.point());
        rows.push(format!(
            "<font point-size=\"9\">({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})</font>",
            a.x, a.y, a.z, b.x, b.y, b.z
        ));
    }

    // Process values of the first node stand for the whole path.
    if options.show_process
        && let Some(first) = path.first_node()
    {
        let text = process_values(first)
            .into_iter()
            .map(|(abbrev, value)| match value {
                Some(v) => format!("{abbrev}={v:.4}"),
                None => format!("{abbrev}=?"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        rows.push(format!(
            "<font point-size=\"8\" color=\"#666666\">{}</font>",
            escape_html(&text)
        ));
    }

    format!("<{}>", rows.join("<br/>"))
}

/// Stored process parameters, plus the missing one when it is derivable.
fn process_values(node: &Node) -> Vec<(&'static str, Option<f64>)> {
    let params = [
        ("w", ProcessParameter::PathWidth),
        ("h", ProcessParameter::PathHeight),
        ("E", ProcessParameter::ExtrusionRate),
        ("v", ProcessParameter::RobotVelocity),
    ];
    let stored = params
        .iter()
        .filter(|(_, p)| node.stored(*p).is_some())
        .count();
    let model = ExtrusionModel::default();

    params
        .iter()
        .map(|(abbrev, p)| {
            let value = match node.stored(*p) {
                Some(v) => Some(v),
                None if stored == 3 => node.resolve(*p, &model),
                None => None,
            };
            (*abbrev, value)
        })
        .collect()
}

/// Return a fill color for a fabrication state.
pub fn state_color(state: FabricationState) -> &'static str {
    match state {
        FabricationState::Unplanned => "#f8f9fa", // Light gray
        FabricationState::Planned => "#fff3cd",   // Light yellow
        FabricationState::Placed => "#d4edda",    // Light green
    }
}

fn cluster_color(i: usize) -> &'static str {
    const COLORS: [&str; 6] = [
        "#e3f2fd", "#e8f5e9", "#fff3e0", "#f3e5f5", "#e0f7fa", "#fce4ec",
    ];
    COLORS[i % COLORS.len()]
}

/// Escape a string for use in DOT label attributes (double-quoted context).
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Escape a string for use inside HTML-like DOT labels.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
