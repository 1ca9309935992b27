use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use amim::v1::{Document, Element, Path};

use crate::input::read_doc;

#[derive(Debug, Default, PartialEq, Serialize)]
struct Info {
    kind: &'static str,
    name: String,
    elements: usize,
    layers: usize,
    robots: usize,
    connections: usize,
    paths: usize,
    nodes: usize,
    edges: usize,
    total_length: f64,
}

pub fn run(input: PathBuf, json: bool, pretty: bool) -> Result<()> {
    let doc = read_doc(Some(input.as_path()))?;
    let info = collect(&doc);

    if json {
        let out = if pretty {
            serde_json::to_string_pretty(&info)?
        } else {
            serde_json::to_string(&info)?
        };
        println!("{}", out);
    } else {
        print_text(&info);
    }
    Ok(())
}

fn collect(doc: &Document) -> Info {
    let mut info = Info {
        kind: doc.kind(),
        ..Default::default()
    };

    match doc {
        Document::Model(m) => {
            info.name = m.name().to_string();
            info.elements = m.number_of_elements();
            info.layers = m.number_of_layers();
            info.robots = m.number_of_robots();
            info.connections = m.number_of_connections();
            for (_, element) in m.elements() {
                add_element(&mut info, element);
            }
            info.nodes += m.layers().map(|(_, l)| l.len()).sum::<usize>();
        }
        Document::Element(e) => {
            info.name = e.name().to_string();
            info.elements = 1;
            add_element(&mut info, e);
        }
        Document::Path(p) => {
            info.name = p.name().to_string();
            add_path(&mut info, p);
        }
        Document::Node(n) => {
            info.name = n.name.clone();
            info.nodes = 1;
        }
    }
    info
}

fn add_element(info: &mut Info, element: &Element) {
    for (_, path) in element.paths() {
        add_path(info, path);
    }
}

fn add_path(info: &mut Info, path: &Path) {
    info.paths += 1;
    info.nodes += path.number_of_nodes();
    info.edges += path.number_of_edges();
    info.total_length += path.total_length();
}

fn print_text(info: &Info) {
    println!("{} '{}'", info.kind, info.name);
    if info.kind == "InformationModel" {
        println!("  elements:     {}", info.elements);
        println!("  layers:       {}", info.layers);
        println!("  robots:       {}", info.robots);
        println!("  connections:  {}", info.connections);
    }
    println!("  paths:        {}", info.paths);
    println!("  nodes:        {}", info.nodes);
    println!("  edges:        {}", info.edges);
    println!("  total length: {:.4}", info.total_length);
}
