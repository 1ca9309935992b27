use anyhow::Result;
use std::path::PathBuf;

use amim::v1::Document;

use crate::input::read_doc;

pub fn run(input: PathBuf) -> Result<()> {
    let doc = read_doc(Some(input.as_path()))?;
    println!("Valid: {}", summary(&doc));
    Ok(())
}

fn summary(doc: &Document) -> String {
    match doc {
        Document::Model(m) => format!(
            "InformationModel '{}' ({} elements, {} layers, {} robots)",
            m.name(),
            m.number_of_elements(),
            m.number_of_layers(),
            m.number_of_robots()
        ),
        Document::Element(e) => format!(
            "Element '{}' ({} paths, {} nodes)",
            e.name(),
            e.number_of_paths(),
            e.number_of_nodes()
        ),
        Document::Path(p) => format!(
            "Path '{}' ({} nodes, {} edges)",
            p.name(),
            p.number_of_nodes(),
            p.number_of_edges()
        ),
        Document::Node(n) => format!("Node '{}'", n.name),
    }
}
