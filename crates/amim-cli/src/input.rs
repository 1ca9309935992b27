use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use amim::v1::Document;

/// Read a document from `path`, or from stdin when `path` is `None` or `-`.
pub fn read_doc(path: Option<&Path>) -> Result<Document> {
    match path {
        Some(p) if p != Path::new("-") => {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("Failed to read {:?}", p))?;
            Document::from_json(&content).with_context(|| format!("Failed to parse {:?}", p))
        }
        _ => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            Document::from_json(&content).context("Failed to parse stdin")
        }
    }
}

/// Write `content` to `path`, or print it when no path is given.
pub fn write_out(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, content).with_context(|| format!("Failed to write {:?}", p)),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

pub fn to_json(doc: &Document, pretty: bool) -> Result<String> {
    let json = if pretty {
        doc.to_json_pretty()?
    } else {
        doc.to_json()?
    };
    Ok(json)
}
