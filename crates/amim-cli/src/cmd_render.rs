use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::input::{read_doc, write_out};

#[derive(Subcommand, Debug)]
pub enum RenderFormat {
    /// Render as Graphviz DOT
    Dot {
        /// Input file (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include node coordinates
        #[arg(long)]
        show_coordinates: bool,

        /// Label edges with their length
        #[arg(long)]
        show_lengths: bool,

        /// Include process parameters
        #[arg(long)]
        show_process: bool,
    },
}

pub fn run(format: RenderFormat) -> Result<()> {
    match format {
        RenderFormat::Dot {
            input,
            output,
            show_coordinates,
            show_lengths,
            show_process,
        } => {
            let doc = read_doc(input.as_deref())?;
            let options = amim_dot::RenderOptions {
                show_coordinates,
                show_lengths,
                show_process,
            };
            let dot = amim_dot::render(&doc, &options);
            write_out(output.as_deref(), &dot)
        }
    }
}
