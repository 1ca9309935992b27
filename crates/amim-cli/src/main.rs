mod cmd_info;
mod cmd_params;
mod cmd_render;
mod cmd_transform;
mod cmd_validate;
mod input;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "amim")]
#[command(about = "Validate, inspect, transform, and visualize AMIM documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Increase log verbosity (-v info, -vv debug). AMIM_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an AMIM document
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print counts and deposited length of a document
    Info {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render AMIM documents to other formats
    Render {
        #[command(subcommand)]
        format: cmd_render::RenderFormat,
    },
    /// Apply a rigid transformation to a document
    Transform(cmd_transform::TransformArgs),
    /// Solve the missing process parameter of a node
    Params(cmd_params::ParamsArgs),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("AMIM_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate { input } => cmd_validate::run(input),
        Commands::Info { input, json } => cmd_info::run(input, json, cli.pretty),
        Commands::Render { format } => cmd_render::run(format),
        Commands::Transform(args) => cmd_transform::run(args, cli.pretty),
        Commands::Params(args) => cmd_params::run(args, cli.pretty),
    }
}
