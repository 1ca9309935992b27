use anyhow::{Result, bail};
use clap::Args;
use nalgebra::{Translation3, UnitQuaternion, Vector3};
use std::path::PathBuf;
use tracing::info;

use amim::v1::Transformation;

use crate::input::{read_doc, to_json, write_out};

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Translation as x,y,z
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    translate: Option<Vec<f64>>,

    /// Rotation about the world z axis, in degrees. Applied before the translation.
    #[arg(long, allow_hyphen_values = true)]
    rotate_z: Option<f64>,

    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: TransformArgs, pretty: bool) -> Result<()> {
    let transformation = build_transformation(args.translate.as_deref(), args.rotate_z)?;
    let mut doc = read_doc(Some(args.input.as_path()))?;
    doc.transform(&transformation);
    info!(kind = doc.kind(), "transformed document");

    let mut json = to_json(&doc, pretty)?;
    json.push('\n');
    write_out(args.output.as_deref(), &json)
}

fn build_transformation(
    translate: Option<&[f64]>,
    rotate_z: Option<f64>,
) -> Result<Transformation> {
    let translation = match translate {
        None => Translation3::identity(),
        Some(&[x, y, z]) => Translation3::new(x, y, z),
        Some(other) => bail!("--translate expects 3 values, got {}", other.len()),
    };
    let rotation = rotate_z
        .map(|deg| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), deg.to_radians()))
        .unwrap_or_else(UnitQuaternion::identity);
    Ok(Transformation::from_parts(translation, rotation))
}
