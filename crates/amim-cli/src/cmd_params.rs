use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use amim::v1::{ExtrusionModel, Frame, NOZZLE_SIZE, Node, ProcessParameter};

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Path width
    #[arg(long)]
    width: Option<f64>,

    /// Path height
    #[arg(long)]
    height: Option<f64>,

    /// Extrusion rate
    #[arg(long)]
    extrusion_rate: Option<f64>,

    /// Robot velocity in mm/s
    #[arg(long)]
    robot_velocity: Option<f64>,

    /// Nozzle size
    #[arg(long, default_value_t = NOZZLE_SIZE)]
    nozzle_size: f64,
}

#[derive(Debug, PartialEq, Serialize)]
struct Solved {
    path_width: f64,
    path_height: f64,
    extrusion_rate: f64,
    robot_velocity: f64,
    nozzle_size: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

pub fn run(args: ParamsArgs, pretty: bool) -> Result<()> {
    let solved = solve(&args)?;
    let json = if pretty {
        serde_json::to_string_pretty(&solved)?
    } else {
        serde_json::to_string(&solved)?
    };
    println!("{}", json);
    Ok(())
}

fn solve(args: &ParamsArgs) -> Result<Solved> {
    let model = ExtrusionModel::new(args.nozzle_size);
    let mut node = Node::new(Frame::world_xy());
    node.set(ProcessParameter::PathWidth, args.width);
    node.set(ProcessParameter::PathHeight, args.height);
    node.set(ProcessParameter::ExtrusionRate, args.extrusion_rate);
    node.set(ProcessParameter::RobotVelocity, args.robot_velocity);

    let Some((path_width, path_height)) = node.path_profile(&model) else {
        bail!("Not enough parameters to solve the path profile");
    };
    node.set(ProcessParameter::PathWidth, Some(path_width));
    node.set(ProcessParameter::PathHeight, Some(path_height));

    let (Some(extrusion_rate), Some(robot_velocity)) = (
        node.resolve(ProcessParameter::ExtrusionRate, &model),
        node.resolve(ProcessParameter::RobotVelocity, &model),
    ) else {
        bail!("Need either --extrusion-rate or --robot-velocity");
    };

    let warnings = [model.check_width(path_width), model.check_height(path_height)]
        .into_iter()
        .flatten()
        .map(|w| w.to_string())
        .collect();

    Ok(Solved {
        path_width,
        path_height,
        extrusion_rate,
        robot_velocity,
        nozzle_size: args.nozzle_size,
        warnings,
    })
}
