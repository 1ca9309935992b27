use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::frame::{Frame, Transformation};
use crate::graph::Payload;
use crate::process::ExtrusionModel;
use crate::registry::{Entity, dtype};
use crate::state::FabricationState;

/// One of the four mutually derivable process parameters of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessParameter {
    PathWidth,
    PathHeight,
    ExtrusionRate,
    RobotVelocity,
}

impl ProcessParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathWidth => "path_width",
            Self::PathHeight => "path_height",
            Self::ExtrusionRate => "extrusion_rate",
            Self::RobotVelocity => "robot_velocity",
        }
    }
}

/// The smallest addressable unit of a toolpath: a pose plus process
/// parameters.
///
/// Of `path_width`, `path_height`, `extrusion_rate` and `robot_velocity`, any
/// value that is not set is derived on read from the other three through the
/// [`ExtrusionModel`]. Derived values are never stored, so they always reflect
/// the current parameters.
///
/// # Example
///
/// ```
/// use amim::v1::{Frame, Node};
///
/// let node = Node::new(Frame::world_xy())
///     .with_path_profile(0.010, 0.003)
///     .with_extrusion_rate(0.5);
///
/// let v = node.robot_velocity().unwrap();
/// assert!(v > 0.0);
/// assert!(node.tool_frame() == node.frame);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default = "default_name")]
    pub name: String,
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_frame: Option<Frame>,
    /// Blend radius used when joining corners.
    #[serde(default)]
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extrusion_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    robot_velocity: Option<f64>,
    #[serde(default)]
    pub state: FabricationState,
}

fn default_name() -> String {
    "node".to_string()
}

impl Node {
    pub fn new(frame: Frame) -> Self {
        Self {
            name: default_name(),
            frame,
            tool_frame: None,
            radius: 0.0,
            path_width: None,
            path_height: None,
            extrusion_rate: None,
            robot_velocity: None,
            state: FabricationState::default(),
        }
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self::new(frame)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tool_frame(mut self, tool_frame: Frame) -> Self {
        self.tool_frame = Some(tool_frame);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_path_profile(mut self, path_width: f64, path_height: f64) -> Self {
        self.path_width = Some(path_width);
        self.path_height = Some(path_height);
        self
    }

    pub fn with_extrusion_rate(mut self, extrusion_rate: f64) -> Self {
        self.extrusion_rate = Some(extrusion_rate);
        self
    }

    pub fn with_robot_velocity(mut self, robot_velocity: f64) -> Self {
        self.robot_velocity = Some(robot_velocity);
        self
    }

    /// The pose the end effector must reach. Falls back to the current
    /// `frame` when no separate tool frame is set.
    pub fn tool_frame(&self) -> Frame {
        self.tool_frame.unwrap_or(self.frame)
    }

    pub fn has_tool_frame(&self) -> bool {
        self.tool_frame.is_some()
    }

    pub fn set_tool_frame(&mut self, tool_frame: Frame) {
        self.tool_frame = Some(tool_frame);
    }

    pub fn clear_tool_frame(&mut self) {
        self.tool_frame = None;
    }

    /// Tool frame as `[x, y, z, qw, qx, qy, qz]`.
    pub fn pose_quaternion(&self) -> [f64; 7] {
        let frame = self.tool_frame();
        let p = frame.point();
        let q = frame.quaternion();
        [p.x, p.y, p.z, q.w, q.i, q.j, q.k]
    }

    // ── Process parameters ─────────────────────────────────────────────

    /// The explicitly set value, ignoring derivation.
    pub fn stored(&self, parameter: ProcessParameter) -> Option<f64> {
        match parameter {
            ProcessParameter::PathWidth => self.path_width,
            ProcessParameter::PathHeight => self.path_height,
            ProcessParameter::ExtrusionRate => self.extrusion_rate,
            ProcessParameter::RobotVelocity => self.robot_velocity,
        }
    }

    /// Set a parameter. `None` returns it to derived mode.
    pub fn set(&mut self, parameter: ProcessParameter, value: Option<f64>) {
        let slot = match parameter {
            ProcessParameter::PathWidth => &mut self.path_width,
            ProcessParameter::PathHeight => &mut self.path_height,
            ProcessParameter::ExtrusionRate => &mut self.extrusion_rate,
            ProcessParameter::RobotVelocity => &mut self.robot_velocity,
        };
        *slot = value;
    }

    /// Resolve a parameter with the given extrusion model.
    ///
    /// Returns the stored value if set, otherwise derives it from the other
    /// three stored values. Logs a warning and returns `None` when that is not
    /// possible, and logs a warning when a derived width or height falls
    /// outside the model's plausible bounds.
    pub fn resolve(&self, parameter: ProcessParameter, model: &ExtrusionModel) -> Option<f64> {
        if let Some(value) = self.stored(parameter) {
            return Some(value);
        }

        let (w, h, e, v) = (
            self.path_width,
            self.path_height,
            self.extrusion_rate,
            self.robot_velocity,
        );
        let derived = match parameter {
            ProcessParameter::RobotVelocity => {
                w.zip(h).zip(e).map(|((w, h), e)| model.robot_velocity(w, h, e))
            }
            ProcessParameter::ExtrusionRate => {
                w.zip(h).zip(v).map(|((w, h), v)| model.extrusion_rate(w, h, v))
            }
            ProcessParameter::PathWidth => h.zip(v).zip(e).map(|((h, v), e)| {
                let w = model.path_width(h, v, e);
                if let Some(warning) = model.check_width(w) {
                    warn!(node = %self.name, "{}", warning);
                }
                w
            }),
            ProcessParameter::PathHeight => w.zip(v).zip(e).map(|((w, v), e)| {
                let h = model.path_height(w, v, e);
                if let Some(warning) = model.check_height(h) {
                    warn!(node = %self.name, "{}", warning);
                }
                h
            }),
        };

        if derived.is_none() {
            warn!(
                node = %self.name,
                parameter = parameter.as_str(),
                "parameter is not set and cannot be calculated"
            );
        }
        derived
    }

    pub fn path_width(&self) -> Option<f64> {
        self.resolve(ProcessParameter::PathWidth, &ExtrusionModel::default())
    }

    pub fn path_height(&self) -> Option<f64> {
        self.resolve(ProcessParameter::PathHeight, &ExtrusionModel::default())
    }

    pub fn extrusion_rate(&self) -> Option<f64> {
        self.resolve(ProcessParameter::ExtrusionRate, &ExtrusionModel::default())
    }

    pub fn robot_velocity(&self) -> Option<f64> {
        self.resolve(ProcessParameter::RobotVelocity, &ExtrusionModel::default())
    }

    /// Path cross-section `(width, height)`.
    ///
    /// When both dimensions are unset but robot velocity and extrusion rate
    /// are known, a plausible pair is searched with
    /// [`ExtrusionModel::solve_profile`].
    pub fn path_profile(&self, model: &ExtrusionModel) -> Option<(f64, f64)> {
        if self.path_width.is_none()
            && self.path_height.is_none()
            && let (Some(v), Some(e)) = (self.robot_velocity, self.extrusion_rate)
        {
            let profile = model.solve_profile(v, e);
            if profile.is_none() {
                warn!(node = %self.name, "no plausible path profile for the process rates");
            }
            return profile;
        }

        let w = self.resolve(ProcessParameter::PathWidth, model)?;
        let h = self.resolve(ProcessParameter::PathHeight, model)?;
        Some((w, h))
    }

    pub fn set_path_width(&mut self, path_width: f64) {
        self.path_width = Some(path_width);
    }

    pub fn set_path_height(&mut self, path_height: f64) {
        self.path_height = Some(path_height);
    }

    pub fn set_extrusion_rate(&mut self, extrusion_rate: f64) {
        self.extrusion_rate = Some(extrusion_rate);
    }

    pub fn set_robot_velocity(&mut self, robot_velocity: f64) {
        self.robot_velocity = Some(robot_velocity);
    }

    // ── Geometry ───────────────────────────────────────────────────────

    /// Transform the frame and, when set separately, the tool frame.
    pub fn transform(&mut self, transformation: &Transformation) {
        self.frame.transform(transformation);
        if let Some(tool_frame) = self.tool_frame.as_mut() {
            tool_frame.transform(transformation);
        }
    }

    pub fn transformed(&self, transformation: &Transformation) -> Self {
        let mut node = self.clone();
        node.transform(transformation);
        node
    }

    // ── Data ───────────────────────────────────────────────────────────

    pub fn data(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_data(data: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(data)?)
    }
}

impl Payload for Node {
    fn node_type(&self) -> &'static str {
        "node"
    }

    fn dtype(&self) -> &'static str {
        dtype::NODE
    }

    fn to_data(&self) -> Result<serde_json::Value> {
        self.data()
    }

    fn from_entity(entity: Entity) -> Result<Self> {
        match entity {
            Entity::Node(node) => Ok(node),
            other => Err(Error::UnexpectedDtype {
                expected: dtype::NODE.to_string(),
                found: other.dtype().to_string(),
            }),
        }
    }

    fn transform(&mut self, transformation: &Transformation) {
        Node::transform(self, transformation);
    }
}
