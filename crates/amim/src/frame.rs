//! Oriented frames in 3D space.

use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A rigid transformation applied to frames, nodes, paths and models.
pub type Transformation = Isometry3<f64>;

/// A 3D pose: an origin point and two orthonormal axes.
///
/// The z axis is always `xaxis × yaxis`. Constructors normalise and
/// orthogonalise the axes; deserialisation restores the stored values as-is.
///
/// # JSON shape
///
/// ```json
/// { "point": [0.0, 0.0, 0.0], "xaxis": [1.0, 0.0, 0.0], "yaxis": [0.0, 1.0, 0.0] }
/// ```
///
/// # Example
///
/// ```
/// use amim::v1::{Frame, Transformation};
/// use nalgebra::{Point3, Vector3};
///
/// let mut frame = Frame::world_xy();
/// frame.transform(&Transformation::translation(1.0, 2.0, 3.0));
/// assert_eq!(frame.point(), Point3::new(1.0, 2.0, 3.0));
/// assert_eq!(frame.zaxis(), Vector3::z());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FrameData", into = "FrameData")]
pub struct Frame {
    point: Point3<f64>,
    xaxis: Vector3<f64>,
    yaxis: Vector3<f64>,
}

#[derive(Serialize, Deserialize)]
struct FrameData {
    point: [f64; 3],
    xaxis: [f64; 3],
    yaxis: [f64; 3],
}

impl From<FrameData> for Frame {
    fn from(data: FrameData) -> Self {
        Self {
            point: Point3::from(data.point),
            xaxis: Vector3::from(data.xaxis),
            yaxis: Vector3::from(data.yaxis),
        }
    }
}

impl From<Frame> for FrameData {
    fn from(frame: Frame) -> Self {
        Self {
            point: frame.point.coords.into(),
            xaxis: frame.xaxis.into(),
            yaxis: frame.yaxis.into(),
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::world_xy()
    }
}

impl Frame {
    /// Create a frame from an origin and two (not necessarily unit) axes.
    ///
    /// `yaxis` is projected to be perpendicular to `xaxis`. The axes must be
    /// non-zero and non-parallel.
    #[must_use]
    pub fn new(point: Point3<f64>, xaxis: Vector3<f64>, yaxis: Vector3<f64>) -> Self {
        let xaxis = xaxis.normalize();
        let yaxis = (yaxis - xaxis * xaxis.dot(&yaxis)).normalize();
        Self {
            point,
            xaxis,
            yaxis,
        }
    }

    /// The world XY frame at the origin.
    #[must_use]
    pub fn world_xy() -> Self {
        Self {
            point: Point3::origin(),
            xaxis: Vector3::x(),
            yaxis: Vector3::y(),
        }
    }

    /// A world-aligned frame at `point`.
    #[must_use]
    pub fn from_point(point: Point3<f64>) -> Self {
        Self {
            point,
            ..Self::world_xy()
        }
    }

    /// The frame whose pose is described by `isometry` relative to world XY.
    #[must_use]
    pub fn from_isometry(isometry: &Isometry3<f64>) -> Self {
        Self {
            point: Point3::from(isometry.translation.vector),
            xaxis: isometry.rotation * Vector3::x(),
            yaxis: isometry.rotation * Vector3::y(),
        }
    }

    /// The isometry mapping world XY onto this frame.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.point.coords), self.quaternion())
    }

    pub fn point(&self) -> Point3<f64> {
        self.point
    }

    pub fn set_point(&mut self, point: Point3<f64>) {
        self.point = point;
    }

    pub fn xaxis(&self) -> Vector3<f64> {
        self.xaxis
    }

    pub fn yaxis(&self) -> Vector3<f64> {
        self.yaxis
    }

    pub fn zaxis(&self) -> Vector3<f64> {
        self.xaxis.cross(&self.yaxis)
    }

    /// Orientation of the frame as a unit quaternion.
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        let basis = Rotation3::from_basis_unchecked(&[self.xaxis, self.yaxis, self.zaxis()]);
        UnitQuaternion::from_rotation_matrix(&basis)
    }

    /// Apply `transformation` to this frame in place.
    pub fn transform(&mut self, transformation: &Transformation) {
        self.point = transformation * self.point;
        self.xaxis = transformation.rotation * self.xaxis;
        self.yaxis = transformation.rotation * self.yaxis;
    }

    /// Return a transformed copy of this frame.
    #[must_use]
    pub fn transformed(&self, transformation: &Transformation) -> Self {
        let mut frame = *self;
        frame.transform(transformation);
        frame
    }

    /// Componentwise comparison of origin and axes within `epsilon`.
    pub fn approx_eq(&self, other: &Frame, epsilon: f64) -> bool {
        (self.point - other.point).amax() <= epsilon
            && (self.xaxis - other.xaxis).amax() <= epsilon
            && (self.yaxis - other.yaxis).amax() <= epsilon
    }
}
