//! Extrusion process model relating path cross-section, extrusion rate and
//! robot velocity.
//!
//! Widths, heights and the nozzle size share one length unit; robot velocity
//! is in mm/s.

use serde::{Deserialize, Serialize};

/// Nozzle size used by the default [`ExtrusionModel`].
pub const NOZZLE_SIZE: f64 = 0.007;

/// Plausibility warning for a derived cross-section dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileWarning {
    WidthBelowNozzle(f64),
    WidthAboveTwiceNozzle(f64),
    HeightBelowMinimum(f64),
    HeightAboveNozzle(f64),
}

impl std::fmt::Display for ProfileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WidthBelowNozzle(w) => {
                write!(f, "calculated path width {w} smaller than nozzle size")
            }
            Self::WidthAboveTwiceNozzle(w) => {
                write!(f, "calculated path width {w} larger than twice the nozzle size")
            }
            Self::HeightBelowMinimum(h) => {
                write!(f, "calculated path height {h} below the minimum layer height")
            }
            Self::HeightAboveNozzle(h) => {
                write!(f, "calculated path height {h} larger than the nozzle diameter")
            }
        }
    }
}

/// Physical model for a continuous-extrusion nozzle.
///
/// # Example
///
/// ```
/// use amim::v1::ExtrusionModel;
///
/// let model = ExtrusionModel::default();
/// let v = model.robot_velocity(0.010, 0.003, 0.5);
/// let e = model.extrusion_rate(0.010, 0.003, v);
/// assert!((e - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionModel {
    pub nozzle_size: f64,
}

impl Default for ExtrusionModel {
    fn default() -> Self {
        Self {
            nozzle_size: NOZZLE_SIZE,
        }
    }
}

impl ExtrusionModel {
    pub fn new(nozzle_size: f64) -> Self {
        Self { nozzle_size }
    }

    /// Volume deposited while the nozzle travels its own length.
    pub fn volume(&self, path_width: f64, path_height: f64) -> f64 {
        path_width * path_height * self.nozzle_size
    }

    /// Robot velocity in mm/s for a given profile and extrusion rate.
    pub fn robot_velocity(&self, path_width: f64, path_height: f64, extrusion_rate: f64) -> f64 {
        let volume = self.volume(path_width, path_height);
        // m/min
        let velocity = (volume * 1000.0) / extrusion_rate;
        (velocity * 1000.0) / 60.0
    }

    /// Extrusion rate for a given profile and robot velocity (mm/s).
    pub fn extrusion_rate(&self, path_width: f64, path_height: f64, robot_velocity: f64) -> f64 {
        let volume = self.volume(path_width, path_height);
        (volume * 1000.0) / to_m_per_min(robot_velocity)
    }

    /// Cross-section area implied by a robot velocity and extrusion rate.
    pub fn cross_section_area(&self, robot_velocity: f64, extrusion_rate: f64) -> f64 {
        let volume = (to_m_per_min(robot_velocity) * extrusion_rate) / 1000.0;
        volume / self.nozzle_size
    }

    /// Width matching `path_height` for the given process rates.
    pub fn path_width(&self, path_height: f64, robot_velocity: f64, extrusion_rate: f64) -> f64 {
        self.cross_section_area(robot_velocity, extrusion_rate) / path_height
    }

    /// Height matching `path_width` for the given process rates.
    pub fn path_height(&self, path_width: f64, robot_velocity: f64, extrusion_rate: f64) -> f64 {
        self.cross_section_area(robot_velocity, extrusion_rate) / path_width
    }

    pub fn min_width(&self) -> f64 {
        self.nozzle_size
    }

    pub fn max_width(&self) -> f64 {
        2.0 * self.nozzle_size
    }

    pub fn min_height(&self) -> f64 {
        self.nozzle_size / 3.5
    }

    pub fn max_height(&self) -> f64 {
        self.nozzle_size
    }

    pub fn check_width(&self, path_width: f64) -> Option<ProfileWarning> {
        if path_width < self.min_width() {
            Some(ProfileWarning::WidthBelowNozzle(path_width))
        } else if path_width > self.max_width() {
            Some(ProfileWarning::WidthAboveTwiceNozzle(path_width))
        } else {
            None
        }
    }

    pub fn check_height(&self, path_height: f64) -> Option<ProfileWarning> {
        if path_height < self.min_height() {
            Some(ProfileWarning::HeightBelowMinimum(path_height))
        } else if path_height > self.max_height() {
            Some(ProfileWarning::HeightAboveNozzle(path_height))
        } else {
            None
        }
    }

    /// Pick a `(width, height)` pair for the given process rates when neither
    /// dimension is known.
    ///
    /// Heights from 0.002 to 0.006 are tried first (step 0.001), keeping the
    /// first whose width falls strictly between the nozzle size and twice the
    /// nozzle size. Failing that, widths across the same range are tried
    /// (step 0.0001) for a height strictly between 0.002 and 0.006.
    pub fn solve_profile(&self, robot_velocity: f64, extrusion_rate: f64) -> Option<(f64, f64)> {
        let area = self.cross_section_area(robot_velocity, extrusion_rate);

        for step in 0..4 {
            let h = 0.002 + 0.001 * f64::from(step);
            let w = area / h;
            if w > self.min_width() && w < self.max_width() {
                return Some((w, h));
            }
        }

        let steps = ((self.max_width() - self.min_width()) / 0.0001).round() as u32;
        for step in 0..steps {
            let w = self.min_width() + 0.0001 * f64::from(step);
            let h = area / w;
            if h > 0.002 && h < 0.006 {
                return Some((w, h));
            }
        }

        None
    }
}

fn to_m_per_min(robot_velocity: f64) -> f64 {
    (robot_velocity * 60.0) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_velocity_extrusion_inverse() {
        let m = ExtrusionModel::default();
        let e = 0.25;
        let v = m.robot_velocity(0.010, 0.003, e);
        assert_relative_eq!(m.extrusion_rate(0.010, 0.003, v), e, max_relative = 1e-12);
    }

    #[test]
    fn test_robot_velocity_formula() {
        let m = ExtrusionModel::default();
        let volume = 0.010 * 0.003 * 0.007;
        let expected = ((volume * 1000.0 / 0.5) * 1000.0) / 60.0;
        assert_relative_eq!(m.robot_velocity(0.010, 0.003, 0.5), expected);
    }

    #[test]
    fn test_width_and_height_recovered() {
        let m = ExtrusionModel::default();
        let (w, h, e) = (0.010, 0.003, 0.4);
        let v = m.robot_velocity(w, h, e);
        assert_relative_eq!(m.path_width(h, v, e), w, max_relative = 1e-12);
        assert_relative_eq!(m.path_height(w, v, e), h, max_relative = 1e-12);
    }

    #[test]
    fn test_bounds() {
        let m = ExtrusionModel::default();
        assert_eq!(m.check_width(0.010), None);
        assert_eq!(
            m.check_width(0.005),
            Some(ProfileWarning::WidthBelowNozzle(0.005))
        );
        assert_eq!(
            m.check_width(0.020),
            Some(ProfileWarning::WidthAboveTwiceNozzle(0.020))
        );
        assert_relative_eq!(m.min_height(), 0.002, max_relative = 1e-12);
        assert_eq!(m.check_height(0.005), None);
        assert!(matches!(
            m.check_height(0.001),
            Some(ProfileWarning::HeightBelowMinimum(_))
        ));
        assert!(matches!(
            m.check_height(0.008),
            Some(ProfileWarning::HeightAboveNozzle(_))
        ));
    }

    #[test]
    fn test_solve_profile_by_height() {
        let m = ExtrusionModel::default();
        // area 0.01 * 0.003 gives w = 0.015 at h = 0.002, then 0.010 at h = 0.003
        let v = m.robot_velocity(0.010, 0.003, 0.4);
        let (w, h) = m.solve_profile(v, 0.4).unwrap();
        assert_relative_eq!(h, 0.003, max_relative = 1e-9);
        assert_relative_eq!(w, 0.010, max_relative = 1e-9);
    }

    #[test]
    fn test_solve_profile_impossible() {
        let m = ExtrusionModel::default();
        let v = m.robot_velocity(1.0, 1.0, 0.4);
        assert_eq!(m.solve_profile(v, 0.4), None);
    }

    #[test]
    fn test_warning_display() {
        let msg = ProfileWarning::WidthBelowNozzle(0.001).to_string();
        assert!(msg.contains("smaller than nozzle size"));
    }
}
