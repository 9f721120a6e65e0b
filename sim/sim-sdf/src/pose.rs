//! Rigid transforms and `<pose>` parsing.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ParseOptions;
use crate::error::{Result, SdfError};
use crate::xml::XmlElement;

/// Position and orientation of a frame relative to its parent frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Translation in meters.
    pub translation: Vector3<f64>,
    /// Orientation.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from translation and rotation.
    #[must_use]
    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Create a pose from translation and fixed-axis XYZ roll, pitch, yaw.
    #[must_use]
    pub fn from_xyz_rpy(xyz: Vector3<f64>, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(xyz, UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// Roll, pitch, yaw of the rotation.
    #[must_use]
    pub fn rpy(&self) -> (f64, f64, f64) {
        self.rotation.euler_angles()
    }

    /// Whether this is exactly the identity transform.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.translation == Vector3::zeros() && self.rotation == UnitQuaternion::identity()
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }

    /// Express `child` (given relative to `self`) in the frame `self` is
    /// relative to.
    #[must_use]
    pub fn compose(&self, child: &Pose) -> Pose {
        let iso = self.to_isometry() * child.to_isometry();
        Pose::new(iso.translation.vector, iso.rotation)
    }
}

impl From<Isometry3<f64>> for Pose {
    fn from(iso: Isometry3<f64>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }
}

/// Parse the text of a `<pose>` element.
///
/// Accepts `x y z roll pitch yaw` and, when `allow_quaternion` is set,
/// `x y z qw qx qy qz`. The quaternion is normalized.
///
/// # Errors
///
/// Returns [`SdfError::MalformedPose`] for a wrong number of values, a token
/// that is not a finite number, or a zero quaternion.
pub fn parse_pose(text: &str, allow_quaternion: bool, context: &str) -> Result<Pose> {
    let values: Vec<f64> = text
        .split_whitespace()
        .map(|token| match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SdfError::malformed_pose(
                text,
                format!("{token:?} is not a finite number"),
                context,
            )),
        })
        .collect::<Result<_>>()?;

    match values.as_slice() {
        &[x, y, z, roll, pitch, yaw] => Ok(Pose::from_xyz_rpy(
            Vector3::new(x, y, z),
            roll,
            pitch,
            yaw,
        )),
        &[x, y, z, qw, qx, qy, qz] if allow_quaternion => {
            let q = Quaternion::new(qw, qx, qy, qz);
            if q.norm() < 1e-12 {
                return Err(SdfError::malformed_pose(
                    text,
                    "quaternion has zero length",
                    context,
                ));
            }
            Ok(Pose::new(
                Vector3::new(x, y, z),
                UnitQuaternion::from_quaternion(q),
            ))
        }
        other => {
            let expected = if allow_quaternion { "6 or 7" } else { "6" };
            Err(SdfError::malformed_pose(
                text,
                format!("expected {expected} values, got {}", other.len()),
                context,
            ))
        }
    }
}

/// Pose of `e` from its `<pose>` child, or identity if there is none.
///
/// # Errors
///
/// [`SdfError::DuplicateElement`] for several `<pose>` children, otherwise
/// see [`parse_pose`].
pub fn pose_child(e: &XmlElement, options: &ParseOptions) -> Result<Pose> {
    match e.unique_child("pose")? {
        Some(pose) => parse_pose(pose.text(), options.allow_quaternion_pose, &e.describe()),
        None => Ok(Pose::identity()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translation_only() {
        let pose = parse_pose("0 0 1 0 0 0", true, "model 'm'").unwrap();
        assert_relative_eq!(pose.translation, Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(pose.rotation.angle(), 0.0);
    }

    #[test]
    fn test_rpy_yaw() {
        let pose = parse_pose("1 2 3 0 0 1.5707963267948966", true, "t").unwrap();
        let (roll, pitch, yaw) = pose.rpy();
        assert_relative_eq!(roll, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pitch, 0.0, epsilon = 1e-12);
        assert_relative_eq!(yaw, FRAC_PI_2, epsilon = 1e-12);

        let rotated = pose.rotation * Vector3::x();
        assert_relative_eq!(rotated, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_quaternion_normalized() {
        let pose = parse_pose("0 0 0 2 0 0 0", true, "t").unwrap();
        assert_relative_eq!(pose.rotation.angle(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.rotation.quaternion().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quaternion_rejected_when_disabled() {
        let err = parse_pose("0 0 0 1 0 0 0", false, "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPose);
        assert!(err.to_string().contains("expected 6 values"));
    }

    #[test]
    fn test_malformed_poses() {
        for text in ["1 2", "", "1 2 3 4 5", "1 2 3 4 5 6 7 8", "0 0 a 0 0 0", "0 0 0 nan 0 0"] {
            let err = parse_pose(text, true, "link 'l'").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedPose, "input: {text:?}");
        }
        let err = parse_pose("0 0 0 0 0 0 0", true, "t").unwrap_err();
        assert!(err.to_string().contains("zero length"));
    }

    #[test]
    fn test_pose_child() {
        let options = ParseOptions::default();
        let e = XmlElement::new("link").with_attribute("name", "l");
        assert!(pose_child(&e, &options).unwrap().is_identity());

        let e = e.with_child(XmlElement::new("pose").with_text("1 0 0 0 0 0"));
        assert_relative_eq!(pose_child(&e, &options).unwrap().translation.x, 1.0);

        let e = e.with_child(XmlElement::new("pose").with_text("2 0 0 0 0 0"));
        assert_eq!(
            pose_child(&e, &options).unwrap_err().kind(),
            ErrorKind::DuplicateElement
        );
    }

    #[test]
    fn test_compose() {
        let parent = Pose::from_xyz_rpy(Vector3::new(1.0, 0.0, 0.0), 0.0, 0.0, FRAC_PI_2);
        let child = Pose::new(Vector3::new(1.0, 0.0, 0.0), UnitQuaternion::identity());
        let world = parent.compose(&child);
        assert_relative_eq!(world.translation, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
