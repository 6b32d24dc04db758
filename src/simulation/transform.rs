//! Rigid planar coordinate transforms
//!
//! A [`Transform`] built from a reference pose expresses other poses in the
//! frame whose origin and heading are that reference. Only position x/y and
//! yaw of the reference participate; roll and pitch are ignored.

use super::types::{Point2, Pose, Vector};

/// World-to-frame transform for a reference pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    x: f64,
    y: f64,
    /// Negated reference yaw
    yaw: f64,
    cos: f64,
    sin: f64,
}

impl Transform {
    pub fn new(reference: &Pose) -> Self {
        let yaw = -reference.yaw();
        Self {
            x: reference.position.x,
            y: reference.position.y,
            yaw,
            cos: yaw.cos(),
            sin: yaw.sin(),
        }
    }

    /// Express `pose` in this transform's frame.
    ///
    /// Translates by the negated reference position, rotates by the negated
    /// reference yaw and offsets the pose's own yaw by the same amount.
    /// `z`, roll and pitch pass through untouched.
    pub fn transform(&self, pose: &Pose) -> Pose {
        let (x, y) = self.rotate_translate(pose.position.x, pose.position.y);
        Pose {
            position: Vector::new(x, y, pose.position.z),
            orientation: pose.orientation.with_yaw(pose.yaw() + self.yaw),
        }
    }

    /// Express a bare point in this transform's frame
    pub fn transform_point(&self, point: &Point2) -> Point2 {
        let (x, y) = self.rotate_translate(point.x, point.y);
        Point2::new(x, y)
    }

    /// The transform that maps this frame back into the parent frame.
    ///
    /// Built with the double-transform idiom: the parent origin expressed in
    /// this frame becomes the reference of the returned transform. Applying
    /// it rotates by the reference yaw and then translates by the reference
    /// position.
    pub fn inverse(&self) -> Transform {
        Transform::new(&self.transform(&Pose::identity()))
    }

    /// Closed-form counterpart of `self.inverse().transform(pose)`
    pub fn inverse_transform(&self, pose: &Pose) -> Pose {
        // rotate by +yaw: cos(+yaw) = cos, sin(+yaw) = -sin
        let (px, py) = (pose.position.x, pose.position.y);
        let x = self.cos * px + self.sin * py + self.x;
        let y = self.cos * py - self.sin * px + self.y;
        Pose {
            position: Vector::new(x, y, pose.position.z),
            orientation: pose.orientation.with_yaw(pose.yaw() - self.yaw),
        }
    }

    fn rotate_translate(&self, px: f64, py: f64) -> (f64, f64) {
        let tx = px - self.x;
        let ty = py - self.y;
        (self.cos * tx - self.sin * ty, self.cos * ty + self.sin * tx)
    }
}

/// Map a pose given in the local frame of `frame` into world coordinates
pub fn local_to_world(frame: &Pose, local: &Pose) -> Pose {
    Transform::new(frame).inverse().transform(local)
}
