//! Control commands accumulated by actors between ticks

use serde::{Deserialize, Serialize};

/// Left/right wheel speeds for differential-drive actors (m/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

impl WheelSpeeds {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// A model-specific control command.
///
/// Bicycle models read `theta` (steering, radians), `a` (forward
/// acceleration) and `b` (braking deceleration). Differential-drive models
/// read `wheel_speeds`. Absent fields mean "not set by this command".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Controls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheel_speeds: Option<WheelSpeeds>,
}

impl Controls {
    /// Bicycle command with steering and acceleration set
    pub fn steer(theta: f64, a: f64) -> Self {
        Self {
            theta: Some(theta),
            a: Some(a),
            ..Default::default()
        }
    }

    /// Differential-drive command
    pub fn wheels(left: f64, right: f64) -> Self {
        Self {
            wheel_speeds: Some(WheelSpeeds::new(left, right)),
            ..Default::default()
        }
    }

    pub fn with_brake(mut self, b: f64) -> Self {
        self.b = Some(b);
        self
    }

    /// Shallow merge: every field present in `other` overwrites ours.
    ///
    /// `wheel_speeds` is replaced as a whole, never per wheel.
    pub fn merge(&mut self, other: &Controls) {
        if other.theta.is_some() {
            self.theta = other.theta;
        }
        if other.a.is_some() {
            self.a = other.a;
        }
        if other.b.is_some() {
            self.b = other.b;
        }
        if other.wheel_speeds.is_some() {
            self.wheel_speeds = other.wheel_speeds;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_none() && self.a.is_none() && self.b.is_none() && self.wheel_speeds.is_none()
    }
}
