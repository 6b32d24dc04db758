//! Core value types for the kinematic simulation
//!
//! Vector, Rotator, Pose and Velocity are immutable: every operation returns
//! a new value. Pose and Velocity lift the component operators member-wise.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

const TWO_PI: f64 = PI * 2.0;

/// A 3D vector in world units (meters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar vector with `z = 0`
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn plus(&self, other: &Vector) -> Vector {
        Vector {
            x: other.x + self.x,
            y: other.y + self.y,
            z: other.z + self.z,
        }
    }

    pub fn minus(&self, other: &Vector) -> Vector {
        self.plus(&other.negative())
    }

    pub fn scale(&self, scalar: f64) -> Vector {
        Vector {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }

    pub fn negative(&self) -> Vector {
        self.scale(-1.0)
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction.
    ///
    /// A zero vector yields non-finite components; callers must check
    /// the magnitude first when that matters.
    pub fn normalize(&self) -> Vector {
        self.scale(1.0 / self.magnitude())
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        other.x * self.x + other.y * self.y + other.z * self.z
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        self.plus(&rhs)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        self.minus(&rhs)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.scale(rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.negative()
    }
}

/// Euler-angle orientation in radians.
///
/// Each axis is reduced with the floating-point remainder by 2π on
/// construction, so values lie in (-2π, 2π). Negative inputs stay negative:
/// `-0.5` remains `-0.5`, it is not wrapped to `2π - 0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RotatorFields")]
pub struct Rotator {
    roll: f64,
    pitch: f64,
    yaw: f64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RotatorFields {
    roll: f64,
    pitch: f64,
    yaw: f64,
}

impl From<RotatorFields> for Rotator {
    fn from(fields: RotatorFields) -> Self {
        Rotator::new(fields.roll, fields.pitch, fields.yaw)
    }
}

impl Rotator {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            roll: roll % TWO_PI,
            pitch: pitch % TWO_PI,
            yaw: yaw % TWO_PI,
        }
    }

    /// Rotation about the vertical axis only
    pub fn from_yaw(yaw: f64) -> Self {
        Self::new(0.0, 0.0, yaw)
    }

    pub fn roll(&self) -> f64 {
        self.roll
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    /// Copy with the yaw replaced, roll and pitch kept
    pub fn with_yaw(&self, yaw: f64) -> Rotator {
        Rotator::new(self.roll, self.pitch, yaw)
    }

    pub fn plus(&self, other: &Rotator) -> Rotator {
        Rotator::new(
            self.roll + other.roll,
            self.pitch + other.pitch,
            self.yaw + other.yaw,
        )
    }

    pub fn minus(&self, other: &Rotator) -> Rotator {
        self.plus(&other.negative())
    }

    pub fn scale(&self, scalar: f64) -> Rotator {
        Rotator::new(self.roll * scalar, self.pitch * scalar, self.yaw * scalar)
    }

    pub fn negative(&self) -> Rotator {
        self.scale(-1.0)
    }
}

/// Position plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Vector,
    pub orientation: Rotator,
}

impl Pose {
    pub fn new(position: Vector, orientation: Rotator) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The world origin with zero heading
    pub fn identity() -> Self {
        Self::default()
    }

    /// Planar pose at (x, y) with the given heading
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self::new(Vector::xy(x, y), Rotator::from_yaw(yaw))
    }

    pub fn yaw(&self) -> f64 {
        self.orientation.yaw()
    }

    pub fn plus(&self, other: &Pose) -> Pose {
        Pose {
            position: other.position.plus(&self.position),
            orientation: other.orientation.plus(&self.orientation),
        }
    }

    pub fn minus(&self, other: &Pose) -> Pose {
        self.plus(&other.negative())
    }

    pub fn scale(&self, scalar: f64) -> Pose {
        Pose {
            position: self.position.scale(scalar),
            orientation: self.orientation.scale(scalar),
        }
    }

    pub fn negative(&self) -> Pose {
        self.scale(-1.0)
    }
}

/// Linear plus angular rate.
///
/// Same shape as [`Pose`] but semantically a rate of change.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub linear: Vector,
    pub angular: Rotator,
}

impl Velocity {
    pub fn new(linear: Vector, angular: Rotator) -> Self {
        Self { linear, angular }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn plus(&self, other: &Velocity) -> Velocity {
        Velocity {
            linear: other.linear.plus(&self.linear),
            angular: other.angular.plus(&self.angular),
        }
    }

    pub fn minus(&self, other: &Velocity) -> Velocity {
        self.plus(&other.negative())
    }

    pub fn scale(&self, scalar: f64) -> Velocity {
        Velocity {
            linear: self.linear.scale(scalar),
            angular: self.angular.scale(scalar),
        }
    }

    pub fn negative(&self) -> Velocity {
        self.scale(-1.0)
    }
}

/// A 2D point in meters, used for collision geometry
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(self) -> Vector {
        Vector::xy(self.x, self.y)
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<Vector> for Point2 {
    fn from(v: Vector) -> Self {
        Point2::new(v.x, v.y)
    }
}
