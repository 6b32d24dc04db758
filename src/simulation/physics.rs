//! Pluggable per-actor physics models
//!
//! Every model advances one actor by one timestep from its prior pose and
//! velocity plus the actor's accumulated control command. Models are
//! stateless: the simulator owns the state and the caller persists it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::controls::Controls;
use super::error::{Result, SimError};
use super::transform::Transform;
use super::types::{Pose, Vector, Velocity};

/// Below this, wheel-speed differences and turning radii count as zero
pub const DIFF_DRIVE_EPSILON: f64 = 1e-4;

/// Inputs to a single physics step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub dt: f64,
    pub pose: &'a Pose,
    pub velocity: &'a Velocity,
}

/// What a model produced for one step.
///
/// `velocity: None` means the model does not track velocity and the prior
/// value is carried forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateUpdate {
    pub pose: Pose,
    pub velocity: Option<Velocity>,
}

/// A kinematic model bound to one actor
pub trait PhysicsModel: fmt::Debug {
    /// Registry name of the model
    fn name(&self) -> &'static str;

    /// Advance by `ctx.dt`. `None` leaves the prior state in place.
    fn step(&self, ctx: &StepContext<'_>, controls: &Controls) -> Option<StateUpdate>;
}

/// Never moves
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticModel;

impl PhysicsModel for StaticModel {
    fn name(&self) -> &'static str {
        "static"
    }

    fn step(&self, _ctx: &StepContext<'_>, _controls: &Controls) -> Option<StateUpdate> {
        None
    }
}

/// Kinematic bicycle (front/rear axle) car model.
///
/// Only `lf` enters the yaw-rate formula; `lr` is accepted and kept so
/// existing levels keep their numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BicycleModel {
    pub lf: f64,
    pub lr: f64,
}

impl BicycleModel {
    pub fn new(lf: f64, lr: f64) -> Self {
        Self { lf, lr }
    }
}

impl PhysicsModel for BicycleModel {
    fn name(&self) -> &'static str {
        "bicycle"
    }

    fn step(&self, ctx: &StepContext<'_>, controls: &Controls) -> Option<StateUpdate> {
        let theta = controls.theta.unwrap_or(0.0);
        let a = controls.a.unwrap_or(0.0);
        let b = controls.b.unwrap_or(0.0);
        let dt = ctx.dt;
        let Pose {
            position,
            orientation,
        } = *ctx.pose;
        let Velocity { linear, angular } = *ctx.velocity;

        let speed = linear.x.hypot(linear.y);

        // position moves with the velocity from before this step
        let x = position.x + linear.x * dt;
        let y = position.y + linear.y * dt;
        let yaw_rate = speed / self.lf * theta;
        let yaw = orientation.yaw() + yaw_rate * dt;

        let d_speed = ((a - b) * dt).max(-speed);
        let new_speed = speed + d_speed;

        // velocity is re-projected onto the new heading
        let vx = yaw.cos() * new_speed;
        let vy = yaw.sin() * new_speed;

        Some(StateUpdate {
            pose: Pose::new(Vector::new(x, y, position.z), orientation.with_yaw(yaw)),
            velocity: Some(Velocity::new(
                Vector::new(vx, vy, linear.z),
                angular.with_yaw(yaw_rate),
            )),
        })
    }
}

/// Two-wheel kinematic model with independently driven wheels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDriveModel {
    pub track_width: f64,
}

impl DifferentialDriveModel {
    pub fn new(track_width: f64) -> Self {
        Self { track_width }
    }

    /// Motion over `dt` expressed in the vehicle's own frame
    pub fn local_delta(&self, dt: f64, left: f64, right: f64) -> Pose {
        // driving straight (enough)
        if (left - right).abs() < DIFF_DRIVE_EPSILON {
            return Pose::planar(left * dt, 0.0, 0.0);
        }

        let v_slow = left.min(right);
        let v_fast = left.max(right);
        let sign = if left > right { -1.0 } else { 1.0 };
        let half_track = self.track_width / 2.0;
        let r_base = self.track_width / (v_fast / v_slow - 1.0);
        let r_pose = r_base + half_track;

        // turning in place
        if r_pose.abs() < DIFF_DRIVE_EPSILON {
            let alpha = (v_fast * dt) / half_track;
            return Pose::planar(0.0, 0.0, alpha * sign);
        }

        // driving along an arc
        let arc_len = (v_fast + v_slow) / 2.0 * dt;
        let alpha = arc_len / r_pose;
        let dx = alpha.sin() * r_pose;
        let dy = (1.0 - alpha.cos()) * r_pose * sign;
        Pose::planar(dx, dy, alpha * sign)
    }
}

impl PhysicsModel for DifferentialDriveModel {
    fn name(&self) -> &'static str {
        "differentialDrive"
    }

    fn step(&self, ctx: &StepContext<'_>, controls: &Controls) -> Option<StateUpdate> {
        let wheels = controls.wheel_speeds.unwrap_or_default();
        let delta = self.local_delta(ctx.dt, wheels.left, wheels.right);

        let world_to_vehicle = Transform::new(ctx.pose);
        let world_origin_in_vehicle = world_to_vehicle.transform(&Pose::identity());
        let vehicle_to_world = Transform::new(&world_origin_in_vehicle);

        Some(StateUpdate {
            pose: vehicle_to_world.transform(&delta),
            velocity: None,
        })
    }
}

/// Physics binding as written in actor configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_width: Option<f64>,
}

impl PhysicsConfig {
    pub fn static_model() -> Self {
        Self {
            name: "static".to_string(),
            ..Default::default()
        }
    }

    pub fn bicycle(lf: f64, lr: f64) -> Self {
        Self {
            name: "bicycle".to_string(),
            lf: Some(lf),
            lr: Some(lr),
            ..Default::default()
        }
    }

    pub fn differential_drive(track_width: f64) -> Self {
        Self {
            name: "differentialDrive".to_string(),
            track_width: Some(track_width),
            ..Default::default()
        }
    }

    /// Instantiate the named model, failing on unknown names or missing
    /// required parameters
    pub fn build(&self) -> Result<Box<dyn PhysicsModel>> {
        match self.name.as_str() {
            "static" => Ok(Box::new(StaticModel)),
            "bicycle" => {
                let lf = self.lf.ok_or(SimError::MissingParameter {
                    model: "bicycle",
                    param: "lf",
                })?;
                Ok(Box::new(BicycleModel::new(lf, self.lr.unwrap_or(lf))))
            }
            "differentialDrive" => {
                let track_width = self.track_width.ok_or(SimError::MissingParameter {
                    model: "differentialDrive",
                    param: "trackWidth",
                })?;
                Ok(Box::new(DifferentialDriveModel::new(track_width)))
            }
            other => Err(SimError::UnknownPhysicsModel(other.to_string())),
        }
    }
}
