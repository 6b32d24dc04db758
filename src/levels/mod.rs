//! Levels: actor layouts, sensors and goal checks
//!
//! A [`Level`] describes what is simulated and when a run is over. The
//! [`Run`] driver ties a level to a user [`Script`] and the simulator.

mod autopilot;
mod didi;
mod hello_topics;
mod run;
mod slalom;

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::simulation::{ActorConfig, Pose, Result, SimError};

#[allow(unused_imports)]
pub use autopilot::{autopilot, ConstantWheels, SlalomDriver, Throttle, TurnThenStraight};
pub use didi::{DidiGoesHome, HelloDidi, Room};
pub use hello_topics::HelloTopics;
#[allow(unused_imports)]
pub use run::{ActorHandle, IdleScript, Run, RunStatus, Script, TickInput};
#[allow(unused_imports)]
pub use slalom::{Cone, PassSide, Slalom};

/// Names accepted by [`by_name`]
pub const LEVEL_NAMES: [&str; 4] = ["hello-topics", "slalom", "didi-goes-home", "hello-didi"];

/// Sensor readings merged into a script's tick input
pub type Sensors = Map<String, Value>;

/// Position and heading of the ego actor, as goal checks see it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlanarPose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl From<&Pose> for PlanarPose {
    fn from(pose: &Pose) -> Self {
        Self {
            x: pose.position.x,
            y: pose.position.y,
            yaw: pose.yaw(),
        }
    }
}

/// What a goal check gets to look at, once per tick before stepping
#[derive(Debug, Clone, Copy)]
pub struct GoalState<'a> {
    /// Ego pose after the previous step
    pub pose: PlanarPose,
    /// Simulation time at the start of this tick
    pub t_prev: f64,
    /// Every ego pose so far, oldest first
    pub poses: &'a [PlanarPose],
}

/// Outcome of a goal check. Both unset means keep running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoalStatus {
    pub pass: Option<String>,
    pub fail: Option<String>,
}

impl GoalStatus {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            pass: Some(message.into()),
            fail: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            pass: None,
            fail: Some(message.into()),
        }
    }
}

/// Display metadata for a level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub name: String,
    pub description: String,
    /// Actor the user script controls
    pub ego: String,
}

pub trait Level: fmt::Debug {
    fn info(&self) -> LevelInfo;

    /// Actors to construct for a new run, the ego among them
    fn actors(&self) -> Vec<ActorConfig>;

    fn sensors(&self, _pose: &PlanarPose) -> Sensors {
        Sensors::new()
    }

    fn check_goal(&mut self, state: &GoalState<'_>) -> GoalStatus;

    /// Seconds of simulation time before the run fails
    fn timeout(&self) -> f64 {
        60.0
    }

    fn collision_is_failure(&self) -> bool {
        false
    }

    /// Forget per-run progress
    fn reset(&mut self) {}
}

/// Look up a level by its CLI name. `seed` drives any level randomness.
pub fn by_name(name: &str, seed: u64) -> Result<Box<dyn Level>> {
    match name {
        "hello-topics" => Ok(Box::new(HelloTopics::default())),
        "slalom" => Ok(Box::new(Slalom::new_with_seed(seed))),
        "didi-goes-home" => Ok(Box::new(DidiGoesHome::default())),
        "hello-didi" => Ok(Box::new(HelloDidi::default())),
        other => Err(SimError::UnknownLevel(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        for name in LEVEL_NAMES {
            let level = by_name(name, 7).unwrap();
            let ego = level.info().ego;
            assert!(level.actors().iter().any(|a| a.name == ego), "{name}");
        }
        assert_eq!(
            by_name("moon-landing", 0).unwrap_err(),
            SimError::UnknownLevel("moon-landing".to_string())
        );
    }

    #[test]
    fn test_planar_pose_from_pose() {
        let p = PlanarPose::from(&Pose::planar(1.0, 2.0, 0.5));
        assert_eq!(p, PlanarPose { x: 1.0, y: 2.0, yaw: 0.5 });
    }
}
