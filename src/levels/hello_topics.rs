//! First level: accelerate up a straight road into the finish box

use std::f64::consts::FRAC_PI_2;

use serde_json::json;

use super::{GoalState, GoalStatus, Level, LevelInfo, PlanarPose, Sensors};
use crate::simulation::{ActorConfig, AssetConfig, PhysicsConfig, Pose};

/// Axle distance of the ego car, front and rear
pub const EGO_AXLE: f64 = 2.7;

/// The bicycle-model ego car used by road levels
pub(crate) fn ego_car(pose: Pose) -> ActorConfig {
    ActorConfig::new("ego", PhysicsConfig::bicycle(EGO_AXLE, EGO_AXLE))
        .with_pose(pose)
        .with_asset(AssetConfig::rectangle(4.4, 1.8))
        .primary()
}

#[derive(Debug, Clone)]
pub struct HelloTopics {
    pub start_x: f64,
    pub start_y: f64,
    pub finish_y: f64,
}

impl Default for HelloTopics {
    fn default() -> Self {
        Self::new(50.0, 50.0)
    }
}

impl HelloTopics {
    pub fn new(start_x: f64, start_y: f64) -> Self {
        Self {
            start_x,
            start_y,
            finish_y: start_y + 50.0,
        }
    }
}

impl Level for HelloTopics {
    fn info(&self) -> LevelInfo {
        LevelInfo {
            name: "Hello Topics!".to_string(),
            description: "Publish controls on /ego/controls to drive the car into the white box."
                .to_string(),
            ego: "ego".to_string(),
        }
    }

    fn actors(&self) -> Vec<ActorConfig> {
        vec![ego_car(Pose::planar(self.start_x, self.start_y, FRAC_PI_2))]
    }

    fn sensors(&self, _pose: &PlanarPose) -> Sensors {
        let mut sensors = Sensors::new();
        sensors.insert("color".to_string(), json!("black"));
        sensors
    }

    fn check_goal(&mut self, state: &GoalState<'_>) -> GoalStatus {
        if state.t_prev >= self.timeout() {
            return GoalStatus::failed(format!(
                "need to reach the box in < {} seconds -- try accelerating faster!",
                self.timeout()
            ));
        }
        if state.pose.y > self.finish_y {
            return GoalStatus::passed("reached the box");
        }
        GoalStatus::pending()
    }

    fn timeout(&self) -> f64 {
        15.0
    }
}
