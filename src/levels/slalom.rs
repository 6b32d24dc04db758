//! Slalom: weave through cones and stop in the box at the end of the road

use std::collections::BTreeSet;
use std::f64::consts::FRAC_PI_2;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::hello_topics::ego_car;
use super::{GoalState, GoalStatus, Level, LevelInfo, PlanarPose, Sensors};
use crate::simulation::{ActorConfig, Pose};

/// Below this speed (m/s) the car counts as stopped
const STOPPED_SPEED: f64 = 0.05;

/// Side of the cone the car has to pass on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cone {
    pub x: f64,
    pub y: f64,
    pub pass_on: PassSide,
}

impl Cone {
    fn passed_correctly(&self, x: f64) -> bool {
        match self.pass_on {
            PassSide::Left => x < self.x,
            PassSide::Right => x > self.x,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slalom {
    pub cones: Vec<Cone>,
    pub box_start_y: f64,
    pub box_stop_y: f64,
    start: Pose,
    cones_passed: BTreeSet<usize>,
    previous: Option<(PlanarPose, f64)>,
}

impl Default for Slalom {
    fn default() -> Self {
        Self::with_rng(&mut rand::rng(), 0.0, 0.0, 6, 20.0)
    }
}

impl Slalom {
    /// Standard layout with cone positions drawn from `seed`
    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_rng(&mut StdRng::seed_from_u64(seed), 0.0, 0.0, 6, 20.0)
    }

    /// Place `count` cones up the road from `(start_x, start_y)`, roughly
    /// `dy` apart, alternating sides starting with a left pass
    pub fn with_rng<R: Rng + ?Sized>(
        rng: &mut R,
        start_x: f64,
        start_y: f64,
        count: usize,
        dy: f64,
    ) -> Self {
        let mut y = start_y;
        let cones = (0..count)
            .map(|i| {
                y += dy + rng.random_range(-0.5..0.5) * dy;
                Cone {
                    x: start_x,
                    y,
                    pass_on: if i % 2 == 0 {
                        PassSide::Left
                    } else {
                        PassSide::Right
                    },
                }
            })
            .collect();

        Self {
            cones,
            box_start_y: start_y + 200.0,
            box_stop_y: start_y + 230.0,
            start: Pose::planar(start_x, start_y, FRAC_PI_2),
            cones_passed: BTreeSet::new(),
            previous: None,
        }
    }

    pub fn is_in_box(&self, y: f64) -> bool {
        y > self.box_start_y && y < self.box_stop_y
    }

    pub fn cones_passed(&self) -> usize {
        self.cones_passed.len()
    }
}

impl Level for Slalom {
    fn info(&self) -> LevelInfo {
        LevelInfo {
            name: "Ego Slaloms".to_string(),
            description: "Drive to the white box and stop. Stay left of red cones and right of blue ones."
                .to_string(),
            ego: "ego".to_string(),
        }
    }

    fn actors(&self) -> Vec<ActorConfig> {
        vec![ego_car(self.start)]
    }

    fn sensors(&self, pose: &PlanarPose) -> Sensors {
        let mut sensors = Sensors::new();
        sensors.insert("cones".to_string(), json!(self.cones));
        let color = if self.is_in_box(pose.y) { "white" } else { "black" };
        sensors.insert("color".to_string(), json!(color));
        sensors
    }

    fn check_goal(&mut self, state: &GoalState<'_>) -> GoalStatus {
        let (prev_pose, prev_t) = self.previous.unwrap_or((state.pose, state.t_prev));
        let pose = state.pose;

        let speed = match state.poses {
            [.., a, b] => {
                let dt = state.t_prev - prev_t;
                let dist = (b.x - a.x).hypot(b.y - a.y);
                // no elapsed time yet: only a car that hasn't moved is stopped
                if dt > 0.0 {
                    dist / dt
                } else if dist == 0.0 {
                    0.0
                } else {
                    f64::INFINITY
                }
            }
            _ => 0.0,
        };

        for (i, cone) in self.cones.iter().enumerate() {
            if prev_pose.y < cone.y && pose.y > cone.y && cone.passed_correctly(pose.x) {
                debug!("passed cone {} on the {:?}", i, cone.pass_on);
                self.cones_passed.insert(i);
            }
        }
        self.previous = Some((pose, state.t_prev));

        let stopped_in_box = self.is_in_box(pose.y) && speed.abs() < STOPPED_SPEED;
        let passed_all = self.cones_passed.len() == self.cones.len();
        match (stopped_in_box, passed_all) {
            (true, true) => GoalStatus::passed("stopped in the box"),
            (true, false) => GoalStatus::failed(
                "make sure to drive left of the red cones and right of the blue ones!",
            ),
            _ => GoalStatus::pending(),
        }
    }

    fn timeout(&self) -> f64 {
        45.0
    }

    fn reset(&mut self) {
        self.cones_passed.clear();
        self.previous = None;
    }
}
