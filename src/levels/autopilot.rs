//! Built-in scripts that drive each level from the command line

use log::warn;

use super::run::{ActorHandle, IdleScript, Script, TickInput};
use super::slalom::{Cone, PassSide};
use crate::simulation::{
    controls_topic, pose_topic, BicyclePathFollower, Controls, Message, PathFollowerOptions,
    PidGains, Pose, Topics,
};

/// Pick the built-in script for a level name; unknown names get a script that
/// does nothing
pub fn autopilot(level: &str) -> Box<dyn Script> {
    match level {
        "hello-topics" => Box::new(Throttle { accel: 1.0 }),
        "slalom" => Box::new(SlalomDriver::default()),
        "didi-goes-home" => Box::new(TurnThenStraight {
            turn_left_until_x: 0.7,
        }),
        "hello-didi" => Box::new(ConstantWheels {
            left: 0.2,
            right: 0.185,
        }),
        _ => Box::new(IdleScript),
    }
}

/// Publishes a fixed throttle from a pose subscription, never from `tick`
#[derive(Debug)]
pub struct Throttle {
    pub accel: f64,
}

impl Script for Throttle {
    fn on_init(&mut self, topics: &Topics) {
        let publisher = topics.downgrade();
        let accel = self.accel;
        topics.subscribe(pose_topic("ego"), move |_| {
            let controls = Controls::steer(0.0, accel).with_brake(0.0);
            publisher.publish(&controls_topic("ego"), &Message::Controls(controls));
        });
    }
}

/// Weaves around the cones with a path follower and brakes once the light
/// sensor sees the white box
#[derive(Debug)]
pub struct SlalomDriver {
    follower: BicyclePathFollower,
    path_set: bool,
    /// Lateral clearance from each cone (m)
    pub clearance: f64,
}

impl Default for SlalomDriver {
    fn default() -> Self {
        Self {
            follower: BicyclePathFollower::new(PathFollowerOptions {
                gains: PidGains {
                    p: -0.3,
                    i: 0.0,
                    d: -1.2,
                },
                target_speed: 6.0,
                accel: 2.0,
            }),
            path_set: false,
            clearance: 2.5,
        }
    }
}

impl SlalomDriver {
    fn path_around(&self, start: &Pose, cones: &[Cone]) -> Vec<Pose> {
        let x0 = start.position.x;
        let mut path = vec![Pose::planar(x0, start.position.y, start.yaw())];
        path.extend(cones.iter().map(|cone| {
            let dx = match cone.pass_on {
                PassSide::Left => -self.clearance,
                PassSide::Right => self.clearance,
            };
            Pose::planar(cone.x + dx, cone.y, 0.0)
        }));
        let last_y = cones.last().map_or(start.position.y, |c| c.y);
        path.push(Pose::planar(x0, last_y + 20.0, 0.0));
        path.push(Pose::planar(x0, last_y + 400.0, 0.0));
        path
    }
}

impl Script for SlalomDriver {
    fn tick(&mut self, ego: &mut ActorHandle<'_>, input: &TickInput<'_>) {
        if input.sensors.get("color").and_then(|c| c.as_str()) == Some("white") {
            ego.set_controls(Controls::steer(0.0, 0.0).with_brake(10.0));
            return;
        }

        if !self.path_set {
            let cones: Vec<Cone> = match input.sensors.get("cones") {
                Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|err| {
                    warn!("unreadable cone sensor: {}", err);
                    Vec::new()
                }),
                None => Vec::new(),
            };
            let path = self.path_around(ego.pose(), &cones);
            self.follower.set_path(path);
            self.path_set = true;
        }

        if let Err(err) = self.follower.set_pose(input.timestamp, Some(ego.pose())) {
            warn!("slalom driver: {}", err);
            return;
        }
        ego.set_controls(self.follower.compute_controls());
    }
}

/// Turn left until x drops below a threshold, then drive straight
#[derive(Debug)]
pub struct TurnThenStraight {
    pub turn_left_until_x: f64,
}

impl Script for TurnThenStraight {
    fn tick(&mut self, ego: &mut ActorHandle<'_>, _input: &TickInput<'_>) {
        let controls = if ego.pose().position.x > self.turn_left_until_x {
            Controls::wheels(0.2, 1.0)
        } else {
            Controls::wheels(1.0, 1.0)
        };
        ego.set_controls(controls);
    }
}

#[derive(Debug)]
pub struct ConstantWheels {
    pub left: f64,
    pub right: f64,
}

impl Script for ConstantWheels {
    fn tick(&mut self, ego: &mut ActorHandle<'_>, _input: &TickInput<'_>) {
        ego.set_controls(Controls::wheels(self.left, self.right));
    }
}
