//! Bumper safety controller for differential-drive robots
//!
//! Converts `(linear, angular)` velocity commands into wheel speeds. After a
//! collision it ignores commands and reverses for a fixed number of pose
//! updates.

use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use super::controls::Controls;
use super::topics::{collision_topic, controls_topic, pose_topic, Message, SubscriptionId, Topics};

/// Pose updates spent reversing after a collision
pub const BACKUP_STEPS: u32 = 15;
/// Wheel speed used while reversing (m/s)
pub const BACKUP_SPEED: f64 = -0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyOptions {
    pub pose_topic: String,
    pub cmd_topic: String,
    pub publish_controls_topic: String,
    pub collision_topic: String,
    pub track_width: f64,
}

impl SafetyOptions {
    /// Standard topic layout for `actor`, taking commands on `/{actor}/cmd_vel`
    pub fn for_actor(actor: &str, track_width: f64) -> Self {
        Self {
            pose_topic: pose_topic(actor),
            cmd_topic: format!("/{}/cmd_vel", actor),
            publish_controls_topic: controls_topic(actor),
            collision_topic: collision_topic(actor),
            track_width,
        }
    }
}

/// Wheel speeds for a body twist on a robot with `track_width`
pub fn twist_to_wheels(linear: f64, angular: f64, track_width: f64) -> Controls {
    let dv = angular * track_width / 2.0;
    Controls::wheels(linear - dv, linear + dv)
}

#[derive(Debug)]
pub struct DiffDriveSafetyController {
    backup_steps: Rc<Cell<u32>>,
    subscriptions: Vec<SubscriptionId>,
}

impl DiffDriveSafetyController {
    pub fn attach(options: SafetyOptions, topics: &Topics) -> Self {
        let backup_steps = Rc::new(Cell::new(0));

        let steps = Rc::clone(&backup_steps);
        let on_collision = topics.subscribe(options.collision_topic.clone(), move |msg| {
            if matches!(msg, Message::Collision(_)) {
                debug!("bumper hit, reversing for {} steps", BACKUP_STEPS);
                steps.set(BACKUP_STEPS);
            }
        });

        let steps = Rc::clone(&backup_steps);
        let on_pose = topics.subscribe(options.pose_topic.clone(), move |_| {
            steps.set(steps.get().saturating_sub(1));
        });

        let steps = Rc::clone(&backup_steps);
        let publisher = topics.downgrade();
        let SafetyOptions {
            cmd_topic,
            publish_controls_topic,
            track_width,
            ..
        } = options;
        let on_cmd = topics.subscribe(cmd_topic, move |msg| {
            let Message::Twist(twist) = msg else {
                return;
            };
            let controls = if steps.get() > 0 {
                Controls::wheels(BACKUP_SPEED, BACKUP_SPEED)
            } else {
                twist_to_wheels(twist.linear, twist.angular, track_width)
            };
            publisher.publish(&publish_controls_topic, &Message::Controls(controls));
        });

        Self {
            backup_steps,
            subscriptions: vec![on_collision, on_pose, on_cmd],
        }
    }

    /// Remaining pose updates before commands are obeyed again
    pub fn backup_steps(&self) -> u32 {
        self.backup_steps.get()
    }

    /// Stop listening on the bus
    pub fn detach(self, topics: &Topics) {
        for id in self.subscriptions {
            topics.unsubscribe(id);
        }
    }
}
