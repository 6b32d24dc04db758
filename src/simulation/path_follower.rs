//! Cross-track-error path follower for bicycle-model vehicles
//!
//! Steering comes from a PID on the lateral offset of the vehicle from the
//! active path segment; throttle is bang-bang around a target speed.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use ordered_float::OrderedFloat;

use super::controls::Controls;
use super::error::{Result, SimError};
use super::pid::{Pid, PidGains};
use super::topics::{controls_topic, path_topic, pose_topic, Message, Topics};
use super::transform::Transform;
use super::types::{Pose, Rotator, Vector};

/// Steering output is clamped to ±this many radians
pub const MAX_STEERING: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFollowerOptions {
    pub gains: PidGains,
    pub target_speed: f64,
    pub accel: f64,
}

impl Default for PathFollowerOptions {
    fn default() -> Self {
        Self {
            gains: PidGains {
                p: -0.05,
                i: 0.0,
                d: -1.2,
            },
            target_speed: 9.3,
            accel: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BicyclePathFollower {
    options: PathFollowerOptions,
    pid: Pid,
    path: Vec<Pose>,
    pose: Option<Pose>,
    last_timestamp: f64,
    velocity: Option<Vector>,
}

impl Default for BicyclePathFollower {
    fn default() -> Self {
        Self::new(PathFollowerOptions::default())
    }
}

impl BicyclePathFollower {
    pub fn new(options: PathFollowerOptions) -> Self {
        Self {
            options,
            pid: Pid::from_gains(options.gains),
            path: Vec::new(),
            pose: None,
            last_timestamp: 0.0,
            velocity: None,
        }
    }

    /// Replace the path to follow
    pub fn set_path(&mut self, path: Vec<Pose>) {
        if path.len() < 2 {
            warn!("path has {} waypoints, need at least 2 to follow", path.len());
        }
        self.path = path;
    }

    pub fn path(&self) -> &[Pose] {
        &self.path
    }

    /// Change the cruise speed; the steering PID keeps its state
    pub fn set_target_speed(&mut self, speed: f64) {
        self.options.target_speed = speed;
    }

    pub fn target_speed(&self) -> f64 {
        self.options.target_speed
    }

    /// Feed the latest pose telemetry.
    ///
    /// Velocity is finite-differenced against the previous pose; a
    /// non-positive time delta keeps the previous estimate.
    pub fn set_pose(&mut self, timestamp: f64, pose: Option<&Pose>) -> Result<()> {
        if !timestamp.is_finite() {
            return Err(SimError::InvalidTimestamp(timestamp));
        }
        let pose = *pose.ok_or(SimError::MissingPose)?;

        if let Some(prev) = self.pose {
            let dt = timestamp - self.last_timestamp;
            if dt > 0.0 {
                self.velocity = Some(pose.minus(&prev).scale(1.0 / dt).position);
            }
        }
        self.pose = Some(pose);
        self.last_timestamp = timestamp;
        Ok(())
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Estimated speed, 0 until two poses have been seen
    pub fn speed(&self) -> f64 {
        self.velocity.map_or(0.0, |v| v.magnitude())
    }

    /// The path segment the vehicle is currently on.
    ///
    /// Finds the closest waypoint (the last one excluded), then decides
    /// between the segment before and after it by which side of the corner's
    /// angle bisector the vehicle is on.
    pub fn next_two_waypoints(&self) -> Option<(Pose, Pose)> {
        let pose = self.pose?;
        if self.path.len() < 2 {
            return None;
        }

        let (i, _) = self.path[..self.path.len() - 1]
            .iter()
            .enumerate()
            .min_by_key(|(_, point)| {
                OrderedFloat(pose.position.minus(&point.position).magnitude())
            })?;
        if i == 0 {
            return Some((self.path[0], self.path[1]));
        }

        let prev = self.path[i - 1].position;
        let closest = self.path[i].position;
        let next = self.path[i + 1].position;
        let v0 = prev.minus(&closest).normalize();
        let v1 = next.minus(&closest).normalize();
        let bisect = v0.plus(&v1).normalize();
        let yaw = bisect.y.atan2(bisect.x);

        let tf = Transform::new(&Pose::new(closest, Rotator::from_yaw(yaw)));
        let pose_in_bisect = tf.transform(&pose).position.y;
        let prev_in_bisect = tf.transform(&Pose::new(prev, Rotator::default())).position.y;
        // a straight corner gives a NaN ratio, which keeps the forward segment
        let start = if pose_in_bisect / prev_in_bisect > 0.0 {
            i - 1
        } else {
            i
        };
        Some((self.path[start], self.path[start + 1]))
    }

    /// Lateral offset of the vehicle from the active segment, positive to the
    /// segment's left
    pub fn cross_track_error(&self) -> Option<f64> {
        let pose = self.pose?;
        let (prev, next) = self.next_two_waypoints()?;
        let dy = next.position.y - prev.position.y;
        let dx = next.position.x - prev.position.x;
        let segment_frame = Pose::new(prev.position, prev.orientation.with_yaw(dy.atan2(dx)));
        Some(Transform::new(&segment_frame).transform(&pose).position.y)
    }

    /// Steering and throttle for the current pose and path.
    ///
    /// Returns zero steering and acceleration until both are known.
    pub fn compute_controls(&mut self) -> Controls {
        let Some(cte) = self.cross_track_error() else {
            return Controls::steer(0.0, 0.0);
        };

        let theta = self.pid.update(cte).clamp(-MAX_STEERING, MAX_STEERING);
        let a = if self.speed() < self.options.target_speed {
            self.options.accel
        } else {
            0.0
        };
        debug!("path follower cte={:.3} theta={:.3} a={:.2}", cte, theta, a);
        Controls::steer(theta, a)
    }

    /// Drive `actor` from the bus: listen on `/{actor}/path` and
    /// `/{actor}/pose`, publish on `/{actor}/controls` after every pose
    pub fn attach(self, topics: &Topics, actor: &str) -> Rc<RefCell<Self>> {
        let follower = Rc::new(RefCell::new(self));

        let on_path = Rc::clone(&follower);
        topics.subscribe(path_topic(actor), move |msg| {
            if let Message::Path(path) = msg {
                on_path.borrow_mut().set_path(path.clone());
            }
        });

        let on_pose = Rc::clone(&follower);
        let publisher = topics.downgrade();
        let out_topic = controls_topic(actor);
        topics.subscribe(pose_topic(actor), move |msg| {
            let Message::Pose(stamped) = msg else {
                return;
            };
            let controls = {
                let mut follower = on_pose.borrow_mut();
                if let Err(err) = follower.set_pose(stamped.timestamp, Some(&stamped.pose)) {
                    warn!("path follower rejected pose: {}", err);
                    return;
                }
                follower.compute_controls()
            };
            publisher.publish(&out_topic, &Message::Controls(controls));
        });

        follower
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn straight_path() -> Vec<Pose> {
        (0..5).map(|i| Pose::planar(i as f64 * 10.0, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_no_path_or_pose_gives_zero() {
        let mut f = BicyclePathFollower::default();
        assert_eq!(f.compute_controls(), Controls::steer(0.0, 0.0));
        f.set_path(straight_path());
        assert_eq!(f.compute_controls(), Controls::steer(0.0, 0.0));
    }

    #[test]
    fn test_set_pose_validates() {
        let mut f = BicyclePathFollower::default();
        assert!(matches!(
            f.set_pose(f64::NAN, Some(&Pose::identity())),
            Err(SimError::InvalidTimestamp(t)) if t.is_nan()
        ));
        assert_eq!(
            f.set_pose(f64::INFINITY, Some(&Pose::identity())),
            Err(SimError::InvalidTimestamp(f64::INFINITY))
        );
        assert_eq!(f.set_pose(0.0, None), Err(SimError::MissingPose));
        assert!(f.pose().is_none());
    }

    #[test]
    fn test_velocity_from_finite_difference() {
        let mut f = BicyclePathFollower::default();
        f.set_pose(1.0, Some(&Pose::planar(0.0, 0.0, 0.0))).unwrap();
        assert_eq!(f.speed(), 0.0);
        f.set_pose(1.5, Some(&Pose::planar(3.0, 4.0, 0.0))).unwrap();
        assert_abs_diff_eq!(f.speed(), 10.0, epsilon = 1e-12);
        // repeated timestamp keeps the estimate
        f.set_pose(1.5, Some(&Pose::planar(9.0, 9.0, 0.0))).unwrap();
        assert_abs_diff_eq!(f.speed(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_track_error_sign() {
        let mut f = BicyclePathFollower::default();
        f.set_path(straight_path());
        f.set_pose(0.0, Some(&Pose::planar(12.0, 1.5, 0.0))).unwrap();
        assert_abs_diff_eq!(f.cross_track_error().unwrap(), 1.5, epsilon = 1e-9);
        f.set_pose(0.1, Some(&Pose::planar(12.0, -0.5, 0.0))).unwrap();
        assert_abs_diff_eq!(f.cross_track_error().unwrap(), -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_corner_picks_segment_ahead() {
        // right-angle corner at (10, 0), turning toward +y
        let path = vec![
            Pose::planar(0.0, 0.0, 0.0),
            Pose::planar(10.0, 0.0, 0.0),
            Pose::planar(10.0, 10.0, 0.0),
            Pose::planar(10.0, 20.0, 0.0),
        ];
        let mut f = BicyclePathFollower::default();
        f.set_path(path);

        // still approaching the corner along the first leg
        f.set_pose(0.0, Some(&Pose::planar(9.0, 0.2, 0.0))).unwrap();
        let (a, b) = f.next_two_waypoints().unwrap();
        assert_eq!(a.position, Vector::xy(0.0, 0.0));
        assert_eq!(b.position, Vector::xy(10.0, 0.0));

        // past the bisector, on the second leg
        f.set_pose(0.1, Some(&Pose::planar(9.8, 1.0, 0.0))).unwrap();
        let (a, b) = f.next_two_waypoints().unwrap();
        assert_eq!(a.position, Vector::xy(10.0, 0.0));
        assert_eq!(b.position, Vector::xy(10.0, 10.0));
    }

    #[test]
    fn test_controls_clamped_and_throttle() {
        let mut f = BicyclePathFollower::new(PathFollowerOptions {
            gains: PidGains {
                p: -10.0,
                i: 0.0,
                d: 0.0,
            },
            target_speed: 5.0,
            accel: 1.5,
        });
        f.set_path(straight_path());
        f.set_pose(0.0, Some(&Pose::planar(5.0, 3.0, 0.0))).unwrap();
        // first PID call has no history
        assert_eq!(f.compute_controls(), Controls::steer(0.0, 1.5));
        f.set_pose(1.0, Some(&Pose::planar(15.0, 3.0, 0.0))).unwrap();
        let c = f.compute_controls();
        assert_eq!(c.theta, Some(-MAX_STEERING));
        // 10 m/s is above the target
        assert_eq!(c.a, Some(0.0));
    }

    #[test]
    fn test_attach_publishes_controls() {
        let topics = Topics::new();
        let received = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&received);
        topics.subscribe("/ego/controls", move |msg| {
            if let Message::Controls(c) = msg {
                r.borrow_mut().push(*c);
            }
        });

        let follower = BicyclePathFollower::default().attach(&topics, "ego");
        topics.publish("/ego/path", &Message::Path(straight_path()));
        assert_eq!(follower.borrow().path().len(), 5);

        topics.publish(
            "/ego/pose",
            &Message::Pose(crate::simulation::topics::PoseStamped {
                timestamp: 0.1,
                pose: Pose::planar(1.0, 0.5, 0.0),
            }),
        );
        assert_eq!(received.borrow().len(), 1);
        assert_eq!(received.borrow()[0].a, Some(2.0));
    }

    #[test]
    fn test_set_target_speed_keeps_pid_state() {
        let mut f = BicyclePathFollower::default();
        f.set_path(straight_path());
        f.set_pose(0.0, Some(&Pose::planar(1.0, 0.5, 0.0))).unwrap();
        f.set_pose(1.0, Some(&Pose::planar(4.0, 0.5, 0.0))).unwrap();
        f.compute_controls();
        let integral = f.pid.integral();

        f.set_target_speed(2.0);
        assert_eq!(f.target_speed(), 2.0);
        assert_eq!(f.pid.integral(), integral);
        // 3 m/s is above the new target, so no throttle
        assert_eq!(f.compute_controls().a, Some(0.0));

        f.set_target_speed(5.0);
        assert_eq!(f.compute_controls().a, Some(2.0));
    }

    #[test]
    fn test_attached_follower_does_not_keep_bus_alive() {
        let topics = Topics::new();
        let follower = BicyclePathFollower::default().attach(&topics, "ego");
        let weak = topics.downgrade();
        drop(topics);
        assert!(weak.upgrade().is_none());
        assert_eq!(Rc::strong_count(&follower), 1);
    }
}
