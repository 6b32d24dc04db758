//! Core vehicle simulation
//!
//! Geometry, physics models, collision checking, the topic bus and the
//! fixed-timestep simulator that ties them together, plus the controllers
//! that drive actors over the bus. Nothing here renders or reads input; it
//! can run and be tested from the console.

mod actor;
mod asset;
mod collision;
mod controls;
mod error;
mod ogrid;
mod path_follower;
mod physics;
mod pid;
mod safety;
mod simulator;
mod topics;
mod transform;
mod types;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use actor::{Actor, ActorConfig, ActorState};
#[allow(unused_imports)]
pub use asset::AssetConfig;
#[allow(unused_imports)]
pub use collision::{
    check_collision, detect_collisions, polygons_collide, shapes_collide, Circle, CollisionBody,
    Shape,
};
#[allow(unused_imports)]
pub use controls::{Controls, WheelSpeeds};
pub use error::{Result, SimError};
#[allow(unused_imports)]
pub use ogrid::{compute_ogrid_from_poses, OGrid, UNKNOWN};
#[allow(unused_imports)]
pub use path_follower::{BicyclePathFollower, PathFollowerOptions, MAX_STEERING};
#[allow(unused_imports)]
pub use physics::{
    BicycleModel, DifferentialDriveModel, PhysicsConfig, PhysicsModel, StateUpdate, StaticModel,
    StepContext, DIFF_DRIVE_EPSILON,
};
#[allow(unused_imports)]
pub use pid::{Pid, PidGains};
#[allow(unused_imports)]
pub use safety::{
    twist_to_wheels, DiffDriveSafetyController, SafetyOptions, BACKUP_SPEED, BACKUP_STEPS,
};
pub use simulator::Simulator;
#[allow(unused_imports)]
pub use topics::{
    collision_topic, controls_topic, path_topic, pose_topic, CollisionEvent, Message, PoseStamped,
    SubscriptionId, Topics, Twist, WeakTopics,
};
#[allow(unused_imports)]
pub use transform::{local_to_world, Transform};
#[allow(unused_imports)]
pub use types::{Point2, Pose, Rotator, Vector, Velocity};
