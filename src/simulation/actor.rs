//! Simulated actors: identity, physics binding and accumulated controls

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::asset::AssetConfig;
use super::collision::Shape;
use super::controls::Controls;
use super::error::Result;
use super::physics::{PhysicsConfig, PhysicsModel};
use super::topics::{controls_topic, Message, SubscriptionId, Topics};
use super::types::{Pose, Velocity};

/// Per-tick state of one actor, persisted by the caller between ticks
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorState {
    pub pose: Pose,
    pub velocity: Velocity,
    pub collision: bool,
}

impl ActorState {
    pub fn at(pose: Pose) -> Self {
        Self {
            pose,
            ..Default::default()
        }
    }
}

/// How a level or scenario file describes an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorConfig {
    pub name: String,
    pub physics: PhysicsConfig,
    /// Initial state
    #[serde(default)]
    pub state: ActorState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetConfig>,
    #[serde(default)]
    pub primary_collider: bool,
}

impl ActorConfig {
    pub fn new(name: impl Into<String>, physics: PhysicsConfig) -> Self {
        Self {
            name: name.into(),
            physics,
            state: ActorState::default(),
            asset: None,
            primary_collider: false,
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.state.pose = pose;
        self
    }

    pub fn with_asset(mut self, asset: AssetConfig) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary_collider = true;
        self
    }
}

/// A constructed actor bound to a topic bus
#[derive(Debug)]
pub struct Actor {
    pub name: String,
    pub physics: Box<dyn PhysicsModel>,
    /// Collision geometry in the actor's local frame
    pub shapes: Vec<Shape>,
    pub primary_collider: bool,
    controls: Rc<RefCell<Controls>>,
    subscription: SubscriptionId,
}

impl Actor {
    /// Build the physics model and start listening on `/{name}/controls`.
    ///
    /// Fails if the physics configuration names an unknown model.
    pub fn new(config: &ActorConfig, topics: &Topics) -> Result<Self> {
        let physics = config.physics.build()?;
        let controls = Rc::new(RefCell::new(Controls::default()));

        let held = Rc::clone(&controls);
        let subscription = topics.subscribe(controls_topic(&config.name), move |msg| {
            if let Message::Controls(cmd) = msg {
                held.borrow_mut().merge(cmd);
            }
        });

        Ok(Self {
            name: config.name.clone(),
            physics,
            shapes: config
                .asset
                .as_ref()
                .map(AssetConfig::shapes)
                .unwrap_or_default(),
            primary_collider: config.primary_collider,
            controls,
            subscription,
        })
    }

    /// Snapshot of the currently held command
    pub fn controls(&self) -> Controls {
        *self.controls.borrow()
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }
}
