//! Fixed-timestep simulator
//!
//! Owns the actors of one simulation run and advances them together. State
//! lives with the caller: [`Simulator::step`] takes the prior states and
//! returns the next ones, so a driver can persist or discard them (for
//! example to roll back after a failed goal).

use std::collections::HashSet;

use log::{debug, info};

use super::actor::{Actor, ActorConfig, ActorState};
use super::collision::{detect_collisions, CollisionBody};
use super::controls::Controls;
use super::error::{Result, SimError};
use super::physics::StepContext;
use super::topics::{
    collision_topic, controls_topic, pose_topic, CollisionEvent, Message, PoseStamped, Topics,
};

/// The actors of one simulation and its clock
#[derive(Debug)]
pub struct Simulator {
    actors: Vec<Actor>,
    initial: Vec<ActorState>,
    topics: Topics,
    time: f64,
}

impl Simulator {
    /// Construct every actor and bind it to `topics`.
    ///
    /// Fails on duplicate actor names or an unknown physics model.
    pub fn new(configs: &[ActorConfig], topics: Topics) -> Result<Self> {
        let mut names = HashSet::new();
        for config in configs {
            if !names.insert(config.name.as_str()) {
                return Err(SimError::DuplicateActor(config.name.clone()));
            }
        }

        let actors = configs
            .iter()
            .map(|config| Actor::new(config, &topics))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Simulator built with {} actors ({} primary colliders)",
            actors.len(),
            actors.iter().filter(|a| a.primary_collider).count()
        );

        Ok(Self {
            actors,
            initial: configs.iter().map(|c| c.state).collect(),
            topics,
            time: 0.0,
        })
    }

    /// Start the clock at `time` instead of zero
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Advance every actor by `dt`.
    ///
    /// `states` must hold one entry per actor in construction order; a
    /// mismatched slice is a caller error and only the overlapping prefix
    /// is stepped. Returns the final states in actor order.
    ///
    /// Poses published on `/{name}/pose` are the freshly computed ones, even
    /// for a primary collider whose returned state was reverted because of a
    /// collision.
    pub fn step(&mut self, dt: f64, states: &[ActorState]) -> Vec<ActorState> {
        self.time += dt;

        let candidates: Vec<ActorState> = self
            .actors
            .iter()
            .zip(states)
            .map(|(actor, prior)| {
                let ctx = StepContext {
                    dt,
                    pose: &prior.pose,
                    velocity: &prior.velocity,
                };
                match actor.physics.step(&ctx, &actor.controls()) {
                    Some(update) => ActorState {
                        pose: update.pose,
                        velocity: update.velocity.unwrap_or(prior.velocity),
                        collision: prior.collision,
                    },
                    None => *prior,
                }
            })
            .collect();

        let bodies: Vec<CollisionBody> = self
            .actors
            .iter()
            .zip(&candidates)
            .filter(|(actor, _)| !actor.shapes.is_empty())
            .map(|(actor, state)| {
                CollisionBody::new(actor.name.as_str(), &state.pose, &actor.shapes)
            })
            .collect();

        let hits: Vec<Vec<String>> = self
            .actors
            .iter()
            .zip(&candidates)
            .map(|(actor, state)| {
                if !actor.primary_collider {
                    return Vec::new();
                }
                let body = CollisionBody::new(actor.name.as_str(), &state.pose, &actor.shapes);
                detect_collisions(&body, &bodies)
            })
            .collect();

        let finals: Vec<ActorState> = candidates
            .iter()
            .zip(states)
            .zip(&hits)
            .map(|((candidate, prior), hit)| {
                if hit.is_empty() {
                    ActorState {
                        collision: false,
                        ..*candidate
                    }
                } else {
                    ActorState {
                        collision: true,
                        ..*prior
                    }
                }
            })
            .collect();

        for (actor, candidate) in self.actors.iter().zip(&candidates) {
            self.topics.publish(
                &pose_topic(&actor.name),
                &Message::Pose(PoseStamped {
                    timestamp: self.time,
                    pose: candidate.pose,
                }),
            );
        }

        for (actor, hit) in self.actors.iter().zip(hits) {
            if hit.is_empty() {
                continue;
            }
            debug!("{} collided with {:?} at t={:.2}", actor.name, hit, self.time);
            self.topics.publish(
                &collision_topic(&actor.name),
                &Message::Collision(CollisionEvent {
                    timestamp: self.time,
                    with: hit,
                }),
            );
        }

        finals
    }

    /// States the actors were configured with
    pub fn initial_states(&self) -> Vec<ActorState> {
        self.initial.clone()
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.name == name)
    }

    /// Position of the named actor in the state vector
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.actors.iter().position(|a| a.name == name)
    }

    pub fn actor_names(&self) -> Vec<&str> {
        self.actors.iter().map(|a| a.name.as_str()).collect()
    }

    /// Simulation clock in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Publish a command for the named actor on `/{name}/controls`
    pub fn set_controls(&self, name: &str, controls: Controls) -> Result<()> {
        if self.actor(name).is_none() {
            return Err(SimError::UnknownActor(name.to_string()));
        }
        self.topics
            .publish(&controls_topic(name), &Message::Controls(controls));
        Ok(())
    }

    /// Command currently held by the named actor
    pub fn controls_of(&self, name: &str) -> Option<Controls> {
        self.actor(name).map(Actor::controls)
    }
}
