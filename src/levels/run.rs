//! Run driver
//!
//! Performs the per-tick sequence a game front end would: time out, check
//! the goal against the previous step, read sensors, let the script set
//! controls, step the simulator and keep the resulting states.

use log::{debug, info, warn};

use super::{GoalState, Level, PlanarPose, Sensors};
use crate::simulation::{
    controls_topic, ActorState, Controls, Message, Pose, Result, SimError, Simulator, Topics,
};

/// Everything a script sees on one tick
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Simulation time at the start of the tick
    pub timestamp: f64,
    pub sensors: &'a Sensors,
}

/// The ego actor as a script sees it
#[derive(Debug)]
pub struct ActorHandle<'a> {
    name: &'a str,
    state: &'a ActorState,
    topics: &'a Topics,
}

impl<'a> ActorHandle<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn state(&self) -> &ActorState {
        self.state
    }

    pub fn pose(&self) -> &Pose {
        &self.state.pose
    }

    /// Publish a command on this actor's controls topic
    pub fn set_controls(&mut self, controls: Controls) {
        let delivered = self
            .topics
            .publish(&controls_topic(self.name), &Message::Controls(controls));
        if delivered == 0 {
            warn!("controls for {} reached no listener", self.name);
        }
    }

    pub fn publish(&mut self, topic: &str, message: &Message) -> usize {
        self.topics.publish(topic, message)
    }
}

/// User code driving the ego actor
pub trait Script {
    /// Called once per run, before any actor exists, to set up subscriptions
    fn on_init(&mut self, _topics: &Topics) {}

    fn tick(&mut self, _ego: &mut ActorHandle<'_>, _input: &TickInput<'_>) {}
}

/// A script that never touches the controls
#[derive(Debug, Default)]
pub struct IdleScript;

impl Script for IdleScript {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Passed(String),
    Failed(String),
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

pub struct Run {
    level: Box<dyn Level>,
    script: Box<dyn Script>,
    simulator: Simulator,
    ego: String,
    ego_index: usize,
    states: Vec<ActorState>,
    pose: PlanarPose,
    poses: Vec<PlanarPose>,
    step_count: u64,
    t_prev: f64,
    status: RunStatus,
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("level", &self.level)
            .field("ego", &self.ego)
            .field("step_count", &self.step_count)
            .field("status", &self.status)
            .finish()
    }
}

impl Run {
    /// Set up a fresh bus, let the script subscribe, then build the actors
    pub fn new(level: Box<dyn Level>, mut script: Box<dyn Script>) -> Result<Self> {
        let (simulator, ego_index) = Self::build(level.as_ref(), script.as_mut())?;
        let states = simulator.initial_states();
        let pose = PlanarPose::from(&states[ego_index].pose);
        let ego = level.info().ego;
        info!("Run started: {} ({} actors)", level.info().name, states.len());

        Ok(Self {
            level,
            script,
            simulator,
            ego,
            ego_index,
            states,
            pose,
            poses: Vec::new(),
            step_count: 0,
            t_prev: 0.0,
            status: RunStatus::Running,
        })
    }

    fn build(level: &dyn Level, script: &mut dyn Script) -> Result<(Simulator, usize)> {
        let topics = Topics::new();
        script.on_init(&topics);
        let simulator = Simulator::new(&level.actors(), topics)?;
        let ego = level.info().ego;
        let ego_index = simulator
            .index_of(&ego)
            .ok_or(SimError::UnknownActor(ego))?;
        Ok((simulator, ego_index))
    }

    /// Advance one tick of `dt` seconds. Does nothing once finished.
    pub fn tick(&mut self, dt: f64) -> &RunStatus {
        if self.status.is_finished() {
            return &self.status;
        }

        let step_count = self.step_count + 1;
        let t_prev = step_count as f64 * dt;
        if t_prev > self.level.timeout() {
            return self.finish(RunStatus::Failed(format!(
                "{} ran out of time! Try again!",
                self.ego
            )));
        }
        self.step_count = step_count;
        self.t_prev = t_prev;

        let goal = self.level.check_goal(&GoalState {
            pose: self.pose,
            t_prev,
            poses: &self.poses,
        });
        if goal.pass.is_some() {
            let msg = format!("Goal completed in {:.2} seconds!", t_prev);
            return self.finish(RunStatus::Passed(msg));
        }
        if let Some(fail) = goal.fail {
            let msg = format!("Failed to complete the goal: {}", fail);
            return self.finish(RunStatus::Failed(msg));
        }

        let sensors = self.level.sensors(&self.pose);
        let input = TickInput {
            timestamp: t_prev,
            sensors: &sensors,
        };
        let mut handle = ActorHandle {
            name: &self.ego,
            state: &self.states[self.ego_index],
            topics: self.simulator.topics(),
        };
        self.script.tick(&mut handle, &input);

        let next = self.simulator.step(dt, &self.states);
        if self.level.collision_is_failure() && next.iter().any(|s| s.collision) {
            return self.finish(RunStatus::Failed("Collision!".to_string()));
        }

        self.states = next;
        self.pose = PlanarPose::from(&self.states[self.ego_index].pose);
        self.poses.push(self.pose);
        debug!(
            "tick {} t={:.2} ego=({:.2}, {:.2}, {:.2})",
            self.step_count, t_prev, self.pose.x, self.pose.y, self.pose.yaw
        );
        &self.status
    }

    /// Tick until the run finishes or `max_ticks` have elapsed
    pub fn run_until_done(&mut self, dt: f64, max_ticks: u64) -> &RunStatus {
        for _ in 0..max_ticks {
            if self.tick(dt).is_finished() {
                break;
            }
        }
        &self.status
    }

    fn finish(&mut self, status: RunStatus) -> &RunStatus {
        match &status {
            RunStatus::Passed(msg) => info!("{}", msg),
            RunStatus::Failed(msg) => info!("{}", msg),
            RunStatus::Running => {}
        }
        self.status = status;
        &self.status
    }

    /// Start over: new bus and actors, level progress forgotten, script
    /// initialised again
    pub fn reset(&mut self) -> Result<()> {
        self.level.reset();
        let (simulator, ego_index) = Self::build(self.level.as_ref(), self.script.as_mut())?;
        self.states = simulator.initial_states();
        self.pose = PlanarPose::from(&self.states[ego_index].pose);
        self.simulator = simulator;
        self.ego_index = ego_index;
        self.poses.clear();
        self.step_count = 0;
        self.t_prev = 0.0;
        self.status = RunStatus::Running;
        Ok(())
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn states(&self) -> &[ActorState] {
        &self.states
    }

    pub fn ego_state(&self) -> &ActorState {
        &self.states[self.ego_index]
    }

    pub fn pose(&self) -> PlanarPose {
        self.pose
    }

    /// Ego pose after every completed step
    pub fn poses(&self) -> &[PlanarPose] {
        &self.poses
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulation time at the start of the last tick
    pub fn time(&self) -> f64 {
        self.t_prev
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn topics(&self) -> &Topics {
        self.simulator.topics()
    }

    pub fn level(&self) -> &dyn Level {
        self.level.as_ref()
    }
}
