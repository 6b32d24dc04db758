//! Scenario files
//!
//! A scenario is a JSON description of actors plus a schedule of control
//! commands, run headless against the simulator:
//!
//! ```json
//! {
//!   "dt": 0.05,
//!   "ticks": 100,
//!   "actors": [{ "name": "ego", "physics": { "name": "bicycle", "lf": 2 } }],
//!   "commands": [{ "tick": 0, "actor": "ego", "controls": { "theta": 0, "a": 1 } }]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::simulation::{ActorConfig, ActorState, Controls, Simulator, Topics};

pub const DEFAULT_DT: f64 = 0.05;

fn default_dt() -> f64 {
    DEFAULT_DT
}

/// A command published on `/{actor}/controls` before tick `tick` (0-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub tick: u32,
    pub actor: String,
    pub controls: Controls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFile {
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default)]
    pub ticks: u32,
    pub actors: Vec<ActorConfig>,
    #[serde(default)]
    pub commands: Vec<ScheduledCommand>,
}

impl ScenarioFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let scenario: ScenarioFile =
            serde_json::from_str(text).context("Failed to parse scenario JSON")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject a non-positive timestep and commands for actors that don't exist
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            bail!("dt must be a positive number, got {}", self.dt);
        }
        let names: HashSet<&str> = self.actors.iter().map(|a| a.name.as_str()).collect();
        for cmd in &self.commands {
            if !names.contains(cmd.actor.as_str()) {
                bail!("command at tick {} targets unknown actor '{}'", cmd.tick, cmd.actor);
            }
        }
        Ok(())
    }

    /// Build the simulator and run `ticks` steps, publishing each scheduled
    /// command just before its tick. `on_tick` sees the simulator and the
    /// states after every step. Returns the final states.
    pub fn run<F>(&self, ticks: u32, mut on_tick: F) -> Result<Vec<ActorState>>
    where
        F: FnMut(u32, &Simulator, &[ActorState]),
    {
        let mut simulator =
            Simulator::new(&self.actors, Topics::new()).context("Failed to build simulator")?;
        let mut states = simulator.initial_states();

        for tick in 0..ticks {
            for cmd in self.commands.iter().filter(|c| c.tick == tick) {
                simulator
                    .set_controls(&cmd.actor, cmd.controls)
                    .with_context(|| format!("Failed to apply command at tick {}", tick))?;
            }
            states = simulator.step(self.dt, &states);
            on_tick(tick + 1, &simulator, &states);
        }

        info!(
            "Scenario finished after {} ticks ({:.2}s simulated)",
            ticks,
            simulator.time()
        );
        Ok(states)
    }
}
