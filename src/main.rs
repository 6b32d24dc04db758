use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use drive_sim::config::ScenarioFile;
use drive_sim::levels::{self, autopilot, Run, RunStatus, LEVEL_NAMES};
use drive_sim::simulation::{ActorState, Simulator};

#[derive(Parser)]
#[command(name = "drive_sim")]
#[command(about = "Headless vehicle simulation: run a level with its autopilot or a scenario file")]
struct Cli {
    /// Level to run with its built-in autopilot
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(LEVEL_NAMES))]
    level: Option<String>,

    /// JSON scenario file to run instead of a level
    #[arg(long, conflicts_with = "level")]
    scenario: Option<PathBuf>,

    /// Number of ticks to run (defaults to the level timeout or the scenario's tick count)
    #[arg(long)]
    ticks: Option<u32>,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.05")]
    delta: f64,

    /// Seed for level randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks between printed summaries
    #[arg(long, default_value = "20")]
    summary_every: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,drive_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    if !(cli.delta.is_finite() && cli.delta > 0.0) {
        bail!("--delta must be a positive number of seconds");
    }
    let summary_every = cli.summary_every.max(1);

    match (&cli.scenario, &cli.level) {
        (Some(path), _) => run_scenario(path, cli.ticks, summary_every),
        (None, level) => {
            let level = level.as_deref().unwrap_or("hello-topics");
            run_level(level, cli.ticks, cli.delta, cli.seed, summary_every)
        }
    }
}

/// Run a level headless with its autopilot until it passes, fails or runs
/// out of ticks
fn run_level(
    name: &str,
    ticks: Option<u32>,
    delta: f64,
    seed: Option<u64>,
    summary_every: u32,
) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    info!("Running level {} (seed {})", name, seed);

    let level = levels::by_name(name, seed).context("Failed to load level")?;
    let max_ticks = ticks.unwrap_or_else(|| tick_budget(level.timeout(), delta));
    let mut run = Run::new(level, autopilot(name)).context("Failed to start run")?;

    println!("Running {} headless: up to {} ticks of {}s", name, max_ticks, delta);
    println!();

    for tick in 1..=max_ticks {
        let finished = run.tick(delta).is_finished();
        if finished || tick % summary_every == 0 {
            print_run_summary(&run);
        }
        if finished {
            break;
        }
    }

    info!("=== RUN COMPLETE ===");
    info!("Ticks: {}", run.step_count());
    info!("Simulated time: {:.2}s", run.time());
    match run.status() {
        RunStatus::Running => info!("Result: still running"),
        RunStatus::Passed(msg) => info!("Result: passed - {}", msg),
        RunStatus::Failed(msg) => info!("Result: failed - {}", msg),
    }
    Ok(())
}

/// Ticks needed to reach `timeout` at `delta` per tick, plus the one that
/// reports the timeout. Saturates at `u32::MAX`.
fn tick_budget(timeout: f64, delta: f64) -> u32 {
    ((timeout / delta).ceil() as u32).saturating_add(1)
}

fn print_run_summary(run: &Run) {
    let pose = run.pose();
    let state = run.ego_state();
    println!("--- After tick {} ({:.2}s simulated time) ---", run.step_count(), run.time());
    println!("  Ego: x={:.3} y={:.3} yaw={:.3}", pose.x, pose.y, pose.yaw);
    println!(
        "  Speed: {:.3} m/s{}",
        state.velocity.linear.magnitude(),
        if state.collision { " (collision)" } else { "" }
    );
    println!("  Status: {:?}", run.status());
}

/// Run a scenario file, printing every actor's state periodically
fn run_scenario(path: &Path, ticks: Option<u32>, summary_every: u32) -> Result<()> {
    let scenario = ScenarioFile::load(path)?;
    let ticks = ticks.unwrap_or(scenario.ticks);
    println!(
        "Running scenario {}: {} actors, {} ticks of {}s",
        path.display(),
        scenario.actors.len(),
        ticks,
        scenario.dt
    );
    println!();

    let mut collisions = 0;
    let states = scenario.run(ticks, |tick, sim, states| {
        collisions += states.iter().filter(|s| s.collision).count();
        if tick % summary_every == 0 {
            print_states(tick, sim, states);
        }
    })?;

    info!("=== SCENARIO COMPLETE ===");
    info!("Ticks: {}", ticks);
    info!("Collisions: {}", collisions);
    println!("=== Final State ===");
    for (state, name) in states.iter().zip(scenario.actors.iter().map(|a| &a.name)) {
        println!("  {}: {}", name, describe(state));
    }
    Ok(())
}

fn print_states(tick: u32, sim: &Simulator, states: &[ActorState]) {
    println!("--- After tick {} ({:.2}s simulated time) ---", tick, sim.time());
    for (name, state) in sim.actor_names().into_iter().zip(states) {
        println!("  {}: {}", name, describe(state));
    }
}

fn describe(state: &ActorState) -> String {
    format!(
        "x={:.3} y={:.3} yaw={:.3} v={:.3}{}",
        state.pose.position.x,
        state.pose.position.y,
        state.pose.yaw(),
        state.velocity.linear.magnitude(),
        if state.collision { " collision" } else { "" }
    )
}
